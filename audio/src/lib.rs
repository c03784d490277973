//! Audio conversion between the telephony leg and the model leg.
//!
//! The telephony gateway delivers G.711 u-law at 8kHz, one byte per sample.
//! The conversational model speaks 16-bit little-endian linear PCM at 24kHz.
//! This crate converts between the two in both directions:
//!
//! - `ulaw`: table-driven G.711 u-law companding (8-bit log ↔ 16-bit linear)
//! - `convert`: the full uplink/downlink transforms including rate conversion
//!
//! Rate conversion is exact 3x sample repetition (uplink) and 3x decimation
//! (downlink), not bandlimited interpolation. For voice-band speech the
//! aliasing this introduces is inaudible in practice, and it keeps the hot
//! path allocation-free per sample with no filter state. Known quality
//! limit, accepted for latency.
//!
//! All functions are pure and safe to call concurrently for independent
//! calls.

pub mod convert;
pub mod error;
pub mod ulaw;

pub use convert::{
    CALLER_SAMPLE_RATE, MODEL_SAMPLE_RATE, downlink_to_caller, uplink_from_caller,
};
pub use error::{AudioError, Result};
pub use ulaw::{linear_to_ulaw, ulaw_to_linear};
