//! Agent personality and greeting text.
//!
//! - `sliders`: deterministic mapping from named 0-100 personality sliders
//!   to natural-language behavioral directives for the model instructions
//! - `greeting`: time-of-day and known-caller greeting blocks
//!
//! Everything here is a pure text transform; the session layer decides
//! when and how the output is injected upstream.

pub mod greeting;
pub mod sliders;

pub use greeting::{current_hour, greeting_block, time_of_day_greeting};
pub use sliders::compile_sliders;
