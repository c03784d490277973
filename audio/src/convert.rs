//! Uplink and downlink conversion between the two call legs.

use crate::error::{AudioError, Result};
use crate::ulaw::{linear_to_ulaw, ulaw_to_linear};

/// Sample rate on the telephony leg.
pub const CALLER_SAMPLE_RATE: u32 = 8_000;

/// Sample rate on the model leg.
pub const MODEL_SAMPLE_RATE: u32 = 24_000;

/// Exact integer ratio between the two rates.
const RATE_FACTOR: usize = 3;

/// Converts caller audio (u-law, 8kHz) to model audio (PCM16 LE, 24kHz).
///
/// Each u-law byte expands to three identical 16-bit samples (nearest
/// neighbor upsampling). Infallible: every byte is a valid u-law code.
pub fn uplink_from_caller(ulaw: &[u8]) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(ulaw.len() * RATE_FACTOR * 2);
    for &code in ulaw {
        let bytes = ulaw_to_linear(code).to_le_bytes();
        for _ in 0..RATE_FACTOR {
            pcm.extend_from_slice(&bytes);
        }
    }
    pcm
}

/// Converts model audio (PCM16 LE, 24kHz) to caller audio (u-law, 8kHz).
///
/// Keeps every third sample (nearest neighbor decimation) and compands it.
/// An odd byte count means the buffer is not a whole number of 16-bit
/// samples; that frame must be dropped, not truncated, or every following
/// frame would decode off by one byte.
pub fn downlink_to_caller(pcm: &[u8]) -> Result<Vec<u8>> {
    if pcm.len() % 2 != 0 {
        return Err(AudioError::Decode(format!(
            "pcm16 buffer has odd byte count {}",
            pcm.len()
        )));
    }

    let samples = pcm.len() / 2;
    let mut ulaw = Vec::with_capacity(samples.div_ceil(RATE_FACTOR));
    let mut i = 0;
    while i + 1 < pcm.len() {
        let sample = i16::from_le_bytes([pcm[i], pcm[i + 1]]);
        ulaw.push(linear_to_ulaw(sample));
        i += 2 * RATE_FACTOR;
    }
    Ok(ulaw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uplink_length_is_triple() {
        // One u-law byte becomes three 16-bit samples.
        let ulaw = vec![0xFFu8; 160]; // 20ms at 8kHz
        let pcm = uplink_from_caller(&ulaw);
        assert_eq!(pcm.len(), ulaw.len() * 3 * 2);
    }

    #[test]
    fn test_downlink_length_is_third() {
        let pcm = vec![0u8; 480 * 2]; // 20ms at 24kHz
        let ulaw = downlink_to_caller(&pcm).unwrap();
        assert_eq!(ulaw.len(), 480 / 3);
    }

    #[test]
    fn test_round_trip_preserves_length() {
        let ulaw = vec![0x55u8; 160];
        let pcm = uplink_from_caller(&ulaw);
        let back = downlink_to_caller(&pcm).unwrap();
        assert_eq!(back.len(), ulaw.len());

        let pcm = vec![0u8; 480 * 2];
        let down = downlink_to_caller(&pcm).unwrap();
        let up = uplink_from_caller(&down);
        assert_eq!(up.len(), pcm.len());
    }

    #[test]
    fn test_odd_length_is_rejected() {
        let err = downlink_to_caller(&[0u8; 481]).unwrap_err();
        assert!(matches!(err, AudioError::Decode(_)));
    }

    #[test]
    fn test_empty_buffers() {
        assert!(uplink_from_caller(&[]).is_empty());
        assert!(downlink_to_caller(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_upsample_repeats_samples() {
        let pcm = uplink_from_caller(&[0xFF]); // decodes to 0
        assert_eq!(pcm, vec![0, 0, 0, 0, 0, 0]);
    }
}
