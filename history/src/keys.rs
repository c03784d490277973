//! Deterministic key derivation.
//!
//! Key layout in the external memory service:
//!
//! ```text
//! thread:{digits}              → conversation thread id for a caller
//! recap:thread:{digits}        → serialized rolling-history recap (7d TTL)
//! {kind}:{fnv64hex}            → dedup key for a consolidated memory item
//! ```
//!
//! Thread ids are derived from the caller's number alone so the same
//! caller reaches the same history on every call.

/// Derives the conversation thread id for a caller number.
///
/// Normalization keeps digits only and assumes ten-digit NANP numbers
/// carry a leading country code of 1, so "+1 (555) 010-0199",
/// "15550100199" and "555-010-0199" all share one thread.
pub fn thread_id_for_caller(caller: &str) -> String {
    let digits: String = caller.chars().filter(|c| c.is_ascii_digit()).collect();
    let digits = if digits.len() == 10 {
        format!("1{digits}")
    } else {
        digits
    };
    format!("thread:{digits}")
}

/// Key under which a thread's recap is mirrored.
pub fn recap_key(thread_id: &str) -> String {
    format!("recap:{thread_id}")
}

/// Stable deduplication key for a consolidated memory item.
///
/// Hashes the lowercased content so repeated extraction of the same fact
/// across consolidation cycles lands on the same record.
pub fn dedup_key(kind: &str, content: &str) -> String {
    let hash = fnv1a64(content.to_lowercase().as_bytes());
    format!("{kind}:{}", hex::encode(hash.to_be_bytes()))
}

/// 64-bit FNV-1a. Stable across processes and platforms, unlike the
/// standard library's default hasher.
fn fnv1a64(data: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET_BASIS;
    for &byte in data {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_id_normalizes_formatting() {
        let a = thread_id_for_caller("+1 (555) 010-0199");
        let b = thread_id_for_caller("555-010-0199");
        let c = thread_id_for_caller("15550100199");
        assert_eq!(a, "thread:15550100199");
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_thread_id_keeps_international_numbers() {
        assert_eq!(thread_id_for_caller("+44 20 7946 0958"), "thread:442079460958");
    }

    #[test]
    fn test_recap_key_format() {
        assert_eq!(recap_key("thread:15550100199"), "recap:thread:15550100199");
    }

    #[test]
    fn test_dedup_key_is_stable_and_case_insensitive() {
        let a = dedup_key("fact", "Drives a 2019 Outback");
        let b = dedup_key("fact", "drives a 2019 outback");
        assert_eq!(a, b);
        assert!(a.starts_with("fact:"));
    }

    #[test]
    fn test_dedup_key_differs_by_content_and_kind() {
        assert_ne!(dedup_key("fact", "a"), dedup_key("fact", "b"));
        assert_ne!(dedup_key("fact", "a"), dedup_key("person", "a"));
    }
}
