//! Rule-based fuzzy intent matching for call transfer.
//!
//! Given a caller utterance transcript and a configured list of
//! (keyword, destination) rules, decides whether the caller asked to be
//! transferred and to which destination. Matching is layered: an explicit
//! transfer-intent gate, a cheap literal pre-filter, then per-rule exact
//! substring, multi-word phrase, and single-word edit-distance matching.
//!
//! The matcher is a pure decision function. Rule order is significant:
//! rules are scanned in configuration order and the first match wins.

pub mod distance;
pub mod matcher;
pub mod rule;

pub use distance::levenshtein;
pub use matcher::{TransferMatch, match_transfer};
pub use rule::{TransferRule, rules_guidance};
