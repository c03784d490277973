//! The transfer decision function.

use crate::distance::levenshtein;
use crate::rule::TransferRule;

/// Phrases that mark an explicit request to be connected to someone.
/// Without one of these, person-name rules are skipped entirely so that a
/// self-introduction ("I'm John") never matches a rule named after John.
const EXPLICIT_INTENT_PHRASES: &[&str] = &[
    "transfer",
    "talk to",
    "speak with",
    "speak to",
    "connect me",
    "get me",
    "need to talk",
    "want to speak",
];

/// Stopwords excluded when splitting keywords into important words.
const STOPWORDS: &[&str] = &["a", "an", "the", "to", "for"];

/// Single-token keywords in this list are treated as person names even when
/// the rule description gives no capitalization hint.
const COMMON_FIRST_NAMES: &[&str] = &[
    "james", "john", "robert", "michael", "david", "william", "richard", "thomas", "mark",
    "steven", "steve", "paul", "kevin", "brian", "mary", "patricia", "jennifer", "linda",
    "elizabeth", "barbara", "susan", "jessica", "sarah", "karen", "lisa", "nancy", "sandra",
    "melissa", "amy", "michelle",
];

/// A positive transfer decision.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferMatch<'r> {
    /// The rule that fired.
    pub rule: &'r TransferRule,
    /// The transcript text (or keyword) that triggered the match.
    pub matched_span: String,
}

/// Decides whether `transcript` asks for a transfer under `rules`.
///
/// Rules are scanned in configuration order; the first match wins. Returning
/// `None` is the normal outcome for almost every utterance.
pub fn match_transfer<'r>(
    transcript: &str,
    rules: &'r [TransferRule],
) -> Option<TransferMatch<'r>> {
    let transcript_lc = transcript.to_lowercase();
    let tokens = tokenize(&transcript_lc);
    if tokens.is_empty() {
        return None;
    }

    let has_explicit_intent = EXPLICIT_INTENT_PHRASES
        .iter()
        .any(|p| transcript_lc.contains(p));

    // Cheap guard: without explicit intent, some keyword token (or its
    // plural/singular form) must appear literally in the transcript before
    // any fuzzy work is worth doing.
    if !has_explicit_intent && !prefilter_hit(&tokens, rules) {
        return None;
    }

    for rule in rules.iter().filter(|r| r.is_eligible()) {
        let keyword_lc = rule.keyword.trim().to_lowercase();
        let keyword_tokens = tokenize(&keyword_lc);
        if keyword_tokens.is_empty() {
            continue;
        }

        let is_person_name = keyword_tokens.len() == 1
            && looks_like_person_name(&keyword_tokens[0], &rule.description);
        if is_person_name && !has_explicit_intent {
            continue;
        }

        // Exact substring beats everything.
        if transcript_lc.contains(&keyword_lc) {
            return Some(TransferMatch {
                rule,
                matched_span: keyword_lc,
            });
        }

        let matched_span = if keyword_tokens.len() >= 2 {
            phrase_match(&keyword_tokens, &tokens)
        } else {
            fuzzy_single_match(&keyword_tokens[0], &tokens)
        };

        if let Some(span) = matched_span {
            return Some(TransferMatch {
                rule,
                matched_span: span,
            });
        }
    }

    None
}

fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|t| !t.is_empty())
        .collect()
}

fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// True when any non-stopword keyword token (or a trivial plural variant of
/// it) appears as a transcript token.
fn prefilter_hit(tokens: &[&str], rules: &[TransferRule]) -> bool {
    for rule in rules.iter().filter(|r| r.is_eligible()) {
        let keyword_lc = rule.keyword.trim().to_lowercase();
        for kt in tokenize(&keyword_lc) {
            if is_stopword(kt) {
                continue;
            }
            if tokens.iter().any(|t| {
                *t == kt || t.strip_suffix('s') == Some(kt) || kt.strip_suffix('s') == Some(*t)
            }) {
                return true;
            }
        }
    }
    false
}

fn looks_like_person_name(keyword: &str, description: &str) -> bool {
    if description
        .chars()
        .next()
        .is_some_and(|c| c.is_uppercase())
    {
        return true;
    }
    COMMON_FIRST_NAMES.contains(&keyword)
}

/// Multi-word keyword: count important words that appear in the transcript
/// as exact tokens, plural/gerund variants, or within edit distance 1.
/// Two-word phrases need one hit; longer phrases need a majority.
fn phrase_match(keyword_tokens: &[&str], tokens: &[&str]) -> Option<String> {
    let important: Vec<&str> = keyword_tokens
        .iter()
        .filter(|w| !is_stopword(w))
        .copied()
        .collect();
    if important.is_empty() {
        return None;
    }

    let needed = if important.len() == 2 {
        1
    } else {
        important.len().div_ceil(2)
    };

    let mut hits: Vec<&str> = Vec::new();
    for word in &important {
        if let Some(&t) = tokens.iter().find(|t| words_match(word, t)) {
            hits.push(t);
        }
    }

    if hits.len() >= needed {
        Some(hits.join(" "))
    } else {
        None
    }
}

/// Single-word keyword: scan transcript tokens of similar length and accept
/// the closest one within edit distance 1. Short words are excluded; one
/// edit in a three-letter word is a different word, not a typo.
fn fuzzy_single_match(keyword: &str, tokens: &[&str]) -> Option<String> {
    if keyword.len() <= 3 {
        return None;
    }

    let mut best: Option<(usize, &str)> = None;
    for &t in tokens {
        if t.len() <= 3 {
            continue;
        }
        if keyword.len().abs_diff(t.len()) > 2 {
            continue;
        }
        let d = levenshtein(keyword, t);
        if best.is_none_or(|(bd, _)| d < bd) {
            best = Some((d, t));
        }
    }

    match best {
        Some((d, t)) if d <= 1 => Some(t.to_string()),
        _ => None,
    }
}

/// Word-level equivalence used by phrase matching: identity, trailing-s
/// plural, trailing-ing verb form, or edit distance 1 for longer words.
fn words_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    if a.strip_suffix('s') == Some(b) || b.strip_suffix('s') == Some(a) {
        return true;
    }
    if a.strip_suffix("ing") == Some(b) || b.strip_suffix("ing") == Some(a) {
        return true;
    }
    a.len() > 3 && b.len() > 3 && levenshtein(a, b) <= 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(keyword: &str, number: &str, description: &str) -> TransferRule {
        TransferRule {
            keyword: keyword.into(),
            number: number.into(),
            description: description.into(),
        }
    }

    #[test]
    fn test_stem_match_without_explicit_intent() {
        let rules = vec![rule("claims", "1-800-435-7764", "Claims department")];
        let m = match_transfer("I need to file a claim", &rules).expect("should match");
        assert_eq!(m.rule.number, "1-800-435-7764");
        assert_eq!(m.matched_span, "claim");
    }

    #[test]
    fn test_person_name_requires_explicit_intent() {
        let rules = vec![rule("john", "1-800-555-0199", "John")];
        assert!(match_transfer("I'm John and I need help", &rules).is_none());

        let m = match_transfer("can I speak with John", &rules).expect("should match");
        assert_eq!(m.rule.keyword, "john");
    }

    #[test]
    fn test_person_name_from_allowlist() {
        // Lowercase description gives no capitalization hint; the allowlist
        // still flags the keyword as a name.
        let rules = vec![rule("melissa", "1-800-555-0123", "our agent")];
        assert!(match_transfer("melissa is my sister's name too", &rules).is_none());
        assert!(match_transfer("please transfer me to melissa", &rules).is_some());
    }

    #[test]
    fn test_edit_distance_one_accepted() {
        let rules = vec![rule("melissa", "1-800-555-0123", "Melissa")];
        let m = match_transfer("connect me to Milissa", &rules).expect("should match");
        assert_eq!(m.matched_span, "milissa");
    }

    #[test]
    fn test_edit_distance_two_rejected() {
        let rules = vec![rule("melissa", "1-800-555-0123", "Melissa")];
        assert!(match_transfer("connect me to Maria", &rules).is_none());
    }

    #[test]
    fn test_exact_substring_match() {
        let rules = vec![rule("billing department", "1-800-555-0111", "billing")];
        let m = match_transfer("get me the billing department please", &rules).unwrap();
        assert_eq!(m.matched_span, "billing department");
    }

    #[test]
    fn test_two_word_phrase_needs_one_important_word() {
        let rules = vec![rule("billing department", "1-800-555-0111", "billing")];
        let m = match_transfer("I have a question about my billing", &rules).unwrap();
        assert_eq!(m.matched_span, "billing");
    }

    #[test]
    fn test_longer_phrase_needs_majority() {
        let rules = vec![rule("roadside assistance help line", "1-800-555-0155", "roadside")];
        // 1 of 4 important words is not a majority.
        assert!(match_transfer("I want the help", &rules).is_none());
        // "roadside" + "assistance" is.
        assert!(match_transfer("my car broke down, roadside assistance", &rules).is_some());
    }

    #[test]
    fn test_rule_order_wins() {
        let rules = vec![
            rule("claims", "first", "Claims"),
            rule("claims", "second", "Claims too"),
        ];
        let m = match_transfer("transfer me to claims", &rules).unwrap();
        assert_eq!(m.rule.number, "first");
    }

    #[test]
    fn test_empty_keyword_ineligible() {
        let rules = vec![rule("", "1-800-555-0100", "Broken rule")];
        assert!(match_transfer("transfer me anywhere", &rules).is_none());
    }

    #[test]
    fn test_prefilter_short_circuits_unrelated_utterance() {
        let rules = vec![rule("claims", "1", "Claims")];
        assert!(match_transfer("what are your opening hours", &rules).is_none());
    }

    #[test]
    fn test_no_rules_no_match() {
        assert!(match_transfer("transfer me to claims", &[]).is_none());
    }
}
