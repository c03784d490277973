//! Transfer rule configuration type.

use serde::{Deserialize, Serialize};

/// A configured transfer destination.
///
/// Rules come from external configuration and are read-only here. A rule
/// with an empty keyword is ineligible and never matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferRule {
    /// Keyword or phrase the caller must say (e.g. "claims", "billing
    /// department", "melissa").
    pub keyword: String,

    /// Destination phone number dialed when the rule fires.
    pub number: String,

    /// Human-readable description (e.g. "Claims department", "Melissa").
    #[serde(default)]
    pub description: String,
}

impl TransferRule {
    /// Returns true if this rule can ever match.
    pub fn is_eligible(&self) -> bool {
        !self.keyword.trim().is_empty()
    }
}

/// Renders the rules as natural-language guidance for the model's
/// instructions, so the model knows which transfers it can offer.
pub fn rules_guidance(rules: &[TransferRule]) -> String {
    let eligible: Vec<&TransferRule> = rules.iter().filter(|r| r.is_eligible()).collect();
    if eligible.is_empty() {
        return String::new();
    }

    let mut out = String::from(
        "You can transfer this call. When the caller asks for one of the \
         following, let them know you are connecting them:\n",
    );
    for rule in eligible {
        let label = if rule.description.is_empty() {
            &rule.keyword
        } else {
            &rule.description
        };
        out.push_str(&format!("- \"{}\" ({})\n", rule.keyword, label));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eligibility() {
        assert!(!TransferRule::default().is_eligible());
        assert!(
            !TransferRule {
                keyword: "  ".into(),
                ..Default::default()
            }
            .is_eligible()
        );
        assert!(
            TransferRule {
                keyword: "claims".into(),
                number: "1-800-435-7764".into(),
                description: "Claims department".into(),
            }
            .is_eligible()
        );
    }

    #[test]
    fn test_guidance_skips_ineligible() {
        let rules = vec![
            TransferRule {
                keyword: "claims".into(),
                number: "1".into(),
                description: "Claims".into(),
            },
            TransferRule::default(),
        ];
        let guidance = rules_guidance(&rules);
        assert!(guidance.contains("\"claims\""));
        assert_eq!(guidance.matches("- ").count(), 1);
    }

    #[test]
    fn test_rule_deserializes_from_config() {
        let rule: TransferRule =
            serde_yaml::from_str("keyword: billing\nnumber: \"1-800-555-0100\"").unwrap();
        assert_eq!(rule.keyword, "billing");
        assert!(rule.description.is_empty());
    }
}
