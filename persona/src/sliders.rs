//! Personality slider compilation.
//!
//! Each named dimension maps a 0-100 value to one behavioral directive.
//! 50 is neutral and emits nothing, so a default agent gets an empty
//! personality block. Above 50 the positive trait is emitted with an
//! intensity qualifier; below 50 the opposite directive is emitted, with
//! stronger phrasing under 30. Missing sliders default to 50. The mapping
//! is total and deterministic over the slider map.

use std::collections::HashMap;

struct Dimension {
    name: &'static str,
    /// Trait phrase completed as "Be {intensity} {positive}."
    positive: &'static str,
    /// Directive for values below 50.
    negative: &'static str,
    /// Stronger directive for values below 30.
    strong_negative: &'static str,
}

/// Dimension table. Order here is output order, fixed across runs.
const DIMENSIONS: &[Dimension] = &[
    Dimension {
        name: "warmth",
        positive: "warm and friendly",
        negative: "Keep a cool, businesslike manner.",
        strong_negative: "Be distant and strictly transactional.",
    },
    Dimension {
        name: "formality",
        positive: "formal and polished in address",
        negative: "Speak casually, like a friend.",
        strong_negative: "Be completely informal; slang is fine.",
    },
    Dimension {
        name: "humor",
        positive: "humorous, finding chances for light jokes",
        negative: "Stay serious; avoid jokes.",
        strong_negative: "Never attempt humor of any kind.",
    },
    Dimension {
        name: "directness",
        positive: "direct, leading with the answer",
        negative: "Soften statements and approach points gently.",
        strong_negative: "Be highly indirect; hedge every statement.",
    },
    Dimension {
        name: "empathy",
        positive: "empathetic, acknowledging feelings before facts",
        negative: "Focus on facts over feelings.",
        strong_negative: "Ignore emotional subtext entirely; facts only.",
    },
    Dimension {
        name: "confidence",
        positive: "confident and assured in statements",
        negative: "Present answers tentatively, inviting correction.",
        strong_negative: "Qualify everything; commit to nothing.",
    },
    Dimension {
        name: "curiosity",
        positive: "curious, asking follow-up questions",
        negative: "Ask little; answer what was asked.",
        strong_negative: "Never probe; respond only to direct questions.",
    },
    Dimension {
        name: "patience",
        positive: "patient, never rushing the caller",
        negative: "Keep the pace brisk.",
        strong_negative: "Push the conversation forward at every turn.",
    },
    Dimension {
        name: "creativity",
        positive: "creative, offering novel framings",
        negative: "Stick to conventional answers.",
        strong_negative: "Give only standard, by-the-book responses.",
    },
    Dimension {
        name: "analytical",
        positive: "analytical, reasoning through steps aloud",
        negative: "Keep reasoning behind the scenes; give conclusions.",
        strong_negative: "State conclusions only; never show working.",
    },
    Dimension {
        name: "storytelling",
        positive: "illustrative, using anecdotes and examples",
        negative: "Avoid anecdotes; stay on the point.",
        strong_negative: "Never digress into stories or examples.",
    },
    Dimension {
        name: "detail",
        positive: "thorough, covering details and edge cases",
        negative: "Summarize; skip fine detail.",
        strong_negative: "Give the shortest accurate answer possible.",
    },
    Dimension {
        name: "assertiveness",
        positive: "assertive, making clear recommendations",
        negative: "Offer options rather than recommendations.",
        strong_negative: "Never push a position; defer to the caller.",
    },
    Dimension {
        name: "humility",
        positive: "humble, quick to credit others and admit limits",
        negative: "Project expertise; don't dwell on limits.",
        strong_negative: "Never volunteer uncertainty about your competence.",
    },
    Dimension {
        name: "optimism",
        positive: "optimistic, framing things positively",
        negative: "Be sober about downsides.",
        strong_negative: "Lead with risks and worst cases.",
    },
    Dimension {
        name: "sarcasm",
        positive: "dry, with occasional gentle sarcasm",
        negative: "Avoid sarcasm.",
        strong_negative: "Take everything at face value; zero irony.",
    },
    Dimension {
        name: "memory-reference",
        positive: "continuity-minded, referencing earlier conversations",
        negative: "Reference past conversations sparingly.",
        strong_negative: "Treat every call as the first; never mention history.",
    },
    Dimension {
        name: "formality-shift",
        positive: "adaptive, mirroring the caller's register",
        negative: "Hold one consistent register.",
        strong_negative: "Never change tone mid-conversation.",
    },
    Dimension {
        name: "inclusivity",
        positive: "inclusive, using accessible wording for everyone",
        negative: "Optimize wording for this caller alone.",
        strong_negative: "Assume full context; skip accessibility rephrasing.",
    },
    Dimension {
        name: "risk",
        positive: "comfortable giving bold, decisive suggestions",
        negative: "Prefer safe, conservative suggestions.",
        strong_negative: "Suggest only the most cautious path.",
    },
    Dimension {
        name: "self-reference",
        positive: "open about being an assistant when relevant",
        negative: "Keep the focus off yourself.",
        strong_negative: "Never talk about yourself at all.",
    },
    Dimension {
        name: "topic-focus",
        positive: "focused, steering back to the caller's goal",
        negative: "Let the conversation wander where the caller takes it.",
        strong_negative: "Follow every tangent the caller opens.",
    },
    Dimension {
        name: "repetition-avoidance",
        positive: "varied, never repeating phrasing",
        negative: "Reuse consistent phrasing for clarity.",
        strong_negative: "Repeat key phrasing verbatim whenever helpful.",
    },
    Dimension {
        name: "emotional-intensity",
        positive: "expressive and animated",
        negative: "Keep an even, calm affect.",
        strong_negative: "Stay completely flat and neutral.",
    },
    Dimension {
        name: "humor-sensitivity",
        positive: "careful to read whether humor lands",
        negative: "Don't second-guess jokes.",
        strong_negative: "Ignore audience reaction to humor entirely.",
    },
    Dimension {
        name: "consistency",
        positive: "consistent, keeping positions stable across turns",
        negative: "Update positions freely as the conversation moves.",
        strong_negative: "Re-derive each answer fresh; ignore earlier stances.",
    },
    Dimension {
        name: "meta-awareness",
        positive: "willing to comment on the conversation itself",
        negative: "Avoid commenting on the conversation itself.",
        strong_negative: "Never step outside the conversation frame.",
    },
    Dimension {
        name: "jargon",
        positive: "fluent in domain jargon with experts",
        negative: "Use plain language; expand technical terms.",
        strong_negative: "Avoid all jargon; explain like to a newcomer.",
    },
    Dimension {
        name: "polish",
        positive: "polished, in complete well-formed sentences",
        negative: "Speak loosely and conversationally.",
        strong_negative: "Use fragments and casual speech freely.",
    },
    Dimension {
        name: "caution",
        positive: "careful to flag caveats and limitations",
        negative: "Skip caveats unless they matter.",
        strong_negative: "State answers without any hedging or caveats.",
    },
];

/// Compiles a slider map into directive lines for the model instructions.
///
/// Unknown slider names are ignored; missing sliders default to neutral.
/// Returns an empty string for an all-neutral map.
pub fn compile_sliders(sliders: &HashMap<String, u8>) -> String {
    let mut out = String::new();
    for dim in DIMENSIONS {
        let value = sliders.get(dim.name).copied().unwrap_or(50).min(100);
        let line = match value {
            50 => continue,
            v if v >= 80 => format!("Be very {}.", dim.positive),
            v if v >= 65 => format!("Be quite {}.", dim.positive),
            v if v > 50 => format!("Be moderately {}.", dim.positive),
            v if v < 30 => dim.strong_negative.to_string(),
            _ => dim.negative.to_string(),
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sliders(pairs: &[(&str, u8)]) -> HashMap<String, u8> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_neutral_emits_nothing() {
        assert!(compile_sliders(&HashMap::new()).is_empty());
        assert!(compile_sliders(&sliders(&[("warmth", 50), ("humor", 50)])).is_empty());
    }

    #[test]
    fn test_intensity_ladder() {
        let out = compile_sliders(&sliders(&[("warmth", 55)]));
        assert_eq!(out, "Be moderately warm and friendly.\n");

        let out = compile_sliders(&sliders(&[("warmth", 65)]));
        assert_eq!(out, "Be quite warm and friendly.\n");

        let out = compile_sliders(&sliders(&[("warmth", 100)]));
        assert_eq!(out, "Be very warm and friendly.\n");
    }

    #[test]
    fn test_negative_phrasings() {
        let mild = compile_sliders(&sliders(&[("humor", 40)]));
        assert_eq!(mild, "Stay serious; avoid jokes.\n");

        let strong = compile_sliders(&sliders(&[("humor", 0)]));
        assert_eq!(strong, "Never attempt humor of any kind.\n");

        assert_ne!(mild, strong);
    }

    #[test]
    fn test_boundary_at_30() {
        let at_30 = compile_sliders(&sliders(&[("detail", 30)]));
        assert_eq!(at_30, "Summarize; skip fine detail.\n");

        let at_29 = compile_sliders(&sliders(&[("detail", 29)]));
        assert_eq!(at_29, "Give the shortest accurate answer possible.\n");
    }

    #[test]
    fn test_unknown_sliders_ignored() {
        assert!(compile_sliders(&sliders(&[("charisma", 100)])).is_empty());
    }

    #[test]
    fn test_output_order_is_table_order() {
        let out = compile_sliders(&sliders(&[("humor", 80), ("warmth", 80)]));
        let warmth_pos = out.find("warm").unwrap();
        let humor_pos = out.find("humorous").unwrap();
        assert!(warmth_pos < humor_pos);
    }

    #[test]
    fn test_every_dimension_compiles_at_extremes() {
        for dim in super::DIMENSIONS {
            for value in [0u8, 25, 49, 51, 70, 100] {
                let out = compile_sliders(&sliders(&[(dim.name, value)]));
                assert!(!out.is_empty(), "{} at {} emitted nothing", dim.name, value);
            }
        }
    }
}
