//! Model instruction assembly.

use std::collections::HashMap;

use serde::Deserialize;

use callbridge_history::Turn;
use callbridge_intent::{TransferRule, rules_guidance};
use callbridge_persona::{compile_sliders, greeting_block};

/// How many recap turns are inlined when a conversation resumes.
const RECAP_TURNS: usize = 10;

/// The configured agent identity.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentProfile {
    /// Name the agent introduces itself with.
    pub name: String,

    /// Base persona text, ahead of everything else.
    pub base_persona: String,

    /// Synthesized voice requested from the model.
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Personality sliders, 0-100 each. Missing sliders are neutral.
    #[serde(default)]
    pub sliders: HashMap<String, u8>,
}

fn default_voice() -> String {
    "alloy".to_string()
}

/// Everything instruction assembly needs, gathered by the handler at
/// connect time.
pub struct InstructionInputs<'a> {
    pub profile: &'a AgentProfile,

    /// Recent history for a resuming conversation, oldest first.
    pub recap: &'a [Turn],

    /// Known caller's name, when the memory service recognized them.
    pub caller_name: Option<&'a str>,

    /// Local hour, for the time-of-day greeting.
    pub hour: u32,

    /// Long-term memory lines to inject, already rendered as text.
    pub memory_context: &'a [String],

    pub rules: &'a [TransferRule],
}

/// Concatenates the model's system instructions in fixed order: persona,
/// identity, personality directives, history recap, greeting guidance,
/// memory context, transfer guidance.
pub fn assemble_instructions(inputs: &InstructionInputs<'_>) -> String {
    let mut sections: Vec<String> = Vec::new();

    sections.push(inputs.profile.base_persona.trim().to_string());
    sections.push(format!("Your name is {}.", inputs.profile.name));

    let directives = compile_sliders(&inputs.profile.sliders);
    if !directives.is_empty() {
        sections.push(directives.trim_end().to_string());
    }

    if !inputs.recap.is_empty() {
        let mut recap = String::from(
            "You have spoken with this caller before. The conversation so far:\n",
        );
        let skip = inputs.recap.len().saturating_sub(RECAP_TURNS);
        for turn in &inputs.recap[skip..] {
            recap.push_str(&format!("{}: {}\n", turn.role, turn.text));
        }
        sections.push(recap.trim_end().to_string());
    }

    sections.push(greeting_block(
        inputs.caller_name,
        inputs.hour,
        &inputs.profile.name,
    ));

    if !inputs.memory_context.is_empty() {
        let mut memory = String::from("What you remember about this caller:\n");
        for line in inputs.memory_context {
            memory.push_str(&format!("- {line}\n"));
        }
        sections.push(memory.trim_end().to_string());
    }

    let guidance = rules_guidance(inputs.rules);
    if !guidance.is_empty() {
        sections.push(guidance.trim_end().to_string());
    }

    sections.retain(|s| !s.is_empty());
    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use callbridge_history::Role;

    fn profile() -> AgentProfile {
        AgentProfile {
            name: "Ava".into(),
            base_persona: "You are a friendly phone receptionist for Acme Insurance.".into(),
            voice: "sage".into(),
            sliders: HashMap::from([("warmth".to_string(), 80u8)]),
        }
    }

    #[test]
    fn test_new_caller_gets_time_of_day_greeting() {
        let p = profile();
        let inputs = InstructionInputs {
            profile: &p,
            recap: &[],
            caller_name: None,
            hour: 9,
            memory_context: &[],
            rules: &[],
        };
        let text = assemble_instructions(&inputs);
        assert!(text.starts_with("You are a friendly phone receptionist"));
        assert!(text.contains("Your name is Ava."));
        assert!(text.contains("Be very warm and friendly."));
        assert!(text.contains("Good morning"));
        assert!(!text.contains("spoken with this caller before"));
    }

    #[test]
    fn test_greeting_hour_boundaries() {
        let p = profile();
        for (hour, expected) in [(11, "Good morning"), (12, "Good afternoon"), (18, "Good evening")]
        {
            let inputs = InstructionInputs {
                profile: &p,
                recap: &[],
                caller_name: None,
                hour,
                memory_context: &[],
                rules: &[],
            };
            assert!(
                assemble_instructions(&inputs).contains(expected),
                "hour {hour} should greet with {expected}"
            );
        }
    }

    #[test]
    fn test_recap_is_bounded_to_last_ten_turns() {
        let p = profile();
        let recap: Vec<Turn> = (0..15)
            .map(|i| Turn::new(Role::User, format!("turn {i}")))
            .collect();
        let inputs = InstructionInputs {
            profile: &p,
            recap: &recap,
            caller_name: Some("Dana"),
            hour: 9,
            memory_context: &[],
            rules: &[],
        };
        let text = assemble_instructions(&inputs);
        assert!(!text.contains("turn 4"));
        assert!(text.contains("turn 5"));
        assert!(text.contains("turn 14"));
        assert!(text.contains("Dana"));
    }

    #[test]
    fn test_memory_and_rules_sections() {
        let p = profile();
        let memory = vec!["drives a 2019 Outback".to_string()];
        let rules = vec![TransferRule {
            keyword: "claims".into(),
            number: "1-800-435-7764".into(),
            description: "Claims department".into(),
        }];
        let inputs = InstructionInputs {
            profile: &p,
            recap: &[],
            caller_name: None,
            hour: 14,
            memory_context: &memory,
            rules: &rules,
        };
        let text = assemble_instructions(&inputs);
        assert!(text.contains("- drives a 2019 Outback"));
        assert!(text.contains("\"claims\""));
        // Section order: memory before transfer guidance, persona first.
        let memory_pos = text.find("What you remember").unwrap();
        let rules_pos = text.find("You can transfer").unwrap();
        assert!(memory_pos < rules_pos);
    }
}
