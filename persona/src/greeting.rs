//! Caller greeting text.

use chrono::Timelike;

/// Time-of-day salutation: morning before noon, afternoon before 18:00,
/// evening after.
pub fn time_of_day_greeting(hour: u32) -> &'static str {
    if hour < 12 {
        "Good morning"
    } else if hour < 18 {
        "Good afternoon"
    } else {
        "Good evening"
    }
}

/// Current local hour, for callers that don't carry their own clock.
pub fn current_hour() -> u32 {
    chrono::Local::now().hour()
}

/// Builds the greeting guidance block for the model instructions.
///
/// Known callers are greeted by name; unknown callers get the time-of-day
/// salutation and a first-call framing.
pub fn greeting_block(caller_name: Option<&str>, hour: u32, agent_name: &str) -> String {
    match caller_name {
        Some(name) => format!(
            "This caller is {name}, who you have spoken with before. Greet \
             them by name, warmly, like a returning acquaintance.",
        ),
        None => format!(
            "This is a new caller you have not spoken with before. Open \
             with \"{}\", introduce yourself as {agent_name}, and ask how \
             you can help.",
            time_of_day_greeting(hour),
        ),
    }
}
