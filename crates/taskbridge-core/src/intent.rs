//! Keyword routing for free-text messages outside the wizard.

/// What a free-text message is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Start the task creation wizard.
    AddTask,
    /// Morning briefing.
    Briefing,
    DeepTasks,
    LightTasks,
    /// Nothing matched; reply with usage hints.
    Help,
}

/// Classify a message by keyword. The first matching rule wins.
pub fn classify(text: &str) -> Intent {
    let lower = text.to_lowercase();
    let has = |needle: &str| lower.contains(needle);

    if has("add") || has("create") || has("new task") {
        Intent::AddTask
    } else if has("morning") || has("briefing") || has("today") {
        Intent::Briefing
    } else if has("deep") {
        Intent::DeepTasks
    } else if has("light") {
        Intent::LightTasks
    } else if has("task") || has("what") || has("show") {
        Intent::DeepTasks
    } else {
        Intent::Help
    }
}

/// Usage hints for messages that matched nothing.
pub const HELP_HINT: &str = "I'm not sure what you need. Try:\n\n\
    • \"show tasks\" - See your tasks\n\
    • \"add task\" - Create new task\n\
    • \"morning briefing\" - Daily summary\n\
    • /help - See all commands";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_wins_over_everything() {
        assert_eq!(classify("Add a deep task for today"), Intent::AddTask);
        assert_eq!(classify("create something"), Intent::AddTask);
        assert_eq!(classify("NEW TASK please"), Intent::AddTask);
    }

    #[test]
    fn test_briefing_keywords() {
        assert_eq!(classify("good morning"), Intent::Briefing);
        assert_eq!(classify("what's on today?"), Intent::Briefing);
    }

    #[test]
    fn test_category_keywords() {
        assert_eq!(classify("deep work list"), Intent::DeepTasks);
        assert_eq!(classify("light stuff"), Intent::LightTasks);
    }

    #[test]
    fn test_generic_listing_keywords() {
        assert_eq!(classify("show me"), Intent::DeepTasks);
        assert_eq!(classify("what's left"), Intent::DeepTasks);
        assert_eq!(classify("my tasks"), Intent::DeepTasks);
    }

    #[test]
    fn test_fallback_is_help() {
        assert_eq!(classify("hello there"), Intent::Help);
    }
}
