//! crates/tutor_core/src/tutor.rs
//!
//! Prompt construction and lightweight scoring used by the conversation drivers.
//! The scoring is a heuristic over the learner's own words; it never calls the provider.

use crate::domain::{ChatMessage, ChatRole, Level, ScenarioRecord};

/// Words this short are ignored when matching a learner turn against example phrases.
const MIN_MATCH_WORD_LEN: usize = 4;

/// Inputs that end an interactive practice loop.
pub const QUIT_WORDS: [&str; 3] = ["quit", "exit", "終了"];

pub fn is_quit_command(input: &str) -> bool {
    let input = input.trim().to_lowercase();
    QUIT_WORDS.iter().any(|w| *w == input)
}

/// System prompt for free conversation with the tutor.
pub fn tutor_system_prompt(level: Level, theme: &str) -> String {
    format!(
        "You are an excellent English teacher supporting a learner of English conversation.\n\
         Level: {level}\n\
         Theme: {theme}\n\n\
         Follow these guidelines:\n\
         1. Use concise, natural English with vocabulary and grammar suited to a {level} learner.\n\
         2. Correct the learner's mistakes politely and suggest improvements.\n\
         3. Reply in English, adding a short Japanese explanation when it helps.\n\
         4. Guide the dialogue so that it builds practical conversation skills."
    )
}

/// System prompt that makes the tutor play the counterpart of a scenario.
pub fn scenario_system_prompt(scenario: &ScenarioRecord) -> String {
    let phrases = scenario
        .example_phrases
        .iter()
        .map(|p| format!("- {}", p.source_text))
        .collect::<Vec<_>>()
        .join("\n");
    let vocabulary = scenario
        .key_vocabulary
        .iter()
        .map(|v| v.term.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let grammar = scenario
        .grammar_points
        .iter()
        .map(|g| format!("- {}: {}", g.point_name, g.explanation))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are role-playing an English conversation practice scenario.\n\
         Scenario: {title}\n\
         Situation: {description}\n\
         The learner's level is {level}.\n\n\
         Play the learner's conversation partner in this situation. Keep your turns short, \
         stay inside the scenario and steer the dialogue so the learner needs these phrases:\n\
         {phrases}\n\n\
         Key vocabulary to bring up naturally: {vocabulary}\n\n\
         Grammar points to practise:\n\
         {grammar}\n\n\
         When the learner uses a target phrase or word, react positively and give brief feedback. \
         Avoid difficult expressions and digressions.",
        title = scenario.title,
        description = scenario.description,
        level = scenario.level,
    )
}

/// Builds the provider request for one learner turn. Any system message already in
/// `history` is dropped in favour of `system_prompt`.
pub fn conversation_messages(
    system_prompt: String,
    history: &[ChatMessage],
    user_text: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(
        history
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .cloned(),
    );
    messages.push(ChatMessage::user(user_text));
    messages
}

pub const SUMMARY_SYSTEM_PROMPT: &str = "You are an expert in English language learning.";

pub const SUMMARY_PROMPT: &str = "Analyse the conversation so far and write a learning summary covering:\n\
     1. The learner's strengths\n\
     2. Points that need improvement (pronunciation, grammar, vocabulary, etc.)\n\
     3. Practical study advice\n\
     4. Suggestions for the next session";

/// Request asking the provider to summarise a finished conversation.
pub fn summary_messages(history: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(SUMMARY_SYSTEM_PROMPT));
    messages.extend(
        history
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .cloned(),
    );
    messages.push(ChatMessage::user(SUMMARY_PROMPT));
    messages
}

/// True when the learner input contains any significant word of any example phrase.
pub fn phrase_matches(user_input: &str, scenario: &ScenarioRecord) -> bool {
    let input = user_input.to_lowercase();
    scenario.example_phrases.iter().any(|phrase| {
        phrase
            .source_text
            .to_lowercase()
            .split_whitespace()
            .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
            .filter(|word| word.chars().count() >= MIN_MATCH_WORD_LEN)
            .any(|word| input.contains(word))
    })
}

/// Running score of one practice session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PracticeTally {
    pub learner_turns: u32,
    pub matched_turns: u32,
}

impl PracticeTally {
    pub fn record_turn(&mut self, user_input: &str, scenario: &ScenarioRecord) -> bool {
        self.learner_turns += 1;
        let matched = phrase_matches(user_input, scenario);
        if matched {
            self.matched_turns += 1;
        }
        matched
    }

    /// Share of learner turns that used scenario phrasing; 0 when there were no turns.
    pub fn accuracy_rate(&self) -> f64 {
        f64::from(self.matched_turns) / f64::from(self.learner_turns.max(1))
    }
}

/// For each key term of the scenario, whether the learner used it in any turn.
pub fn vocabulary_outcomes<S: AsRef<str>>(
    scenario: &ScenarioRecord,
    learner_turns: &[S],
) -> Vec<(String, bool)> {
    let turns: Vec<String> = learner_turns
        .iter()
        .map(|t| t.as_ref().to_lowercase())
        .collect();
    scenario
        .key_vocabulary
        .iter()
        .map(|item| {
            let term = item.term.to_lowercase();
            let used = turns.iter().any(|t| t.contains(&term));
            (item.term.clone(), used)
        })
        .collect()
}

/// Short feedback line for the end of a practice session.
pub fn session_feedback(accuracy_rate: f64) -> &'static str {
    if accuracy_rate >= 0.8 {
        "Excellent! You used expressions that fit the scenario well."
    } else if accuracy_rate >= 0.5 {
        "Good work. Try to use the scenario's example phrases a little more."
    } else {
        "Make more use of the scenario's example phrases next time."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::sample_scenarios;

    fn cafe() -> ScenarioRecord {
        sample_scenarios()
            .into_iter()
            .find(|s| s.id == "cafe_ordering")
            .unwrap()
    }

    #[test]
    fn phrase_matching_ignores_short_words_and_case() {
        let scenario = cafe();
        assert!(phrase_matches("COFFEE for me", &scenario));
        assert!(phrase_matches("any recommendations today?", &scenario));
        // "a", "cup", "of" are all shorter than four characters.
        assert!(!phrase_matches("a cup of tea", &scenario));
    }

    #[test]
    fn tally_computes_accuracy() {
        let scenario = cafe();
        let mut tally = PracticeTally::default();
        assert_eq!(tally.accuracy_rate(), 0.0);

        tally.record_turn("I'd like a latte please", &scenario);
        tally.record_turn("yes", &scenario);
        tally.record_turn("is this to stay?", &scenario);
        tally.record_turn("ok", &scenario);

        assert_eq!(tally.learner_turns, 4);
        assert_eq!(tally.matched_turns, 2);
        assert!((tally.accuracy_rate() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn vocabulary_outcomes_follow_scenario_order() {
        let outcomes = vocabulary_outcomes(&cafe(), &["Can I see the MENU?", "What size is it"]);
        assert_eq!(
            outcomes,
            vec![
                ("order".to_string(), false),
                ("recommendation".to_string(), false),
                ("size".to_string(), true),
                ("menu".to_string(), true),
            ]
        );
    }

    #[test]
    fn conversation_messages_replace_client_system_prompts() {
        let history = vec![
            ChatMessage::system("ignore me"),
            ChatMessage::assistant("Hello! What can I get you?"),
        ];
        let messages = conversation_messages(tutor_system_prompt(Level::Beginner, "travel"), &history, "A coffee.");

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, ChatRole::System);
        assert!(messages[0].content.contains("Theme: travel"));
        assert_eq!(messages[1], ChatMessage::assistant("Hello! What can I get you?"));
        assert_eq!(messages[2], ChatMessage::user("A coffee."));
    }

    #[test]
    fn scenario_prompt_lists_targets() {
        let prompt = scenario_system_prompt(&cafe());
        assert!(prompt.contains("I'd like a cup of coffee, please."));
        assert!(prompt.contains("order, recommendation, size, menu"));
        assert!(prompt.contains("Could I have ~?"));
    }

    #[test]
    fn summary_request_ends_with_the_summary_prompt() {
        let messages = summary_messages(&[ChatMessage::user("Hi"), ChatMessage::assistant("Hello")]);
        assert_eq!(messages.first().unwrap().content, SUMMARY_SYSTEM_PROMPT);
        assert_eq!(messages.last().unwrap().content, SUMMARY_PROMPT);
        assert_eq!(messages.len(), 4);
    }

    #[test]
    fn quit_words_are_recognised() {
        assert!(is_quit_command(" Quit "));
        assert!(is_quit_command("終了"));
        assert!(!is_quit_command("quite good"));
    }

    #[test]
    fn feedback_bands() {
        assert!(session_feedback(0.8).starts_with("Excellent"));
        assert!(session_feedback(0.5).starts_with("Good"));
        assert!(session_feedback(0.49).starts_with("Make"));
    }
}
