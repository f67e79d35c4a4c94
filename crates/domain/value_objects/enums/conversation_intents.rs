use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConversationIntent {
    Troubleshooting,
    Coding,
    Career,
    Learning,
    #[default]
    General,
}

impl ConversationIntent {
    /// Coarse substring classification, first rule wins.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        let has_any = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

        if has_any(&["error", "bug", "fix", "not working", "issue", "crash"]) {
            ConversationIntent::Troubleshooting
        } else if has_any(&["code", "script", "python", "javascript", "sql", "function"]) {
            ConversationIntent::Coding
        } else if has_any(&["career", "job", "resume", "interview", "salary"]) {
            ConversationIntent::Career
        } else if has_any(&["how", "what", "explain", "learn", "why", "difference"]) {
            ConversationIntent::Learning
        } else {
            ConversationIntent::General
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationIntent::Troubleshooting => "troubleshooting",
            ConversationIntent::Coding => "coding",
            ConversationIntent::Career => "career",
            ConversationIntent::Learning => "learning",
            ConversationIntent::General => "general",
        }
    }
}

impl Display for ConversationIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_first_matching_rule() {
        assert_eq!(
            ConversationIntent::classify("My Python script throws an error"),
            ConversationIntent::Troubleshooting
        );
        assert_eq!(
            ConversationIntent::classify("Write a python script for NDVI"),
            ConversationIntent::Coding
        );
        assert_eq!(
            ConversationIntent::classify("Explain map projections"),
            ConversationIntent::Learning
        );
        assert_eq!(ConversationIntent::classify("hello"), ConversationIntent::General);
    }
}
