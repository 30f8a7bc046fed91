//! Per-topic chat session state
//!
//! Holds the rolling window of recent turns plus the running summary of
//! everything that has been compacted out of the window.

use crate::models::Turn;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Rendered in prompts in place of an empty history or summary
pub const EMPTY_SENTINEL: &str = "None";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Recent turns, oldest first
    recent_turns: VecDeque<Turn>,
    /// Append-only condensed context
    summary: String,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            created_at: Utc::now(),
            updated_at: Utc::now(),
            recent_turns: VecDeque::new(),
            summary: String::new(),
        }
    }

    pub fn push_turn(&mut self, turn: Turn) {
        self.recent_turns.push_back(turn);
        self.updated_at = Utc::now();
    }

    pub fn recent_turns(&self) -> impl DoubleEndedIterator<Item = &Turn> {
        self.recent_turns.iter()
    }

    /// Contiguous copy of the window, for handing to a summarizer
    pub fn turns_snapshot(&self) -> Vec<Turn> {
        self.recent_turns.iter().cloned().collect()
    }

    pub fn turn_count(&self) -> usize {
        self.recent_turns.len()
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Append condensed text to the summary, newline separated
    pub fn append_summary(&mut self, text: &str) {
        self.summary.push('\n');
        self.summary.push_str(text);
        self.updated_at = Utc::now();
    }

    /// Drop the oldest turns so at most `keep` remain
    pub fn trim_to_recent(&mut self, keep: usize) {
        while self.recent_turns.len() > keep {
            self.recent_turns.pop_front();
        }
        self.updated_at = Utc::now();
    }

    /// History block for prompt injection, one `speaker: text` line per turn
    pub fn format_history(&self) -> String {
        if self.recent_turns.is_empty() {
            return EMPTY_SENTINEL.to_string();
        }

        self.recent_turns
            .iter()
            .map(|turn| turn.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Summary block for prompt injection
    pub fn format_summary(&self) -> &str {
        let trimmed = self.summary.trim();
        if trimmed.is_empty() {
            EMPTY_SENTINEL
        } else {
            trimmed
        }
    }

    pub fn reset(&mut self) {
        self.recent_turns.clear();
        self.summary.clear();
        self.updated_at = Utc::now();
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history_is_sentinel() {
        let session = ChatSession::new();
        assert_eq!(session.format_history(), "None");
        assert_eq!(session.format_summary(), "None");
    }

    #[test]
    fn test_format_history_keeps_order() {
        let mut session = ChatSession::new();
        session.push_turn(Turn::user("do you ship to Pune?"));
        session.push_turn(Turn::assistant("Yes, in 3-5 days."));

        assert_eq!(
            session.format_history(),
            "user: do you ship to Pune?\nassistant: Yes, in 3-5 days."
        );
    }

    #[test]
    fn test_trim_to_recent() {
        let mut session = ChatSession::new();
        for i in 0..10 {
            session.push_turn(Turn::user(format!("Question {}", i)));
        }

        session.trim_to_recent(4);
        assert_eq!(session.turn_count(), 4);
        assert_eq!(session.recent_turns().next().unwrap().text, "Question 6");
    }

    #[test]
    fn test_append_summary_never_overwrites() {
        let mut session = ChatSession::new();
        session.append_summary("asked about refunds");
        session.append_summary("asked about shoes");
        assert_eq!(session.summary(), "\nasked about refunds\nasked about shoes");
    }

    #[test]
    fn test_reset() {
        let mut session = ChatSession::new();
        session.push_turn(Turn::user("hi"));
        session.append_summary("greeted");
        session.reset();
        assert_eq!(session.turn_count(), 0);
        assert_eq!(session.summary(), "");
    }
}
