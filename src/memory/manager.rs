//! Conversation memory management
//!
//! Records exchanges into a session and compacts the window into the running
//! summary once it grows past the trigger length.

use crate::memory::session::ChatSession;
use crate::memory::summarizer::Summarizer;
use crate::models::Turn;
use crate::Result;
use tracing::{debug, info};

/// Length thresholds for one kind of session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryConfig {
    /// Compact once the window holds more turns than this
    pub summary_trigger: usize,
    /// Turns left in the window after compaction
    pub retention_turns: usize,
}

impl MemoryConfig {
    /// Turns kept per exchange
    const TURNS_PER_EXCHANGE: usize = 2;

    pub fn new(summary_trigger: usize, retention_turns: usize) -> Self {
        Self {
            summary_trigger,
            retention_turns,
        }
    }

    /// Longer-lived window used by the fallback agent
    pub fn fallback() -> Self {
        Self::new(8 * Self::TURNS_PER_EXCHANGE, 4 * Self::TURNS_PER_EXCHANGE)
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self::new(8, 4 * Self::TURNS_PER_EXCHANGE)
    }
}

/// Applies a [`MemoryConfig`] to sessions
#[derive(Debug, Clone, Default)]
pub struct MemoryManager {
    config: MemoryConfig,
}

impl MemoryManager {
    pub fn new(config: MemoryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Append the user turn then the assistant turn
    pub fn record_exchange(&self, session: &mut ChatSession, user_text: &str, assistant_text: &str) {
        session.push_turn(Turn::user(user_text));
        session.push_turn(Turn::assistant(assistant_text));
    }

    pub fn should_compact(&self, session: &ChatSession) -> bool {
        session.turn_count() > self.config.summary_trigger
    }

    /// Summarize and truncate the window if it is over the trigger.
    ///
    /// Returns `Ok(true)` when compaction ran. A summarizer failure leaves the
    /// session exactly as it was.
    pub async fn maybe_compact(
        &self,
        session: &mut ChatSession,
        summarizer: &dyn Summarizer,
    ) -> Result<bool> {
        if !self.should_compact(session) {
            debug!(
                turns = session.turn_count(),
                trigger = self.config.summary_trigger,
                "Window under trigger, no compaction"
            );
            return Ok(false);
        }

        let turns = session.turns_snapshot();
        let new_summary = summarizer.summarize(&turns).await?;

        session.append_summary(&new_summary);
        session.trim_to_recent(self.config.retention_turns);

        info!(
            summarized = turns.len(),
            retained = session.turn_count(),
            "Compacted conversation window into summary"
        );

        Ok(true)
    }
}
