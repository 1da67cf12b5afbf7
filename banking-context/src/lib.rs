#![deny(missing_docs)]
//! Conversation history windowing and prompt formatting (§4.6, §4.5:
//! "the router and QA worker prompts carry the last N exchanges, newest
//! last").
//!
//! [`HistoryWindow`] estimates token cost with the same chars-per-token
//! heuristic used throughout the rest of the stack and trims a
//! transcript down to a budget, always keeping the most recent
//! exchanges. [`format_history`] renders a trimmed transcript into the
//! `"user: ...\nassistant: ..."` block the router, scenario engine, and
//! synthesizer prompts expect.

use banking_types::Message;

/// Trims a message transcript to fit an approximate token budget.
///
/// Unlike a general-purpose compaction strategy, the dialogue engine
/// never needs to preserve a "first message" anchor — turn prompts only
/// ever want the most recent exchanges, so this always drops from the
/// front.
pub struct HistoryWindow {
    chars_per_token: usize,
}

impl HistoryWindow {
    /// Create a window with the default chars-per-token ratio (4).
    pub fn new() -> Self {
        Self { chars_per_token: 4 }
    }

    /// Create a window with a custom chars-per-token ratio.
    pub fn with_ratio(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }

    fn estimate_message_tokens(&self, msg: &Message) -> usize {
        msg.content.chars().count() / self.chars_per_token + 4
    }

    /// Approximate token count for a transcript slice.
    pub fn token_estimate(&self, messages: &[&Message]) -> usize {
        messages.iter().map(|m| self.estimate_message_tokens(m)).sum()
    }

    /// Whether a transcript slice exceeds `limit` estimated tokens.
    pub fn should_compact(&self, messages: &[&Message], limit: usize) -> bool {
        self.token_estimate(messages) > limit
    }

    /// Drop the oldest messages until the remainder fits `limit`
    /// estimated tokens. Always keeps at least the single most recent
    /// message.
    pub fn compact<'a>(&self, messages: &[&'a Message], limit: usize) -> Vec<&'a Message> {
        let mut kept: Vec<&Message> = Vec::new();
        let mut total = 0usize;

        for msg in messages.iter().rev() {
            let tokens = self.estimate_message_tokens(msg);
            if total + tokens > limit && !kept.is_empty() {
                break;
            }
            kept.push(msg);
            total += tokens;
        }

        kept.reverse();
        kept
    }
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a transcript slice as `"user: ...\nassistant: ..."` lines,
/// newest last, skipping system entries — the shape the router and QA
/// worker prompts expect (§4.6, §4.5).
pub fn format_history(messages: &[&Message]) -> String {
    messages
        .iter()
        .filter(|m| !matches!(m.role, banking_types::Role::System))
        .map(|m| {
            let who = match m.role {
                banking_types::Role::User => "user",
                banking_types::Role::Assistant => "assistant",
                banking_types::Role::System => unreachable!(),
            };
            format!("{who}: {}", m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
