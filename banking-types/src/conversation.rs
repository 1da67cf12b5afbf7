//! `ConversationState` — the one canonical state record that persists
//! across turns of a session (design note §9: "pick one immutable
//! record type; clone-with-updates at each worker boundary").

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::collected_value::CollectedValue;
use crate::message::Message;
use crate::scenario::ProductType;

/// Conversation state, persisted across turns of one session by the
/// `SessionStore` (`banking-protocol::StateStore`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationState {
    /// Ordered transcript, append-only within a turn.
    pub messages: Vec<Message>,
    /// Set the first time the user picks a product.
    pub current_product_type: Option<ProductType>,
    /// The stage whose prompt was last emitted — the stage the user is
    /// answering.
    pub current_scenario_stage_id: Option<String>,
    /// Field key -> collected value. The mapping itself is authoritative
    /// even though individual values may be tentative pending a
    /// confirmation (§4.3).
    pub collected_info: HashMap<String, CollectedValue>,
    /// True while the user is interactively amending fields (§4.3).
    pub correction_mode: bool,
    /// Field key -> proposed value, awaiting user confirmation.
    pub pending_modifications: HashMap<String, CollectedValue>,
    /// Snapshot used to roll back a rejected edit.
    pub original_values_before_modification: HashMap<String, CollectedValue>,
    /// Single field-key the system is currently asking the user to supply
    /// a new value for.
    pub current_modification_context: Option<String>,
    /// True after one edit has been applied and before the user confirms
    /// "no more edits".
    pub waiting_for_additional_modifications: bool,
    /// The last assistant message, used by the entity extractor to
    /// resolve deictic references ("그걸로").
    pub last_assistant_prompt: Option<String>,
    /// True when the previous turn ended with an assistant question.
    pub scenario_ready_for_continuation: bool,
}

impl ConversationState {
    /// A fresh, empty conversation state for a brand-new session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user message to the transcript.
    pub fn push_user_message(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Append an assistant message to the transcript and record it as
    /// the context for the next turn's deictic resolution.
    pub fn push_assistant_message(&mut self, content: impl Into<String>) {
        let content = content.into();
        self.last_assistant_prompt = Some(content.clone());
        self.messages.push(Message::assistant(content));
    }

    /// The last `n` user/assistant exchanges, formatted as
    /// `"user: ...\nassistant: ..."` lines, newest last — the shape the
    /// router and QA worker prompts expect (§4.6, §4.5).
    pub fn recent_history(&self, n: usize) -> Vec<&Message> {
        self.messages
            .iter()
            .rev()
            .filter(|m| !matches!(m.role, crate::message::Role::System))
            .take(n * 2)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect()
    }

    /// Invariant I3: every key in `collected_info` is declared by the
    /// scenario's `required_info_fields`, or is bookkeeping prefixed `_`.
    pub fn collected_keys_are_declared(&self, declared: &[&str]) -> bool {
        self.collected_info
            .keys()
            .all(|k| k.starts_with('_') || declared.contains(&k.as_str()))
    }
}

/// A sparse, mergeable diff a worker returns instead of mutating
/// `ConversationState` directly (§3 "Ownership": "workers receive a
/// snapshot and return a patch").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationPatch {
    /// New transcript entries to append, in order.
    #[serde(default)]
    pub append_messages: Vec<Message>,
    /// Set `current_product_type` if `Some`.
    #[serde(default)]
    pub current_product_type: Option<ProductType>,
    /// Set `current_scenario_stage_id` if `Some`.
    #[serde(default)]
    pub current_scenario_stage_id: Option<String>,
    /// Slot updates to merge into `collected_info`.
    #[serde(default)]
    pub collected_info_updates: HashMap<String, CollectedValue>,
    /// If present, replaces `correction_mode`.
    #[serde(default)]
    pub correction_mode: Option<bool>,
    /// If present, replaces `pending_modifications` wholesale.
    #[serde(default)]
    pub pending_modifications: Option<HashMap<String, CollectedValue>>,
    /// If present, replaces `original_values_before_modification` wholesale.
    #[serde(default)]
    pub original_values_before_modification: Option<HashMap<String, CollectedValue>>,
    /// If present, replaces `current_modification_context`. `Some(None)`
    /// clears it, distinct from "field not touched this turn".
    #[serde(default)]
    pub current_modification_context: Option<Option<String>>,
    /// If present, replaces `waiting_for_additional_modifications`.
    #[serde(default)]
    pub waiting_for_additional_modifications: Option<bool>,
    /// If present, replaces `scenario_ready_for_continuation`.
    #[serde(default)]
    pub scenario_ready_for_continuation: Option<bool>,
}

impl ConversationPatch {
    /// Merge `self` into `state` in place. Called by the turn driver once
    /// per dispatched worker, in plan order — "each worker observes
    /// patches from all previous workers of the same turn" (§5).
    pub fn apply_to(self, state: &mut ConversationState) {
        state.messages.extend(self.append_messages);
        if let Some(p) = self.current_product_type {
            state.current_product_type = Some(p);
        }
        if let Some(s) = self.current_scenario_stage_id {
            state.current_scenario_stage_id = Some(s);
        }
        state.collected_info.extend(self.collected_info_updates);
        if let Some(v) = self.correction_mode {
            state.correction_mode = v;
        }
        if let Some(v) = self.pending_modifications {
            state.pending_modifications = v;
        }
        if let Some(v) = self.original_values_before_modification {
            state.original_values_before_modification = v;
        }
        if let Some(v) = self.current_modification_context {
            state.current_modification_context = v;
        }
        if let Some(v) = self.waiting_for_additional_modifications {
            state.waiting_for_additional_modifications = v;
        }
        if let Some(v) = self.scenario_ready_for_continuation {
            state.scenario_ready_for_continuation = v;
        }
    }
}
