//! The Hook interface — observation and intervention around a turn.

use crate::error::HookError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Where in the turn lifecycle a hook fires.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPoint {
    /// Before the router produces an action plan.
    PreRoute,
    /// After the router produces an action plan, before dispatch.
    PostRoute,
    /// Before a worker (C2-C5) is invoked.
    PreWorker,
    /// After a worker completes, before its patch is merged.
    PostWorker,
    /// Before the synthesizer composes the final reply.
    PreSynthesis,
    /// After the turn has produced its final reply and UI delta.
    TurnEnd,
}

/// What context is available to a hook at its firing point.
/// Read-only — hooks observe and decide, they don't mutate directly.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookContext {
    /// Current hook point.
    pub point: HookPoint,
    /// Session this turn belongs to.
    pub session_id: String,
    /// Worker name being invoked (only at Pre/PostWorker).
    pub worker_name: Option<String>,
    /// Stage id active when the hook fired, if any.
    pub stage_id: Option<String>,
    /// Number of worker invocations dispatched so far this turn.
    pub router_call_count: u32,
}

impl HookContext {
    /// Create a new `HookContext` with only the hook point and session set.
    pub fn new(point: HookPoint, session_id: impl Into<String>) -> Self {
        Self {
            point,
            session_id: session_id.into(),
            worker_name: None,
            stage_id: None,
            router_call_count: 0,
        }
    }
}

/// What a hook decides to do.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum HookAction {
    /// Continue normally.
    Continue,
    /// Halt the turn early (e.g. a guardrail tripwire). The driver
    /// falls through to the synthesizer with whatever partial result
    /// is available, exactly as it would on `LoopBudgetExceeded`.
    Halt {
        /// Reason for halting.
        reason: String,
    },
}

/// A hook that observes (and may halt) the turn driver's loop.
///
/// Implementations:
/// - a `tracing`-based logging hook (the default; see `banking-hooks`)
/// - a budget hook that halts after N worker calls in a session
/// - a test hook that records the sequence of points for assertions
///
/// Hook handlers SHOULD complete quickly — they run inline in the
/// turn driver's loop, once per dispatched action.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Which points this hook fires at.
    fn points(&self) -> &[HookPoint];

    /// Called at each registered hook point.
    /// Returning an error does NOT halt the turn — it is logged and the
    /// pipeline continues. Use `HookAction::Halt` to halt.
    async fn on_event(&self, ctx: &HookContext) -> Result<HookAction, HookError>;
}
