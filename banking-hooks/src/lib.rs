#![deny(missing_docs)]
//! Hook registry and a concrete logging hook for the dialogue engine.
//!
//! The [`HookRegistry`] collects multiple [`Hook`] implementations into
//! an ordered pipeline. At each hook point, hooks are dispatched in
//! registration order. The pipeline short-circuits on `Halt` —
//! subsequent hooks are not called. Hook errors are logged and the
//! pipeline continues (errors don't halt).

use async_trait::async_trait;
use banking_protocol::hook::{Hook, HookAction, HookContext, HookPoint};
use std::sync::Arc;

/// A registry that dispatches hook events to an ordered pipeline of hooks.
///
/// Hooks are called in the order they were registered. The pipeline
/// short-circuits on `Halt` (except errors, which are logged and ignored).
pub struct HookRegistry {
    hooks: Vec<Arc<dyn Hook>>,
}

impl HookRegistry {
    /// Create a new empty hook registry.
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Add a hook to the end of the pipeline.
    pub fn add(&mut self, hook: Arc<dyn Hook>) {
        self.hooks.push(hook);
    }

    /// Dispatch a hook event through the pipeline.
    ///
    /// Returns the final action. If all hooks return `Continue`, the
    /// result is `Continue`. If any hook returns `Halt`, the pipeline
    /// stops there and that action is returned. Hook errors are logged
    /// and treated as `Continue`.
    pub async fn dispatch(&self, ctx: &HookContext) -> HookAction {
        for hook in &self.hooks {
            if !hook.points().contains(&ctx.point) {
                continue;
            }

            match hook.on_event(ctx).await {
                Ok(HookAction::Continue) => continue,
                Ok(action) => return action,
                Err(e) => {
                    tracing::warn!(error = %e, point = ?ctx.point, "hook failed, continuing");
                    continue;
                }
            }
        }

        HookAction::Continue
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A hook that emits a `tracing` event at every point it's registered
/// for, and never halts the pipeline. Useful as the default hook wired
/// into the CLI harness, and as a template for richer hooks (audit
/// trails, per-stage metrics) that want the same blanket coverage.
pub struct LoggingHook {
    points: Vec<HookPoint>,
}

impl LoggingHook {
    /// Build a logging hook that fires at every hook point.
    pub fn all_points() -> Self {
        Self {
            points: vec![
                HookPoint::PreRoute,
                HookPoint::PostRoute,
                HookPoint::PreWorker,
                HookPoint::PostWorker,
                HookPoint::PreSynthesis,
                HookPoint::TurnEnd,
            ],
        }
    }

    /// Build a logging hook that only fires at the given points.
    pub fn for_points(points: Vec<HookPoint>) -> Self {
        Self { points }
    }
}

#[async_trait]
impl Hook for LoggingHook {
    fn points(&self) -> &[HookPoint] {
        &self.points
    }

    async fn on_event(
        &self,
        ctx: &HookContext,
    ) -> Result<HookAction, banking_protocol::error::HookError> {
        tracing::debug!(
            point = ?ctx.point,
            session_id = %ctx.session_id,
            worker_name = ?ctx.worker_name,
            stage_id = ?ctx.stage_id,
            router_call_count = ctx.router_call_count,
            "turn event"
        );
        Ok(HookAction::Continue)
    }
}
