#![deny(missing_docs)]
//! Scenario engine (C4): stage completion, next-stage decision, group
//! mode, field validation, and the embedded internet-banking/check-card
//! sub-agents, registered as `scenario_engine` (§4.4).

pub mod completion;
pub mod group;
pub mod subagents;
pub mod transition;
pub mod validation;
pub mod worker;

pub use validation::validate_field;
pub use worker::{ScenarioEngineInput, ScenarioEngineReply, ScenarioEngineWorker};
