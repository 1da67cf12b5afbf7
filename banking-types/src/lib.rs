//! # banking-types — the shared data model (§3)
//!
//! Scenario graph types (`Scenario`, `Stage`, `FieldSpec`, `Choice`),
//! conversation/turn state, and the shared error taxonomy. Every other
//! crate in the workspace depends on this one; this crate depends on
//! nothing banking-specific.

#![deny(missing_docs)]

pub mod collected_value;
pub mod conversation;
pub mod error;
pub mod field;
pub mod message;
pub mod scenario;
pub mod show_when;
pub mod stage;
pub mod turn;

pub use collected_value::CollectedValue;
pub use conversation::{ConversationPatch, ConversationState};
pub use error::{ExtractionError, ValidationError};
pub use field::{Choice, FieldGroup, FieldSpec, FieldType, ShowWhenSource};
pub use message::{Message, Role};
pub use scenario::{ProductType, Scenario, ScenarioValidationError};
pub use show_when::{ShowWhenError, ShowWhenExpr};
pub use stage::{ResponseType, Stage, StageKind, Transition};
pub use turn::{PlanItem, ScenarioNlu, TurnState};

/// Loop bound from §4.1/§5/I6: the driver never dispatches more than
/// this many worker invocations within a single turn.
pub const MAX_ROUTER_CALLS: u32 = 20;
