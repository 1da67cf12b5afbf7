#![deny(missing_docs)]
//! Turn driver (C10, §4.1): the one entry point that composes the
//! router (C6), the C2-C5 workers, the synthesizer (C9), and the
//! slot-visibility projector (C8) into a single turn, under the
//! protocol's hook points and the `MAX_ROUTER_CALLS` loop bound.

mod driver;
mod error;
mod product;

pub use driver::{TurnDriver, TurnOutcome};
pub use error::TurnError;
pub use product::ProductBinding;
