//! # banking-protocol — protocol boundaries shared by the dialogue engine
//!
//! This crate defines the small set of cross-cutting interfaces that the
//! rest of the workspace builds on: session identity, the state-store
//! boundary the turn driver uses to persist `ConversationState`, and the
//! hook interface used for turn-level observation.
//!
//! These traits are intentionally minimal and domain-agnostic — they say
//! nothing about banking, scenarios, or Korean. The domain lives in
//! `banking-types` and the crates built on top of it.

#![deny(missing_docs)]

pub mod error;
pub mod hook;
pub mod id;
pub mod state;

pub use error::{HookError, StateError};
pub use hook::{Hook, HookAction, HookContext, HookPoint};
pub use id::{ScopeId, SessionId};
pub use state::{SearchResult, StateReader, StateStore};
