#![deny(missing_docs)]
//! Stage-response formatter (C7, `format`) and response synthesizer
//! (C9, `synth`): rendering the outgoing per-turn payload (§4.7, §4.9).

pub mod format;
pub mod synth;

pub use format::{format_stage, ChoiceView, FormattedPrompt};
