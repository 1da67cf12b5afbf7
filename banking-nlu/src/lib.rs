#![deny(missing_docs)]
//! Entity/intent extraction (C2): pattern fast path, LLM path, and the
//! `EntityExtractionWorker` registered as `entity_extraction` (§4.2).

pub mod extraction;
pub mod numeral;
pub mod patterns;
pub mod similarity;

pub use extraction::{EntityExtractionWorker, ExtractionInput, ExtractionOutcome};
pub use numeral::spoken_digit_string;
pub use patterns::Patterns;
