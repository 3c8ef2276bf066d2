//! Shared step vocabulary and matching utilities for stepgen.
//!
//! The crate exposes the closed keyword enums, the literal-or-pattern step
//! matcher and the generated-name derivation used by both the extractor and
//! the emitter, so the two halves of the generator agree on naming and
//! matching rules.

mod errors;
mod keyword;
mod matcher;
mod naming;
mod translate;

pub use errors::{PatternError, UnknownBlock};
pub use keyword::{StepBlock, StepKeyword};
pub use matcher::{PatternMatcher, StepMatcher};
pub use naming::generated_name;
pub use translate::translate_regex_literal;
