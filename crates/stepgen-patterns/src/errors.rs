//! Error types shared by the matcher modules.

use thiserror::Error;

/// Errors surfaced while converting a regular-expression literal into a
/// compiled step matcher.
///
/// # Examples
/// ```
/// use stepgen_patterns::{PatternError, StepMatcher};
///
/// let err = StepMatcher::from_regex_literal("^ok$", "x").unwrap_err();
/// assert!(matches!(err, PatternError::UnsupportedFlag('x')));
/// ```
#[derive(Debug, Error)]
pub enum PatternError {
    /// The literal carried a flag the matcher cannot honour.
    #[error("unsupported regular expression flag '{0}'")]
    UnsupportedFlag(char),
    /// The literal ended inside an escape sequence.
    #[error("regular expression ends with a dangling escape at byte {0}")]
    DanglingEscape(usize),
    /// The translated source was rejected by the `regex` crate, usually
    /// because it relies on look-around or back-references.
    #[error(transparent)]
    Regex(#[from] regex::Error),
}

/// A block name outside `given`, `when` and `then`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown step block '{0}'")]
pub struct UnknownBlock(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_unsupported_flag() {
        assert_eq!(
            PatternError::UnsupportedFlag('x').to_string(),
            "unsupported regular expression flag 'x'"
        );
    }

    #[test]
    fn forwards_regex_error_display() {
        let err = PatternError::Regex(regex::Error::Syntax("bad".into()));
        assert_eq!(
            err.to_string(),
            regex::Error::Syntax("bad".into()).to_string()
        );
    }
}
