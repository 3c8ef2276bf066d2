//! Top-level error type for a generation run.
//!
//! Each phase has its own error enum carrying the context its diagnostic
//! needs. [`GeneratorError`] wraps them so the binary can report any fatal
//! failure uniformly and pick an exit code.

use thiserror::Error;

use crate::config::ConfigError;
use crate::extract::ExtractError;
use crate::feature::DocumentError;
use crate::gate::HashRecordError;
use crate::link::LinkError;

/// Errors that abort a generation run.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The configuration could not be assembled.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Walking a source root failed.
    #[error("file discovery failed: {0}")]
    Discovery(#[from] walkdir::Error),

    /// An implementation file could not be read or misuses the declarative
    /// surface.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// A scenario document could not be read or parsed.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// A scenario could not be linked to its step definitions.
    #[error(transparent)]
    Link(#[from] LinkError),

    /// The persisted hash record could not be read or written.
    #[error(transparent)]
    HashRecord(#[from] HashRecordError),
}

impl GeneratorError {
    /// Whether the error stems from configuration rather than from the
    /// project being generated.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_error_displays_message() {
        let error: GeneratorError =
            ConfigError::InvalidValue("unknown log level".to_string()).into();
        assert_eq!(
            error.to_string(),
            "invalid configuration: unknown log level"
        );
        assert!(error.is_config());
    }

    #[test]
    fn hash_record_errors_are_not_config_errors() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error: GeneratorError = HashRecordError::Write {
            path: "stepgen.hash.json".into(),
            source: io_err,
        }
        .into();
        assert!(!error.is_config());
        assert!(error.to_string().contains("stepgen.hash.json"));
    }
}
