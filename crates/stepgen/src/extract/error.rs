//! Diagnostics for malformed implementation files.

use std::fmt;
use std::path::PathBuf;

use stepgen_patterns::PatternError;
use thiserror::Error;

use crate::model::HookName;

/// What is wrong with a declaration.
#[derive(Debug, Error)]
pub enum DeclarationErrorKind {
    /// The file does not parse.
    #[error("syntax error near {snippet:?}")]
    Syntax {
        /// Source text at the first error node.
        snippet: String,
    },
    /// A declaration function is called without being imported.
    #[error("'{callee}' must be imported from '{module}'")]
    MissingImport {
        /// The called function.
        callee: String,
        /// The module it must come from.
        module: String,
    },
    /// The file never calls `defineFileScopes`.
    #[error("the file must call 'defineFileScopes' once")]
    MissingFileScopes,
    /// The file calls `defineFileScopes` more than once.
    #[error("'defineFileScopes' may only be called once per file")]
    DuplicateFileScopes,
    /// `defineFileScopes` did not receive exactly one array.
    #[error("'defineFileScopes' expects a single array of scopes")]
    FileScopesArguments,
    /// A step declaration has too few or too many arguments.
    #[error("'{callee}' expects {expected} arguments, found {found}")]
    StepArgumentCount {
        /// The called function.
        callee: String,
        /// Accepted argument counts.
        expected: &'static str,
        /// Arguments actually passed.
        found: usize,
    },
    /// The block list is not a non-empty array of block names.
    #[error("the first argument of 'defineStep' must be a non-empty array of 'given', 'when' or 'then'")]
    InvalidBlocks,
    /// The matcher is neither a string nor a regular-expression literal.
    #[error("the step matcher must be a string or regular expression literal")]
    InvalidMatcher,
    /// The regular-expression literal cannot be used for matching.
    #[error("unusable step pattern: {0}")]
    InvalidPattern(#[source] PatternError),
    /// The implementation is neither a function nor a callback name.
    #[error("the step implementation must be a function or the name of a callback declared above")]
    InvalidBody,
    /// The implementation names a callback that was not declared above.
    #[error("unknown callback '{name}'")]
    UnknownCallback {
        /// The referenced identifier.
        name: String,
    },
    /// Scopes were not given as an array literal.
    #[error("scopes must be an array of object literals")]
    ScopesNotArray,
    /// A scope entry is not a plain object literal.
    #[error("invalid scope, expected an object literal with 'feature', 'scenario' or 'tag'")]
    ScopeNotObject,
    /// A scope object uses a key outside `feature`, `scenario` and `tag`.
    #[error("invalid scope '{key}', expected one of 'feature', 'scenario' or 'tag'")]
    InvalidScope {
        /// The offending key.
        key: String,
    },
    /// A scope value is not a string literal.
    #[error("scope '{key}' must be a string literal")]
    ScopeValue {
        /// The key whose value is wrong.
        key: String,
    },
    /// A hook was registered with other than one argument.
    #[error("'{hook}' expects exactly one function argument, found {found}")]
    HookArgumentCount {
        /// The hook being registered.
        hook: HookName,
        /// Arguments actually passed.
        found: usize,
    },
    /// One file imports a module's default or namespace under two names.
    #[error("'{module}' is imported with {kind} binding '{existing}' and again as '{incoming}'")]
    ConflictingImport {
        /// Module specifier as written.
        module: String,
        /// `default` or `namespace`.
        kind: &'static str,
        /// The name bound first.
        existing: String,
        /// The name that disagrees.
        incoming: String,
    },
    /// A hook argument is not a function literal.
    #[error("'{hook}' expects a function literal")]
    HookBody {
        /// The hook being registered.
        hook: HookName,
    },
}

/// A malformed declaration, located in its implementation file.
#[derive(Debug)]
pub struct DeclarationError {
    /// File containing the declaration.
    pub path: PathBuf,
    /// One-based line.
    pub line: usize,
    /// One-based column.
    pub column: usize,
    /// The problem.
    pub kind: DeclarationErrorKind,
}

impl fmt::Display for DeclarationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid step definitions in {}:{}:{}: {}",
            self.path.display(),
            self.line,
            self.column,
            self.kind
        )
    }
}

impl std::error::Error for DeclarationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

/// Errors raised while extracting one implementation file.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The grammar could not be loaded or the parser gave up.
    #[error("failed to parse {path}: {message}")]
    Parser {
        /// File being parsed.
        path: PathBuf,
        /// Parser failure description.
        message: String,
    },
    /// The file misuses the declarative surface.
    #[error(transparent)]
    Declaration(#[from] Box<DeclarationError>),
}
