//! Extraction of step definitions, hooks and common code from
//! implementation files.
//!
//! Each `*.stepdefinitions.{js,jsx,ts,tsx}` file is parsed with tree-sitter
//! and its top-level statements are classified:
//!
//! - `defineFileScopes([...])` sets the scopes of everything in the file and
//!   must appear exactly once.
//! - `defineStep(blocks, matcher, body, scopes?)` and the `given`, `when`
//!   and `then` shorthands declare steps.
//! - `beforeAll`, `beforeEach`, `afterEach` and `afterAll` register hooks.
//! - Everything else is common code, split by whether it mentions the
//!   per-scenario state.
//!
//! The declaration functions must be imported from the declarative surface
//! module; those bindings are dropped from the dependencies attached to the
//! extracted steps.

mod error;
mod syntax;
mod walker;


use std::path::{Path, PathBuf};

use tracing::debug;

pub use error::{DeclarationError, DeclarationErrorKind, ExtractError};

use crate::config::GeneratorConfig;
use crate::model::{CommonCode, Hook, SourceKind, StepDefinition};
use walker::FileWalker;

/// Names imported from the surface module that only exist for declaring
/// steps.
const DECLARATION_BINDINGS: [&str; 5] = ["defineStep", "defineFileScopes", "given", "when", "then"];

/// The declarative surface implementation files are written against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    /// Module the declaration functions are imported from.
    pub module: String,
    /// Name of the per-scenario state object.
    pub context_identifier: String,
}

impl Surface {
    /// Build the surface described by a configuration.
    #[must_use]
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self {
            module: config.package_name.clone(),
            context_identifier: config.context_identifier.clone(),
        }
    }

    fn is_binding(&self, name: &str) -> bool {
        name == self.context_identifier || DECLARATION_BINDINGS.contains(&name)
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::from_config(&GeneratorConfig::default())
    }
}

/// Everything declared by one implementation file.
#[derive(Debug, Clone)]
pub struct ExtractedFile {
    /// The implementation file.
    pub path: PathBuf,
    /// Syntax flavour of the file.
    pub source_kind: SourceKind,
    /// Steps in declaration order.
    pub steps: Vec<StepDefinition>,
    /// Hooks in declaration order.
    pub hooks: Vec<Hook>,
    /// Common code independent of the scenario state.
    pub root_common_code: Option<CommonCode>,
    /// Common code that mentions the scenario state.
    pub context_common_code: Option<CommonCode>,
}

/// Read and extract one implementation file.
///
/// # Errors
///
/// Returns [`ExtractError`] when the file cannot be read or parsed, or when
/// it misuses the declarative surface.
pub fn extract_file(path: &Path, surface: &Surface) -> Result<ExtractedFile, ExtractError> {
    let source = std::fs::read_to_string(path).map_err(|source| ExtractError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    extract_source(path, &source, surface)
}

/// Extract declarations from source text. `path` selects the grammar and is
/// recorded as the origin of every declaration.
///
/// # Errors
///
/// Returns [`ExtractError`] when the text cannot be parsed or misuses the
/// declarative surface.
pub fn extract_source(
    path: &Path,
    source: &str,
    surface: &Surface,
) -> Result<ExtractedFile, ExtractError> {
    let tree = syntax::parse(path, source)?;
    let extracted = FileWalker::new(path, source, surface).walk(tree.root_node())?;
    debug!(
        path = %path.display(),
        steps = extracted.steps.len(),
        hooks = extracted.hooks.len(),
        "extracted implementation file"
    );
    Ok(extracted)
}
