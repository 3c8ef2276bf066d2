//! Arena of every declaration extracted in a run.
//!
//! Step identity is the arena index: two scenario lines resolve to the same
//! definition exactly when they resolve to the same [`StepId`].

use std::fmt;

use crate::extract::ExtractedFile;
use crate::model::{CommonCode, Hook, StepDefinition};

/// Stable identity of a step definition within one [`StepPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StepId(usize);

impl StepId {
    /// Position of the definition in extraction order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Steps, hooks and common code of all implementation files, in file
/// discovery order.
#[derive(Debug, Default)]
pub struct StepPool {
    steps: Vec<StepDefinition>,
    hooks: Vec<Hook>,
    root_common_code: Vec<CommonCode>,
    context_common_code: Vec<CommonCode>,
}

impl StepPool {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one file's declarations, assigning the next identities to its
    /// steps.
    pub fn add_file(&mut self, file: ExtractedFile) {
        self.steps.extend(file.steps);
        self.hooks.extend(file.hooks);
        self.root_common_code.extend(file.root_common_code);
        self.context_common_code.extend(file.context_common_code);
    }

    /// Add a single step and return its identity.
    pub fn add_step(&mut self, step: StepDefinition) -> StepId {
        let id = StepId(self.steps.len());
        self.steps.push(step);
        id
    }

    /// Look up a step by identity.
    #[must_use]
    pub fn get(&self, id: StepId) -> Option<&StepDefinition> {
        self.steps.get(id.0)
    }

    /// Iterate over steps with their identities.
    pub fn steps(&self) -> impl Iterator<Item = (StepId, &StepDefinition)> {
        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| (StepId(index), step))
    }

    /// All hooks.
    #[must_use]
    pub fn hooks(&self) -> &[Hook] {
        &self.hooks
    }

    /// Common code independent of the scenario state.
    #[must_use]
    pub fn root_common_code(&self) -> &[CommonCode] {
        &self.root_common_code
    }

    /// Common code that mentions the scenario state.
    #[must_use]
    pub fn context_common_code(&self) -> &[CommonCode] {
        &self.context_common_code
    }

    /// Number of step definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Return `true` when no step was declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl FromIterator<ExtractedFile> for StepPool {
    fn from_iter<I: IntoIterator<Item = ExtractedFile>>(files: I) -> Self {
        let mut pool = Self::new();
        for file in files {
            pool.add_file(file);
        }
        pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Surface, extract_source};
    use std::path::Path;

    fn file(name: &str, steps: &[&str]) -> ExtractedFile {
        let mut source = String::from(
            "import { given, defineFileScopes } from '@charlesgilles/bdd-generator';\n\
             defineFileScopes([{}]);\n\
             const shared = 1;\n",
        );
        for step in steps {
            source.push_str(&format!("given('{step}', () => {{}});\n"));
        }
        match extract_source(Path::new(name), &source, &Surface::default()) {
            Ok(file) => file,
            Err(err) => panic!("extraction should succeed: {err}"),
        }
    }

    #[test]
    fn identities_follow_extraction_order() {
        let pool: StepPool = [file("a.js", &["one", "two"]), file("b.js", &["three"])]
            .into_iter()
            .collect();

        let names: Vec<_> = pool
            .steps()
            .map(|(id, step)| (id.index(), step.generated_name.clone()))
            .collect();
        assert_eq!(
            names,
            [
                (0, "One".to_string()),
                (1, "Two".to_string()),
                (2, "Three".to_string())
            ]
        );
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.root_common_code().len(), 2);
        assert!(pool.context_common_code().is_empty());
    }

    #[test]
    fn lookup_by_identity() {
        let mut pool = StepPool::new();
        pool.add_file(file("a.js", &["one"]));
        let extra = file("b.js", &["two"]).steps.remove(0);
        let id = pool.add_step(extra);
        assert_eq!(id.to_string(), "#1");
        assert_eq!(pool.get(id).map(|step| step.generated_name.as_str()), Some("Two"));
        assert!(pool.get(StepId(9)).is_none());
    }
}
