//! Diagnostics raised while linking a scenario document.

use std::fmt;
use std::path::PathBuf;

use stepgen_patterns::{StepBlock, StepKeyword};
use thiserror::Error;

use crate::model::StepDefinition;
use crate::scope::describe_scopes;

/// Why a scenario line could not be linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchingProblem {
    /// No candidate accepts the line.
    NoCandidate,
    /// Several candidates accept the line.
    Ambiguous,
    /// Examples rows of an outline resolve to different definitions.
    InconsistentOutline,
}

/// A step definition considered for a scenario line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSummary {
    /// Declaring file.
    pub origin: PathBuf,
    /// Line of the declaration.
    pub line: usize,
    /// Declared blocks.
    pub blocks: Vec<StepBlock>,
    /// Matcher as declared.
    pub matcher: String,
    /// Scopes as declared.
    pub scopes: String,
}

impl From<&StepDefinition> for CandidateSummary {
    fn from(step: &StepDefinition) -> Self {
        Self {
            origin: step.origin.clone(),
            line: step.line,
            blocks: step.blocks.iter().copied().collect(),
            matcher: step.matcher.to_string(),
            scopes: describe_scopes(&step.scopes),
        }
    }
}

impl fmt::Display for CandidateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let blocks: Vec<&str> = self.blocks.iter().map(StepBlock::as_str).collect();
        write!(
            f,
            "{}:{} [{}] {} scopes {}",
            self.origin.display(),
            self.line,
            blocks.join(", "),
            self.matcher,
            self.scopes
        )
    }
}

/// A scenario line that does not resolve to exactly one definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchingError {
    /// What went wrong.
    pub problem: MatchingProblem,
    /// Scenario document.
    pub document: PathBuf,
    /// Feature title.
    pub feature: String,
    /// Scenario title.
    pub scenario: String,
    /// Line of the scenario keyword.
    pub scenario_line: usize,
    /// Keyword the line starts with.
    pub keyword: StepKeyword,
    /// Block the keyword resolved to.
    pub block: StepBlock,
    /// Step text, after outline substitution.
    pub step: String,
    /// Line of the step.
    pub step_line: usize,
    /// Feature and scenario tags.
    pub tags: Vec<String>,
    /// Definitions that survived filtering.
    pub candidates: Vec<CandidateSummary>,
}

impl fmt::Display for MatchingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.problem {
            MatchingProblem::NoCandidate => write!(
                f,
                "No matching step definition found for '{} {}'",
                self.keyword.as_str(),
                self.step
            )?,
            MatchingProblem::Ambiguous => write!(
                f,
                "Ambiguous step definition for '{} {}'",
                self.keyword.as_str(),
                self.step
            )?,
            MatchingProblem::InconsistentOutline => write!(
                f,
                "Examples rows of '{} {}' resolve to different step definitions",
                self.keyword.as_str(),
                self.step
            )?,
        }
        writeln!(f, " ({} block)", self.block)?;
        writeln!(f, "  --> {}:{}", self.document.display(), self.step_line)?;
        writeln!(f, "  feature: {}", self.feature)?;
        writeln!(f, "  scenario: {} (line {})", self.scenario, self.scenario_line)?;
        write!(f, "  tags: [{}]", self.tags.join(", "))?;
        for candidate in &self.candidates {
            write!(f, "\n  - {candidate}")?;
        }
        Ok(())
    }
}

impl std::error::Error for MatchingError {}

/// Which binding two step definitions disagree on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// `import name from '...'`.
    Default,
    /// `import * as name from '...'`.
    Namespace,
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Default => "default",
            Self::Namespace => "namespace",
        })
    }
}

/// Two matched steps import the same module under different names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyConflictError {
    /// Scenario document being linked.
    pub document: PathBuf,
    /// Module specifier, relative to the document.
    pub module: String,
    /// The disputed binding.
    pub kind: BindingKind,
    /// Binding recorded first.
    pub existing: String,
    /// File that declared the first binding.
    pub existing_origin: PathBuf,
    /// Binding that disagrees.
    pub incoming: String,
    /// File that declared the disagreeing binding.
    pub incoming_origin: PathBuf,
}

impl fmt::Display for DependencyConflictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "conflicting {} imports for '{}' in {}: '{}' from {} and '{}' from {}",
            self.kind,
            self.module,
            self.document.display(),
            self.existing,
            self.existing_origin.display(),
            self.incoming,
            self.incoming_origin.display()
        )
    }
}

impl std::error::Error for DependencyConflictError {}

/// Errors that stop a feature from being linked.
#[derive(Debug, Error)]
pub enum LinkError {
    /// A scenario line has zero or several candidates.
    #[error(transparent)]
    Matching(#[from] Box<MatchingError>),
    /// Matched steps import a module under conflicting names.
    #[error(transparent)]
    DependencyConflict(#[from] Box<DependencyConflictError>),
}
