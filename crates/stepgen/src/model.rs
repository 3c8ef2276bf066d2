//! Declarations extracted from implementation files.
//!
//! These values are created once during extraction and never mutated
//! afterwards; linking only reads them through the [`pool`](crate::pool).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use stepgen_patterns::{StepBlock, StepMatcher};

use crate::scope::Scope;

/// Lifecycle hooks a suite can register, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HookName {
    /// Runs once before the first scenario.
    BeforeAll,
    /// Runs before every scenario.
    BeforeEach,
    /// Runs after every scenario.
    AfterEach,
    /// Runs once after the last scenario.
    AfterAll,
}

impl HookName {
    /// All hooks in emission order.
    pub const ALL: [Self; 4] = [
        Self::BeforeAll,
        Self::BeforeEach,
        Self::AfterEach,
        Self::AfterAll,
    ];

    /// The function name used to register the hook.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeAll => "beforeAll",
            Self::BeforeEach => "beforeEach",
            Self::AfterEach => "afterEach",
            Self::AfterAll => "afterAll",
        }
    }

    /// Map a callee name onto a hook.
    #[must_use]
    pub fn from_callee(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|hook| hook.as_str() == name)
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Syntax flavour of a source file, derived from its extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceKind {
    /// Type annotations are allowed (`.ts`, `.tsx`).
    pub typed: bool,
    /// Markup expressions are allowed (`.jsx`, `.tsx`).
    pub markup: bool,
}

impl SourceKind {
    /// Classify a path by extension. Unknown extensions are plain scripts.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("ts" | "mts" | "cts") => Self {
                typed: true,
                markup: false,
            },
            Some("tsx") => Self {
                typed: true,
                markup: true,
            },
            Some("jsx") => Self {
                typed: false,
                markup: true,
            },
            _ => Self::default(),
        }
    }

    /// Combine two kinds so the result accepts the syntax of both.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            typed: self.typed || other.typed,
            markup: self.markup || other.markup,
        }
    }

    /// File extension of a generated suite of this kind.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match (self.typed, self.markup) {
            (false, false) => "js",
            (false, true) => "jsx",
            (true, false) => "ts",
            (true, true) => "tsx",
        }
    }
}

/// Bindings imported from one module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModuleImports {
    /// `import name from '...'`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// `import * as name from '...'`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// `import { a, b as c } from '...'`, stored as written.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub named: BTreeSet<String>,
}

impl ModuleImports {
    /// Return `true` when the import only runs the module for its effects.
    #[must_use]
    pub fn is_side_effect_only(&self) -> bool {
        self.default.is_none() && self.namespace.is_none() && self.named.is_empty()
    }
}

/// Import declarations keyed by module specifier.
pub type Dependencies = BTreeMap<String, ModuleImports>;

/// Whether common code needs the per-scenario state in scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCategory {
    /// Independent of scenario state; emitted at module level.
    Root,
    /// Mentions the scenario state; emitted inside the feature wrapper.
    ScenarioContext,
}

/// A step implementation declared with `defineStep`, `given`, `when` or
/// `then`.
#[derive(Debug, Clone)]
pub struct StepDefinition {
    /// Blocks the definition may be used in.
    pub blocks: BTreeSet<StepBlock>,
    /// How scenario lines are selected.
    pub matcher: StepMatcher,
    /// Source text of the implementation function.
    pub body: String,
    /// The step's own scopes followed by its file scopes.
    pub scopes: Vec<Scope>,
    /// Imports of the declaring file, minus the declarative surface.
    pub dependencies: Dependencies,
    /// Function name used in generated suites.
    pub generated_name: String,
    /// Declaring file.
    pub origin: PathBuf,
    /// One-based line of the declaration.
    pub line: usize,
    /// Syntax flavour of the declaring file.
    pub source_kind: SourceKind,
}

impl StepDefinition {
    /// Return `true` when the definition may be used in `block`.
    #[must_use]
    pub fn accepts(&self, block: StepBlock) -> bool {
        self.blocks.contains(&block)
    }
}

/// A lifecycle hook registration.
#[derive(Debug, Clone)]
pub struct Hook {
    /// Which lifecycle event the hook runs on.
    pub name: HookName,
    /// The declaring file's scopes.
    pub scopes: Vec<Scope>,
    /// Statements of the hook body, one entry per statement.
    pub body_lines: Vec<String>,
    /// Declaring file.
    pub origin: PathBuf,
}

/// Top-level code of an implementation file that is not a declaration.
#[derive(Debug, Clone)]
pub struct CommonCode {
    /// Declaring file.
    pub origin: PathBuf,
    /// The declaring file's scopes.
    pub scopes: Vec<Scope>,
    /// Statements joined by newlines.
    pub text: String,
    /// Where the code must be emitted.
    pub category: CodeCategory,
}
