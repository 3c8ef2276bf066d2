//! Resolution of scenario documents against the step pool.
//!
//! For every scenario the linker narrows the pool to the definitions whose
//! scopes match the feature title, scenario title and tags, then resolves
//! each line by block and full-span match. Exactly one definition must
//! survive; anything else stops the run with a [`MatchingError`].

mod dependencies;
mod error;
mod names;


use std::collections::HashMap;
use std::path::PathBuf;

use stepgen_patterns::StepBlock;
use tracing::{debug, warn};

pub use error::{
    BindingKind, CandidateSummary, DependencyConflictError, LinkError, MatchingError,
    MatchingProblem,
};

use crate::config::TagPair;
use crate::feature::{DocumentStep, FeatureDocument, ScenarioDocument};
use crate::model::{CommonCode, Dependencies, Hook, SourceKind, StepDefinition};
use crate::pool::{StepId, StepPool};
use crate::scope::{Scope, ScopeTarget, matches_any};
use dependencies::DependencyMerger;

/// Per-scenario execution directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Run as usual.
    Normal,
    /// Registered but not run.
    Skip,
    /// Run exclusively.
    Only,
}

impl ExecutionMode {
    /// Suffix appended to the scenario registrar.
    #[must_use]
    pub const fn modifier(&self) -> &'static str {
        match self {
            Self::Normal => "",
            Self::Skip => ".skip",
            Self::Only => ".only",
        }
    }
}

/// One resolved line: which registrar to use and which function to call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepInvocation {
    /// Block the line resolved to.
    pub block: StepBlock,
    /// Unique function name of the matched step within the suite.
    pub function_name: String,
}

/// A scenario whose lines all resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedScenario {
    /// Scenario title.
    pub title: String,
    /// Execution directive from the scenario's tags.
    pub execution_mode: ExecutionMode,
    /// Resolved lines in document order.
    pub invocations: Vec<StepInvocation>,
}

/// A step definition used by a feature.
#[derive(Debug, Clone)]
pub struct MatchedStep<'p> {
    /// Identity in the pool.
    pub id: StepId,
    /// Unique function name within the suite.
    pub function_name: String,
    /// The definition itself.
    pub definition: &'p StepDefinition,
}

/// Everything needed to emit one suite.
#[derive(Debug, Clone)]
pub struct LinkedFeature<'p> {
    /// Feature title.
    pub title: String,
    /// Scenario document path.
    pub source_path: PathBuf,
    /// Feature tags.
    pub tags: Vec<String>,
    /// Imports needed by the matched steps, relative to the document.
    pub dependencies: Dependencies,
    /// Hooks whose scopes match the feature.
    pub hooks: Vec<&'p Hook>,
    /// Root common code whose scopes match the feature.
    pub root_common_code: Vec<&'p CommonCode>,
    /// Scenario-state common code whose scopes match the feature.
    pub context_common_code: Vec<&'p CommonCode>,
    /// Matched steps, each identity once, in first-use order.
    pub matched_steps: Vec<MatchedStep<'p>>,
    /// Scenarios in document order.
    pub scenarios: Vec<LinkedScenario>,
    /// Syntax flavour of the generated suite.
    pub target_kind: SourceKind,
}

/// Links scenario documents against a pool.
#[derive(Debug, Clone)]
pub struct Linker<'p> {
    pool: &'p StepPool,
    execution_tags: TagPair,
}

impl<'p> Linker<'p> {
    /// Create a linker. Tags must be normalised.
    #[must_use]
    pub fn new(pool: &'p StepPool, execution_tags: TagPair) -> Self {
        Self {
            pool,
            execution_tags,
        }
    }

    /// Resolve every scenario of `document`.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Matching`] when a line has zero or several
    /// candidates and [`LinkError::DependencyConflict`] when matched steps
    /// import one module under different names.
    pub fn link(&self, document: &FeatureDocument) -> Result<LinkedFeature<'p>, LinkError> {
        let mut matched: Vec<(StepId, &'p StepDefinition)> = Vec::new();
        let mut positions: HashMap<StepId, usize> = HashMap::new();
        let mut merger = DependencyMerger::new(&document.path);
        let mut resolved_scenarios = Vec::with_capacity(document.scenarios.len());

        for scenario in &document.scenarios {
            let tags = document.tags_for(scenario);
            let target = ScopeTarget {
                feature: &document.title,
                scenario: Some(&scenario.title),
                tags: &tags,
            };
            let candidates: Vec<(StepId, &'p StepDefinition)> = self
                .pool
                .steps()
                .filter(|(_, step)| matches_any(&step.scopes, &target))
                .collect();

            let mut current = StepBlock::Given;
            let mut lines = Vec::with_capacity(scenario.steps.len());
            for step in &scenario.steps {
                let block = step.keyword.resolve(&mut current);
                let line = LineContext {
                    document,
                    scenario,
                    step,
                    block,
                    tags: &tags,
                };
                let (id, definition) = line.resolve(&candidates)?;
                if !positions.contains_key(&id) {
                    positions.insert(id, matched.len());
                    matched.push((id, definition));
                    merger.merge(definition)?;
                }
                lines.push((block, id));
            }
            resolved_scenarios.push((scenario, lines));
        }

        let function_names = names::disambiguate(
            matched
                .iter()
                .map(|(_, definition)| definition.generated_name.as_str()),
        );
        let name_of: HashMap<StepId, &str> = matched
            .iter()
            .zip(&function_names)
            .map(|((id, _), name)| (*id, name.as_str()))
            .collect();

        let scenarios = resolved_scenarios
            .into_iter()
            .map(|(scenario, lines)| LinkedScenario {
                title: scenario.title.clone(),
                execution_mode: self.execution_mode(scenario),
                invocations: lines
                    .into_iter()
                    .map(|(block, id)| StepInvocation {
                        block,
                        function_name: name_of.get(&id).copied().unwrap_or_default().to_string(),
                    })
                    .collect(),
            })
            .collect();

        let target_kind = matched
            .iter()
            .fold(SourceKind::default(), |kind, (_, definition)| {
                kind.union(definition.source_kind)
            });
        let matched_steps = matched
            .into_iter()
            .zip(function_names)
            .map(|((id, definition), function_name)| MatchedStep {
                id,
                function_name,
                definition,
            })
            .collect::<Vec<_>>();

        let feature_target = ScopeTarget {
            feature: &document.title,
            scenario: None,
            tags: &document.tags,
        };
        let applies = |scopes: &[Scope]| matches_any(scopes, &feature_target);

        let linked = LinkedFeature {
            title: document.title.clone(),
            source_path: document.path.clone(),
            tags: document.tags.clone(),
            dependencies: merger.finish(),
            hooks: self
                .pool
                .hooks()
                .iter()
                .filter(|hook| applies(&hook.scopes))
                .collect(),
            root_common_code: self
                .pool
                .root_common_code()
                .iter()
                .filter(|code| applies(&code.scopes))
                .collect(),
            context_common_code: self
                .pool
                .context_common_code()
                .iter()
                .filter(|code| applies(&code.scopes))
                .collect(),
            matched_steps,
            scenarios,
            target_kind,
        };
        debug!(
            feature = %linked.title,
            steps = linked.matched_steps.len(),
            scenarios = linked.scenarios.len(),
            hooks = linked.hooks.len(),
            "linked feature"
        );
        Ok(linked)
    }

    /// Execution directive from the scenario's own tags. The ignore tag wins
    /// when both are present.
    #[must_use]
    pub fn execution_mode(&self, scenario: &ScenarioDocument) -> ExecutionMode {
        let skip = scenario.has_tag(&self.execution_tags.ignore);
        let only = scenario.has_tag(&self.execution_tags.only);
        if skip && only {
            warn!(
                scenario = %scenario.title,
                ignore = %self.execution_tags.ignore,
                only = %self.execution_tags.only,
                "scenario carries both execution tags, skipping it"
            );
        }
        if skip {
            ExecutionMode::Skip
        } else if only {
            ExecutionMode::Only
        } else {
            ExecutionMode::Normal
        }
    }
}

/// One scenario line being resolved, with the context its diagnostics need.
struct LineContext<'a> {
    document: &'a FeatureDocument,
    scenario: &'a ScenarioDocument,
    step: &'a DocumentStep,
    block: StepBlock,
    tags: &'a [String],
}

impl LineContext<'_> {
    fn resolve<'p>(
        &self,
        candidates: &[(StepId, &'p StepDefinition)],
    ) -> Result<(StepId, &'p StepDefinition), Box<MatchingError>> {
        let mut resolved: Option<(StepId, &'p StepDefinition)> = None;
        for text in self.scenario.expansions(self.step) {
            let survivors: Vec<(StepId, &'p StepDefinition)> = candidates
                .iter()
                .filter(|(_, step)| step.accepts(self.block) && step.matcher.is_full_match(&text))
                .copied()
                .collect();
            let single = match survivors.as_slice() {
                [single] => *single,
                [] => return Err(self.error(MatchingProblem::NoCandidate, text, &survivors)),
                _ => return Err(self.error(MatchingProblem::Ambiguous, text, &survivors)),
            };
            match resolved {
                Some((id, _)) if id == single.0 => {}
                Some(previous) => {
                    return Err(self.error(
                        MatchingProblem::InconsistentOutline,
                        self.step.text.clone(),
                        &[previous, single],
                    ));
                }
                None => resolved = Some(single),
            }
        }
        resolved.ok_or_else(|| self.error(MatchingProblem::NoCandidate, self.step.text.clone(), &[]))
    }

    fn error(
        &self,
        problem: MatchingProblem,
        text: String,
        survivors: &[(StepId, &StepDefinition)],
    ) -> Box<MatchingError> {
        Box::new(MatchingError {
            problem,
            document: self.document.path.clone(),
            feature: self.document.title.clone(),
            scenario: self.scenario.title.clone(),
            scenario_line: self.scenario.line,
            keyword: self.step.keyword,
            block: self.block,
            step: text,
            step_line: self.step.line,
            tags: self.tags.to_vec(),
            candidates: survivors
                .iter()
                .map(|(_, step)| CandidateSummary::from(*step))
                .collect(),
        })
    }
}
