//! Scenario documents read with the `gherkin` parser.
//!
//! Background steps are folded into every scenario they apply to and
//! scenarios nested in rules are flattened, so the linker sees each scenario
//! as a self-contained list of lines.

use std::path::{Path, PathBuf};

use gherkin::GherkinEnv;
use stepgen_patterns::StepKeyword;
use thiserror::Error;

use crate::scope::normalise_tag;

/// Errors raised while reading a scenario document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The document could not be read.
    #[error("failed to read feature file {path}: {source}")]
    Read {
        /// Document path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid Gherkin.
    #[error("failed to parse feature file {path}: {source}")]
    Parse {
        /// Document path.
        path: PathBuf,
        /// Parser failure.
        #[source]
        source: gherkin::ParseError,
    },
}

/// One step line of a scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentStep {
    /// Keyword the line starts with.
    pub keyword: StepKeyword,
    /// Text after the keyword. Outline placeholders are kept.
    pub text: String,
    /// One-based line in the document.
    pub line: usize,
}

/// An `Examples:` table of a scenario outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamplesTable {
    /// Column names.
    pub header: Vec<String>,
    /// Data rows, each as long as the header.
    pub rows: Vec<Vec<String>>,
}

/// A scenario or scenario outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioDocument {
    /// Scenario title.
    pub title: String,
    /// One-based line of the scenario keyword.
    pub line: usize,
    /// Normalised tags of the scenario and its enclosing rule.
    pub tags: Vec<String>,
    /// Background steps followed by the scenario's own steps.
    pub steps: Vec<DocumentStep>,
    /// Examples tables; empty for plain scenarios.
    pub examples: Vec<ExamplesTable>,
}

impl ScenarioDocument {
    /// Return `true` when the scenario is an outline.
    #[must_use]
    pub fn is_outline(&self) -> bool {
        !self.examples.is_empty()
    }

    /// Every concrete text a step line takes across the examples rows.
    ///
    /// Plain scenarios and outlines without rows yield the text unchanged.
    #[must_use]
    pub fn expansions(&self, step: &DocumentStep) -> Vec<String> {
        let expanded: Vec<String> = self
            .examples
            .iter()
            .flat_map(|table| {
                table
                    .rows
                    .iter()
                    .map(|row| substitute(&step.text, &table.header, row))
            })
            .collect();
        if expanded.is_empty() {
            vec![step.text.clone()]
        } else {
            expanded
        }
    }

    /// Return `true` when the scenario carries `tag` (normalised).
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|own| own == tag)
    }
}

/// A parsed `.feature` document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureDocument {
    /// Document path as discovered.
    pub path: PathBuf,
    /// Feature title.
    pub title: String,
    /// Normalised feature tags.
    pub tags: Vec<String>,
    /// Scenarios in document order, rules flattened.
    pub scenarios: Vec<ScenarioDocument>,
}

impl FeatureDocument {
    /// Return `true` when the feature itself carries `tag` (normalised).
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|own| own == tag)
    }

    /// Feature tags followed by the scenario's tags.
    #[must_use]
    pub fn tags_for(&self, scenario: &ScenarioDocument) -> Vec<String> {
        let mut tags = self.tags.clone();
        for tag in &scenario.tags {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
        tags
    }
}

/// Read and parse a scenario document.
///
/// # Errors
///
/// Returns [`DocumentError`] when the file cannot be read or parsed.
pub fn read_document(path: &Path) -> Result<FeatureDocument, DocumentError> {
    let text = std::fs::read_to_string(path).map_err(|source| DocumentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(path, text)
}

/// Parse document text. `path` is recorded for diagnostics and output
/// placement.
///
/// # Errors
///
/// Returns [`DocumentError::Parse`] when the text is not valid Gherkin.
pub fn parse_document(path: &Path, mut text: String) -> Result<FeatureDocument, DocumentError> {
    normalise_trailing_newline(&mut text);
    let feature =
        gherkin::Feature::parse(&text, GherkinEnv::default()).map_err(|source| {
            DocumentError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;

    let background = feature
        .background
        .as_ref()
        .map(|background| convert_steps(&background.steps))
        .unwrap_or_default();

    let mut scenarios: Vec<ScenarioDocument> = feature
        .scenarios
        .iter()
        .map(|scenario| convert_scenario(scenario, &background, &[]))
        .collect();

    for rule in &feature.rules {
        let mut rule_background = background.clone();
        if let Some(own) = rule.background.as_ref() {
            rule_background.extend(convert_steps(&own.steps));
        }
        let rule_tags = normalise_tags(&rule.tags);
        scenarios.extend(
            rule.scenarios
                .iter()
                .map(|scenario| convert_scenario(scenario, &rule_background, &rule_tags)),
        );
    }

    Ok(FeatureDocument {
        path: path.to_path_buf(),
        title: feature.name.trim().to_string(),
        tags: normalise_tags(&feature.tags),
        scenarios,
    })
}

fn normalise_trailing_newline(text: &mut String) {
    if !text.ends_with('\n') {
        text.push('\n');
    }
}

fn normalise_tags(tags: &[String]) -> Vec<String> {
    let mut normalised: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags.iter().map(|tag| normalise_tag(tag)) {
        if !normalised.contains(&tag) {
            normalised.push(tag);
        }
    }
    normalised
}

fn convert_steps(steps: &[gherkin::Step]) -> Vec<DocumentStep> {
    steps
        .iter()
        .map(|step| DocumentStep {
            keyword: StepKeyword::from_gherkin(&step.keyword, step.ty),
            text: step.value.trim().to_string(),
            line: step.position.line,
        })
        .collect()
}

fn convert_scenario(
    scenario: &gherkin::Scenario,
    background: &[DocumentStep],
    inherited_tags: &[String],
) -> ScenarioDocument {
    let mut steps = background.to_vec();
    steps.extend(convert_steps(&scenario.steps));

    let mut tags = inherited_tags.to_vec();
    for tag in normalise_tags(&scenario.tags) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    let examples = scenario
        .examples
        .iter()
        .filter_map(|examples| examples.table.as_ref())
        .filter_map(|table| {
            let (header, rows) = table.rows.split_first()?;
            Some(ExamplesTable {
                header: header.clone(),
                rows: rows.to_vec(),
            })
        })
        .collect();

    ScenarioDocument {
        title: scenario.name.trim().to_string(),
        line: scenario.position.line,
        tags,
        steps,
        examples,
    }
}

fn substitute(text: &str, header: &[String], row: &[String]) -> String {
    header
        .iter()
        .zip(row)
        .fold(text.to_string(), |acc, (name, value)| {
            acc.replace(&format!("<{name}>"), value)
        })
}
