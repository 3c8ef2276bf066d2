//! One generation run, phase by phase.
//!
//! Extraction, document reading and linking complete for every input before
//! anything is written, so a fatal diagnostic never leaves a partial set of
//! regenerated suites behind.

use std::io;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, error, info, info_span};

use crate::config::GeneratorConfig;
use crate::discovery::{collect_feature_files, collect_implementation_files};
use crate::emit::{EmitOptions, render_suite, suite_path};
use crate::error::GeneratorError;
use crate::extract::{Surface, extract_file};
use crate::feature::{FeatureDocument, read_document};
use crate::gate::{ChangeGate, FeatureDigest};
use crate::link::{LinkedFeature, Linker};
use crate::pool::StepPool;

/// Destination of generated suites.
pub trait SuiteWriter {
    /// Write `contents` to `path`, replacing any previous suite.
    ///
    /// # Errors
    ///
    /// Returns the I/O error that prevented the write.
    fn write_suite(&mut self, path: &Path, contents: &str) -> io::Result<()>;
}

/// Writes suites to the filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSuiteWriter;

impl SuiteWriter for FsSuiteWriter {
    fn write_suite(&mut self, path: &Path, contents: &str) -> io::Result<()> {
        std::fs::write(path, contents)
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Implementation files extracted.
    pub implementation_files: usize,
    /// Step definitions in the pool.
    pub definitions: usize,
    /// Scenario documents linked.
    pub documents: usize,
    /// Documents left out by the generation tags.
    pub skipped_by_tag: usize,
    /// Suites written.
    pub written: usize,
    /// Suites left alone because nothing relevant changed.
    pub unchanged: usize,
    /// Suites whose write failed.
    pub failed_writes: usize,
}

/// Run the generator once.
///
/// # Errors
///
/// Returns [`GeneratorError`] on the first fatal diagnostic: a missing root,
/// an unreadable or malformed input, an unresolvable scenario line, a
/// dependency conflict or an unusable hash record. Failed suite writes are
/// logged and counted instead.
pub fn run(
    config: &GeneratorConfig,
    writer: &mut dyn SuiteWriter,
) -> Result<RunSummary, GeneratorError> {
    config.validate_roots()?;
    let mut summary = RunSummary::default();

    let pool = info_span!("extract").in_scope(|| extract_pool(config, &mut summary))?;
    let documents = info_span!("read").in_scope(|| read_documents(config, &mut summary))?;

    let started = Instant::now();
    let linker = Linker::new(&pool, config.execution_tags.clone());
    let linked = documents
        .iter()
        .map(|document| linker.link(document))
        .collect::<Result<Vec<_>, _>>()?;
    info!(
        features = linked.len(),
        elapsed_ms = elapsed_ms(started),
        "linked scenario documents"
    );

    let mut gate = ChangeGate::open(&config.hash_file, config.force)?;
    info_span!("write").in_scope(|| write_suites(config, &linked, &mut gate, writer, &mut summary));
    if gate.persist()? {
        debug!(path = %config.hash_file.display(), "hash record saved");
    }

    info!(
        written = summary.written,
        unchanged = summary.unchanged,
        failed = summary.failed_writes,
        "generation finished"
    );
    Ok(summary)
}

fn extract_pool(
    config: &GeneratorConfig,
    summary: &mut RunSummary,
) -> Result<StepPool, GeneratorError> {
    let started = Instant::now();
    let surface = Surface::from_config(config);
    let files = collect_implementation_files(&config.steps_root)?;
    let mut pool = StepPool::new();
    for path in &files {
        pool.add_file(extract_file(path, &surface)?);
    }
    summary.implementation_files = files.len();
    summary.definitions = pool.len();
    info!(
        root = %config.steps_root.display(),
        files = files.len(),
        definitions = pool.len(),
        elapsed_ms = elapsed_ms(started),
        "extracted step definitions"
    );
    Ok(pool)
}

fn read_documents(
    config: &GeneratorConfig,
    summary: &mut RunSummary,
) -> Result<Vec<FeatureDocument>, GeneratorError> {
    let started = Instant::now();
    let paths = collect_feature_files(&config.features_root)?;
    let mut documents = Vec::with_capacity(paths.len());
    for path in &paths {
        documents.push(read_document(path)?);
    }
    let read = documents.len();
    let (documents, skipped) = select_for_generation(config, documents);
    summary.documents = documents.len();
    summary.skipped_by_tag = skipped;
    info!(
        root = %config.features_root.display(),
        read,
        skipped,
        selected = documents.len(),
        elapsed_ms = elapsed_ms(started),
        "read scenario documents"
    );
    Ok(documents)
}

/// Apply the generation tags to the feature tags of each document.
///
/// Returns the selected documents and the number left out by the ignore tag.
#[must_use]
pub fn select_for_generation(
    config: &GeneratorConfig,
    documents: Vec<FeatureDocument>,
) -> (Vec<FeatureDocument>, usize) {
    let tags = &config.generation_tags;
    let total = documents.len();
    let kept: Vec<FeatureDocument> = documents
        .into_iter()
        .filter(|document| !document.has_tag(&tags.ignore))
        .collect();
    let skipped = total - kept.len();
    if skipped > 0 {
        info!(tag = %tags.ignore, skipped, "documents ignored for generation");
    }

    if kept.iter().any(|document| document.has_tag(&tags.only)) {
        let only: Vec<FeatureDocument> = kept
            .into_iter()
            .filter(|document| document.has_tag(&tags.only))
            .collect();
        info!(tag = %tags.only, documents = only.len(), "generating tagged documents only");
        return (only, skipped);
    }
    (kept, skipped)
}

fn write_suites(
    config: &GeneratorConfig,
    linked: &[LinkedFeature<'_>],
    gate: &mut ChangeGate,
    writer: &mut dyn SuiteWriter,
    summary: &mut RunSummary,
) {
    let started = Instant::now();
    let options = EmitOptions::from_config(config);
    for feature in linked {
        let digest = FeatureDigest::of(feature);
        if gate.is_unchanged(&feature.title, &digest) {
            debug!(feature = %feature.title, "unchanged, suite not regenerated");
            summary.unchanged += 1;
            continue;
        }
        let path = suite_path(&feature.source_path, feature.target_kind);
        let text = render_suite(feature, &options);
        match writer.write_suite(&path, &text) {
            Ok(()) => {
                debug!(feature = %feature.title, path = %path.display(), "suite written");
                summary.written += 1;
                gate.record(&feature.title, digest);
            }
            Err(err) => {
                error!(
                    feature = %feature.title,
                    path = %path.display(),
                    error = %err,
                    "failed to write suite"
                );
                summary.failed_writes += 1;
            }
        }
    }
    info!(
        written = summary.written,
        unchanged = summary.unchanged,
        elapsed_ms = elapsed_ms(started),
        "wrote suites"
    );
}

fn elapsed_ms(started: Instant) -> u128 {
    started.elapsed().as_millis()
}
