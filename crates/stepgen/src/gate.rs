//! Change-hash gate.
//!
//! Each linked feature is reduced to six SHA-256 digests. A feature whose
//! digests equal the ones recorded by the previous run is not regenerated.
//! The record is loaded once before linking and saved once after all
//! features were processed; forced runs never save it.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::link::LinkedFeature;

/// Errors raised while reading or writing the hash record.
#[derive(Debug, Error)]
pub enum HashRecordError {
    /// The record exists but could not be read.
    #[error("failed to read hash record {path}: {source}")]
    Read {
        /// Record path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The record is not valid JSON of the expected shape.
    #[error("failed to parse hash record {path}: {source}")]
    Parse {
        /// Record path.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// The record could not be written.
    #[error("failed to write hash record {path}: {source}")]
    Write {
        /// Record path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// The six digests of one linked feature, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDigest {
    /// Root and scenario-state common code.
    pub common_code: String,
    /// Hook bodies.
    pub hooks: String,
    /// Generated names of the matched steps.
    pub step_names: String,
    /// Scenario titles.
    pub scenario_titles: String,
    /// Feature tags.
    pub tags: String,
    /// Merged dependencies, serialised.
    pub dependencies: String,
}

impl FeatureDigest {
    /// Fingerprint a linked feature.
    ///
    /// Step bodies are not part of the fingerprint; a step whose body
    /// changes while its name stays the same does not trigger regeneration.
    #[must_use]
    pub fn of(feature: &LinkedFeature<'_>) -> Self {
        let common = feature
            .root_common_code
            .iter()
            .chain(&feature.context_common_code)
            .map(|code| code.text.as_str());
        let hooks = feature
            .hooks
            .iter()
            .flat_map(|hook| {
                std::iter::once(hook.name.as_str()).chain(hook.body_lines.iter().map(String::as_str))
            });
        let names = feature
            .matched_steps
            .iter()
            .map(|step| step.function_name.as_str());
        let titles = feature.scenarios.iter().map(|scenario| scenario.title.as_str());
        let tags = feature.tags.iter().map(String::as_str);
        // BTreeMap serialisation is ordered; failure would need a non-string key.
        let dependencies = serde_json::to_string(&feature.dependencies).unwrap_or_default();

        Self {
            common_code: digest_parts(common),
            hooks: digest_parts(hooks),
            step_names: digest_parts(names),
            scenario_titles: digest_parts(titles),
            tags: digest_parts(tags),
            dependencies: digest_parts([dependencies.as_str()]),
        }
    }
}

fn digest_parts<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        update_with_len(&mut hasher, part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

fn update_with_len(hasher: &mut Sha256, bytes: &[u8]) {
    let len = bytes.len();
    hasher.update(format!("{len}:").as_bytes());
    hasher.update(bytes);
}

/// Digests of the previous run, keyed by feature title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashRecord {
    features: BTreeMap<String, FeatureDigest>,
}

impl HashRecord {
    /// Load the record. A missing file yields an empty record.
    ///
    /// # Errors
    ///
    /// Returns [`HashRecordError`] when the file exists but cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self, HashRecordError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no hash record, starting empty");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(HashRecordError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&text).map_err(|source| HashRecordError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overwrite the record at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`HashRecordError::Write`] when the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), HashRecordError> {
        let text = serde_json::to_string_pretty(self).map_err(|source| HashRecordError::Write {
            path: path.to_path_buf(),
            source: io::Error::other(source),
        })?;
        std::fs::write(path, text).map_err(|source| HashRecordError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Digest recorded for `title`.
    #[must_use]
    pub fn get(&self, title: &str) -> Option<&FeatureDigest> {
        self.features.get(title)
    }

    /// Record `digest` for `title`, replacing any previous one.
    pub fn insert(&mut self, title: String, digest: FeatureDigest) {
        self.features.insert(title, digest);
    }

    /// Number of recorded features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Return `true` when nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Decides per feature whether to regenerate, and collects the new digests.
#[derive(Debug)]
pub struct ChangeGate {
    record: HashRecord,
    path: PathBuf,
    force: bool,
}

impl ChangeGate {
    /// Load the record at `path`. When `force` is set every feature is
    /// regenerated and the record is never saved.
    ///
    /// # Errors
    ///
    /// Propagates [`HashRecord::load`] failures.
    pub fn open(path: &Path, force: bool) -> Result<Self, HashRecordError> {
        Ok(Self {
            record: HashRecord::load(path)?,
            path: path.to_path_buf(),
            force,
        })
    }

    /// Build a gate around an in-memory record.
    #[must_use]
    pub fn with_record(record: HashRecord, path: PathBuf, force: bool) -> Self {
        Self {
            record,
            path,
            force,
        }
    }

    /// Return `true` when `digest` equals the recorded one and the run is not
    /// forced.
    #[must_use]
    pub fn is_unchanged(&self, title: &str, digest: &FeatureDigest) -> bool {
        !self.force && self.record.get(title) == Some(digest)
    }

    /// Record the digest of a feature that was written.
    pub fn record(&mut self, title: &str, digest: FeatureDigest) {
        self.record.insert(title.to_string(), digest);
    }

    /// Save the record unless the run is forced. Returns whether it was
    /// written.
    ///
    /// # Errors
    ///
    /// Returns [`HashRecordError::Write`] when saving fails.
    pub fn persist(&self) -> Result<bool, HashRecordError> {
        if self.force {
            debug!("forced run, hash record left untouched");
            return Ok(false);
        }
        self.record.save(&self.path)?;
        Ok(true)
    }

    /// The record as it currently stands.
    #[must_use]
    pub fn record_state(&self) -> &HashRecord {
        &self.record
    }
}
