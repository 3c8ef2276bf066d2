//! Shared helpers for unit and integration tests.
//!
//! [`Workspace`] lays out implementation files and scenario documents in a
//! temporary directory and builds a configuration rooted there.
//! [`RecordingWriter`] captures suites instead of writing them.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::GeneratorConfig;
use crate::pipeline::SuiteWriter;

/// Import line every implementation file in the fixtures starts with.
pub const SURFACE_IMPORT: &str = concat!(
    "import { defineStep, defineFileScopes, given, when, then, scenarioContext } ",
    "from '@charlesgilles/bdd-generator';\n",
);

/// A temporary project directory.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create an empty workspace.
    ///
    /// # Panics
    ///
    /// Panics when the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap_or_else(|err| panic!("create temp dir: {err}"));
        Self { dir }
    }

    /// Root of the workspace.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of `relative` inside the workspace.
    #[must_use]
    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write `contents` to `relative`, creating parent directories.
    ///
    /// # Panics
    ///
    /// Panics when the file cannot be written.
    pub fn file(&self, relative: &str, contents: &str) -> &Self {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .unwrap_or_else(|err| panic!("create {}: {err}", parent.display()));
        }
        std::fs::write(&path, contents)
            .unwrap_or_else(|err| panic!("write {}: {err}", path.display()));
        self
    }

    /// Write an implementation file whose body follows [`SURFACE_IMPORT`].
    pub fn steps(&self, relative: &str, body: &str) -> &Self {
        self.file(relative, &format!("{SURFACE_IMPORT}{body}"))
    }

    /// Read `relative` back, or `None` when it does not exist.
    #[must_use]
    pub fn read(&self, relative: &str) -> Option<String> {
        std::fs::read_to_string(self.path(relative)).ok()
    }

    /// Configuration reading both roots from the workspace and keeping the
    /// hash record inside it.
    #[must_use]
    pub fn config(&self) -> GeneratorConfig {
        let mut config = GeneratorConfig::default().with_root(self.root());
        config.hash_file = self.path("stepgen.hash.json");
        config
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Captures suites in memory. Paths listed in `fail_on` report an error.
#[derive(Debug, Default)]
pub struct RecordingWriter {
    /// Successful writes, in order.
    pub writes: Vec<(PathBuf, String)>,
    /// Paths whose write fails.
    pub fail_on: Vec<PathBuf>,
}

impl RecordingWriter {
    /// Text written to `path`, if any.
    #[must_use]
    pub fn contents(&self, path: &Path) -> Option<&str> {
        self.writes
            .iter()
            .rev()
            .find(|(written, _)| written == path)
            .map(|(_, text)| text.as_str())
    }
}

impl SuiteWriter for RecordingWriter {
    fn write_suite(&mut self, path: &Path, contents: &str) -> io::Result<()> {
        if self.fail_on.iter().any(|failing| failing == path) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
        }
        self.writes.push((path.to_path_buf(), contents.to_string()));
        Ok(())
    }
}
