//! Locating implementation files and scenario documents under a root.
//!
//! Results are sorted so that step identities, and therefore the order of
//! candidates in diagnostics, do not depend on directory iteration order.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

/// Extensions accepted after `.stepdefinitions`.
const IMPLEMENTATION_EXTENSIONS: [&str; 4] = ["js", "jsx", "ts", "tsx"];
const IMPLEMENTATION_MARKER: &str = "stepdefinitions";

/// Return `true` for `<name>.stepdefinitions.{js,jsx,ts,tsx}`.
#[must_use]
pub fn is_implementation_file(path: &Path) -> bool {
    let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };
    if !IMPLEMENTATION_EXTENSIONS.contains(&extension) {
        return false;
    }
    path.file_stem()
        .map(Path::new)
        .and_then(Path::extension)
        .is_some_and(|marker| marker == IMPLEMENTATION_MARKER)
}

/// Return `true` for `.feature` documents.
#[must_use]
pub fn is_feature_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("feature"))
}

/// Collect implementation files below `root`.
///
/// # Errors
///
/// Returns the first [`walkdir::Error`] met while walking.
pub fn collect_implementation_files(root: &Path) -> Result<Vec<PathBuf>, walkdir::Error> {
    collect(root, is_implementation_file)
}

/// Collect scenario documents below `root`.
///
/// # Errors
///
/// Returns the first [`walkdir::Error`] met while walking.
pub fn collect_feature_files(root: &Path) -> Result<Vec<PathBuf>, walkdir::Error> {
    collect(root, is_feature_file)
}

fn is_dependency_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name() == "node_modules"
}

fn collect(root: &Path, accept: fn(&Path) -> bool) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut files = Vec::new();
    for next in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !is_dependency_dir(entry))
    {
        let entry = next?;
        if entry.file_type().is_file() && accept(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("calc.stepdefinitions.js", true)]
    #[case("calc.stepdefinitions.tsx", true)]
    #[case("calc.stepdefinitions.mjs", false)]
    #[case("calc.steps.js", false)]
    #[case("stepdefinitions.js", false)]
    #[case("calc.feature", false)]
    fn recognises_implementation_files(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_implementation_file(Path::new(name)), expected);
    }

    #[expect(clippy::expect_used, reason = "test setup uses explicit panics")]
    #[test]
    fn collects_sorted_files_and_skips_dependencies() {
        let dir = TempDir::new().expect("temp dir");
        let root = dir.path();
        for name in [
            "b/two.stepdefinitions.ts",
            "a/one.stepdefinitions.js",
            "a/one.feature",
            "a/one.steps.js",
            "node_modules/pkg/x.stepdefinitions.js",
        ] {
            let path = root.join(name);
            std::fs::create_dir_all(path.parent().expect("parent")).expect("create dir");
            std::fs::write(&path, "").expect("write file");
        }

        let implementations = collect_implementation_files(root).expect("walk");
        assert_eq!(
            implementations,
            [
                root.join("a/one.stepdefinitions.js"),
                root.join("b/two.stepdefinitions.ts")
            ]
        );
        let features = collect_feature_files(root).expect("walk");
        assert_eq!(features, [root.join("a/one.feature")]);
    }
}
