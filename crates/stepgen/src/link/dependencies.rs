//! Merging the imports of matched steps into one set per suite.
//!
//! Relative specifiers are written relative to the implementation file that
//! declared them; the suite lives beside the scenario document, so they are
//! re-expressed relative to the document's directory.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use super::error::{BindingKind, DependencyConflictError};
use crate::model::{Dependencies, ModuleImports, StepDefinition};

/// Accumulates the dependencies of one linked feature.
#[derive(Debug)]
pub(crate) struct DependencyMerger {
    document: PathBuf,
    document_dir: PathBuf,
    merged: Dependencies,
    origins: HashMap<(String, BindingKind), PathBuf>,
}

impl DependencyMerger {
    pub(crate) fn new(document: &Path) -> Self {
        Self {
            document: document.to_path_buf(),
            document_dir: parent_dir(document),
            merged: Dependencies::new(),
            origins: HashMap::new(),
        }
    }

    /// Fold one step's imports into the merged set.
    pub(crate) fn merge(&mut self, step: &StepDefinition) -> Result<(), Box<DependencyConflictError>> {
        let origin_dir = parent_dir(&step.origin);
        for (specifier, imports) in &step.dependencies {
            let module = relocate_specifier(specifier, &origin_dir, &self.document_dir);
            self.merge_module(module, imports, &step.origin)?;
        }
        Ok(())
    }

    fn merge_module(
        &mut self,
        module: String,
        imports: &ModuleImports,
        origin: &Path,
    ) -> Result<(), Box<DependencyConflictError>> {
        let entry = self.merged.entry(module.clone()).or_default();
        for (kind, incoming, slot) in [
            (BindingKind::Default, &imports.default, &mut entry.default),
            (BindingKind::Namespace, &imports.namespace, &mut entry.namespace),
        ] {
            let Some(incoming) = incoming else {
                continue;
            };
            match slot {
                Some(existing) if existing == incoming => {}
                Some(existing) => {
                    let existing_origin = self
                        .origins
                        .get(&(module.clone(), kind))
                        .cloned()
                        .unwrap_or_default();
                    return Err(Box::new(DependencyConflictError {
                        document: self.document.clone(),
                        module,
                        kind,
                        existing: existing.clone(),
                        existing_origin,
                        incoming: incoming.clone(),
                        incoming_origin: origin.to_path_buf(),
                    }));
                }
                None => {
                    *slot = Some(incoming.clone());
                    self.origins
                        .insert((module.clone(), kind), origin.to_path_buf());
                }
            }
        }
        entry.named.extend(imports.named.iter().cloned());
        Ok(())
    }

    pub(crate) fn finish(self) -> Dependencies {
        self.merged
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

fn is_relative_specifier(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Re-express a module specifier written in `origin_dir` so that it resolves
/// to the same file from `document_dir`. Bare and absolute specifiers are
/// returned unchanged.
pub(crate) fn relocate_specifier(specifier: &str, origin_dir: &Path, document_dir: &Path) -> String {
    if !is_relative_specifier(specifier) {
        return specifier.to_string();
    }
    let target = lexical_normalise(&anchored(&origin_dir.join(specifier)));
    let from = lexical_normalise(&anchored(document_dir));
    if target.is_absolute() != from.is_absolute() {
        return to_forward_slashes(&target);
    }

    let target_parts: Vec<Component<'_>> = target.components().collect();
    let from_parts: Vec<Component<'_>> = from.components().collect();
    let shared = target_parts
        .iter()
        .zip(&from_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<String> = from_parts
        .iter()
        .skip(shared)
        .map(|_| "..".to_string())
        .collect();
    segments.extend(
        target_parts
            .iter()
            .skip(shared)
            .map(|part| part.as_os_str().to_string_lossy().into_owned()),
    );

    if segments.is_empty() {
        return ".".to_string();
    }
    let joined = segments.join("/");
    if joined.starts_with("..") {
        joined
    } else {
        format!("./{joined}")
    }
}

/// Make `path` absolute against the working directory, so that roots given
/// one relative and one absolute still share a prefix. The path is kept as
/// is when the working directory is unavailable.
fn anchored(path: &Path) -> PathBuf {
    let path = if path.as_os_str().is_empty() {
        Path::new(".")
    } else {
        path
    };
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Resolve `.` and `..` without touching the filesystem.
fn lexical_normalise(path: &Path) -> PathBuf {
    let mut normalised = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    normalised.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    normalised.pop();
                } else if !normalised.has_root() {
                    normalised.push("..");
                }
            }
            other => normalised.push(other.as_os_str()),
        }
    }
    normalised
}

fn to_forward_slashes(path: &Path) -> String {
    path.components()
        .map(|part| part.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
        .replace("//", "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("react", "src/features/login", "src/features", "react")]
    #[case("@scope/pkg", "a", "b", "@scope/pkg")]
    #[case("/abs/module", "a", "b", "/abs/module")]
    #[case("./helpers", "src/features", "src/features", "./helpers")]
    #[case("./helpers", "./src/features", "src/features", "./helpers")]
    #[case("../../password-validator", "src/__features__/login", "src/__features__/login", "../../password-validator")]
    #[case("./helpers", "src/__features__/common", "src/__features__/login", "../common/helpers")]
    #[case("../shared/util", "src/steps/a", "src/docs", "../steps/shared/util")]
    #[case("./util", "src/steps", "src/steps/nested/deeper", "../../util")]
    #[case("..", "src/steps/a", "src/steps", ".")]
    fn relocates_specifiers(
        #[case] specifier: &str,
        #[case] origin_dir: &str,
        #[case] document_dir: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(
            relocate_specifier(specifier, Path::new(origin_dir), Path::new(document_dir)),
            expected
        );
    }

    #[rstest]
    #[case("steps", "features", "../steps/helper")]
    #[case("features/steps", "features", "./steps/helper")]
    #[case("other", "features/login", "../../other/helper")]
    fn relocates_across_relative_and_absolute_roots(
        #[case] origin_dir: &str,
        #[case] document_dir: &str,
        #[case] expected: &str,
    ) {
        let cwd = std::env::current_dir()
            .unwrap_or_else(|err| panic!("working directory should be readable: {err}"));
        let absolute_document = cwd.join(document_dir);
        assert_eq!(
            relocate_specifier("./helper", Path::new(origin_dir), &absolute_document),
            expected
        );
        let absolute_origin = cwd.join(origin_dir);
        assert_eq!(
            relocate_specifier("./helper", &absolute_origin, Path::new(document_dir)),
            expected
        );
    }

    #[test]
    fn document_without_directory_is_the_working_directory() {
        assert_eq!(
            relocate_specifier("./helper", Path::new("steps"), Path::new("")),
            "./steps/helper"
        );
    }

    #[rstest]
    #[case("a/./b/../c", "a/c")]
    #[case("../a/b", "../a/b")]
    #[case("/a/../../b", "/b")]
    fn normalises_lexically(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(lexical_normalise(Path::new(input)), PathBuf::from(expected));
    }
}
