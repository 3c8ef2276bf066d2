//! Rendering of linked features as jest-cucumber suites.
//!
//! Output is deterministic: the same linked feature always renders to the
//! same text, so unchanged suites produce no diff.

mod layout;
#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use stepgen_patterns::StepMatcher;

use self::layout::{CodeLine, closing_line, code_lines, opening_line, reindent};
use crate::config::GeneratorConfig;
use crate::link::{LinkedFeature, MatchedStep};
use crate::model::{CommonCode, HookName, ModuleImports, SourceKind};

const HEADER: &str = "// Generated by stepgen. Edit the step definitions instead.";

/// Names the generated suite refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOptions {
    /// Module providing `defineFeature` and `loadFeature`.
    pub runner_module: String,
    /// Identifier of the shared per-scenario state.
    pub context_identifier: String,
}

impl EmitOptions {
    /// Take the names from the run configuration.
    #[must_use]
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self {
            runner_module: config.runner_module.clone(),
            context_identifier: config.context_identifier.clone(),
        }
    }
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self::from_config(&GeneratorConfig::default())
    }
}

/// Path of the suite generated for `document`: `<stem>.steps.<ext>` in the
/// document's directory.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use stepgen::emit::suite_path;
/// use stepgen::model::SourceKind;
///
/// let kind = SourceKind { typed: true, markup: false };
/// let path = suite_path(Path::new("src/calc.feature"), kind);
/// assert_eq!(path, Path::new("src/calc.steps.ts"));
/// ```
#[must_use]
pub fn suite_path(document: &Path, kind: SourceKind) -> PathBuf {
    let stem = document
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    document.with_file_name(format!("{stem}.steps.{}", kind.extension()))
}

/// Render the suite text of a linked feature.
#[must_use]
pub fn render_suite(feature: &LinkedFeature<'_>, options: &EmitOptions) -> String {
    let mut out = SuiteText::default();
    out.line(HEADER);
    out.line(format!(
        "import {{ defineFeature, loadFeature }} from '{}';",
        escape_single_quoted(&options.runner_module)
    ));
    for (module, imports) in &feature.dependencies {
        for line in import_lines(module, imports) {
            out.line(line);
        }
    }
    out.blank();

    for code in &feature.root_common_code {
        write_common_code(&mut out, code, "");
    }

    out.line(format!(
        "const feature = loadFeature('{}');",
        escape_single_quoted(&forward_slashes(&feature.source_path))
    ));
    out.blank();
    out.line("defineFeature(feature, (defineScenario) => {");
    out.line(format!("\tlet {};", options.context_identifier));
    out.blank();

    for code in &feature.context_common_code {
        write_common_code(&mut out, code, "\t");
    }
    write_hooks(&mut out, feature, options);
    for step in &feature.matched_steps {
        write_step(&mut out, step);
    }
    for scenario in &feature.scenarios {
        out.line(format!(
            "\tdefineScenario{}('{}', ({{ given, when, then }}) => {{",
            scenario.execution_mode.modifier(),
            escape_single_quoted(&scenario.title)
        ));
        for call in &scenario.invocations {
            out.line(format!("\t\t{}({});", call.function_name, call.block));
        }
        out.line("\t});");
        out.blank();
    }
    out.line("});");
    out.finish()
}

#[derive(Default)]
struct SuiteText {
    lines: Vec<String>,
}

impl SuiteText {
    fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    fn blank(&mut self) {
        self.lines.push(String::new());
    }

    fn finish(self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

/// Import declarations for one module, in the order a reader expects.
fn import_lines(module: &str, imports: &ModuleImports) -> Vec<String> {
    let from = escape_single_quoted(module);
    if imports.is_side_effect_only() {
        return vec![format!("import '{from}';")];
    }
    let named = (!imports.named.is_empty()).then(|| {
        let names: Vec<&str> = imports.named.iter().map(String::as_str).collect();
        format!("{{ {} }}", names.join(", "))
    });

    let mut lines = Vec::new();
    let mut head: Vec<String> = imports.default.iter().cloned().collect();
    if let Some(namespace) = &imports.namespace {
        head.push(format!("* as {namespace}"));
        lines.push(format!("import {} from '{from}';", head.join(", ")));
        if let Some(named) = named {
            lines.push(format!("import {named} from '{from}';"));
        }
        return lines;
    }
    head.extend(named);
    lines.push(format!("import {} from '{from}';", head.join(", ")));
    lines
}

fn write_common_code(out: &mut SuiteText, code: &CommonCode, indent: &str) {
    let origin = forward_slashes(&code.origin);
    out.line(format!("{indent}// Common code from {origin}"));
    for line in reindent(&code_lines(&code.text), false, indent) {
        out.line(line);
    }
    out.line(format!("{indent}// End of common code from {origin}"));
    out.blank();
}

fn write_hooks(out: &mut SuiteText, feature: &LinkedFeature<'_>, options: &EmitOptions) {
    for name in HookName::ALL {
        let mut statements: Vec<String> = Vec::new();
        if name == HookName::BeforeEach {
            statements.push(format!("{} = {{}};", options.context_identifier));
        }
        statements.extend(
            feature
                .hooks
                .iter()
                .filter(|hook| hook.name == name)
                .flat_map(|hook| hook.body_lines.iter().cloned()),
        );
        if statements.is_empty() {
            continue;
        }
        out.line(format!("\t{name}(() => {{"));
        for statement in &statements {
            let lines = code_lines(statement);
            let Some((first, rest)) = lines.split_first() else {
                continue;
            };
            out.line(format!("\t\t{}", opening_line(first, starts_open(rest))));
            for line in reindent(rest, false, "\t\t") {
                out.line(line);
            }
        }
        out.line("\t});");
        out.blank();
    }
}

fn write_step(out: &mut SuiteText, step: &MatchedStep<'_>) {
    let matcher = render_matcher(&step.definition.matcher);
    out.line(format!("\tfunction {}(registrar) {{", step.function_name));
    let lines = code_lines(step.definition.body.trim());
    match lines.as_slice() {
        [] => out.line(format!("\t\tregistrar({matcher});")),
        [only] => out.line(format!("\t\tregistrar({matcher}, {});", only.text.trim())),
        [first, middle @ .., last] => {
            let after_first = middle.first().unwrap_or(last);
            out.line(format!(
                "\t\tregistrar({matcher}, {}",
                opening_line(first, after_first.in_template)
            ));
            for line in reindent(middle, last.in_template, "\t\t\t") {
                out.line(line);
            }
            out.line(format!("{});", closing_line(last, "\t\t")));
        }
    }
    out.line("\t}");
    out.blank();
}

fn starts_open(lines: &[CodeLine<'_>]) -> bool {
    lines.first().is_some_and(|line| line.in_template)
}

/// Matcher as an ECMAScript expression: a single-quoted string or the
/// regular-expression literal as declared.
#[must_use]
pub fn render_matcher(matcher: &StepMatcher) -> String {
    match matcher {
        StepMatcher::Literal(literal) => format!("'{}'", escape_single_quoted(literal)),
        StepMatcher::Pattern(pattern) => format!("/{}/{}", pattern.source(), pattern.flags()),
    }
}

/// Escape text for a single-quoted ECMAScript string.
///
/// # Examples
///
/// ```
/// use stepgen::emit::escape_single_quoted;
///
/// assert_eq!(escape_single_quoted(r"it's a\b"), r"it\'s a\\b");
/// ```
#[must_use]
pub fn escape_single_quoted(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str(r"\\"),
            '\'' => escaped.push_str(r"\'"),
            '\n' => escaped.push_str(r"\n"),
            '\r' => escaped.push_str(r"\r"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
