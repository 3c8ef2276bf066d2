//! Walk over the top-level statements of one implementation file.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use stepgen_patterns::{StepBlock, StepMatcher, generated_name};
use tree_sitter::Node;

use super::error::{DeclarationError, DeclarationErrorKind};
use super::syntax::{
    first_error, is_function_literal, location, mentions_identifier, significant_children,
    simple_call, string_value, text,
};
use super::{ExtractedFile, Surface};
use crate::model::{
    CodeCategory, CommonCode, Dependencies, Hook, HookName, SourceKind, StepDefinition,
};
use crate::scope::Scope;

type DeclResult<T> = Result<T, Box<DeclarationError>>;

const FILE_SCOPES: &str = "defineFileScopes";
const DEFINE_STEP: &str = "defineStep";
const SNIPPET_CHARS: usize = 40;

struct PendingStep {
    blocks: BTreeSet<StepBlock>,
    matcher: StepMatcher,
    body: String,
    scopes: Vec<Scope>,
    line: usize,
}

pub(super) struct FileWalker<'a> {
    path: &'a Path,
    source: &'a str,
    surface: &'a Surface,
    imports: Dependencies,
    file_scopes: Option<Vec<Scope>>,
    callbacks: HashMap<String, String>,
    steps: Vec<PendingStep>,
    hooks: Vec<(HookName, Vec<String>)>,
    root_code: Vec<&'a str>,
    context_code: Vec<&'a str>,
}

impl<'a> FileWalker<'a> {
    pub(super) fn new(path: &'a Path, source: &'a str, surface: &'a Surface) -> Self {
        Self {
            path,
            source,
            surface,
            imports: Dependencies::new(),
            file_scopes: None,
            callbacks: HashMap::new(),
            steps: Vec::new(),
            hooks: Vec::new(),
            root_code: Vec::new(),
            context_code: Vec::new(),
        }
    }

    pub(super) fn walk(mut self, root: Node<'_>) -> DeclResult<ExtractedFile> {
        if let Some(node) = first_error(root) {
            let snippet = text(node, self.source).chars().take(SNIPPET_CHARS).collect();
            return Err(self.error(node, DeclarationErrorKind::Syntax { snippet }));
        }

        let statements = significant_children(root);
        // Imports are hoisted, so bindings are known before any call.
        for statement in &statements {
            if statement.kind() == "import_statement" {
                self.record_import(*statement)?;
            }
        }
        for statement in statements {
            self.visit(statement)?;
        }
        self.finish()
    }

    fn error(&self, node: Node<'_>, kind: DeclarationErrorKind) -> Box<DeclarationError> {
        let (line, column) = location(node);
        Box::new(DeclarationError {
            path: self.path.to_path_buf(),
            line,
            column,
            kind,
        })
    }

    fn record_import(&mut self, statement: Node<'_>) -> DeclResult<()> {
        let source = self.source;
        let Some(module) = statement
            .child_by_field_name("source")
            .and_then(|node| string_value(node, source))
        else {
            return Ok(());
        };
        let type_only = is_type_only_import(statement);
        for clause in significant_children(statement) {
            if clause.kind() != "import_clause" {
                continue;
            }
            for binding in significant_children(clause) {
                match binding.kind() {
                    "identifier" => {
                        self.bind(binding, &module, "default", text(binding, source))?;
                    }
                    "namespace_import" => {
                        let name = significant_children(binding)
                            .into_iter()
                            .find(|node| node.kind() == "identifier");
                        if let Some(name) = name {
                            self.bind(binding, &module, "namespace", text(name, source))?;
                        }
                    }
                    "named_imports" => {
                        let entry = self.imports.entry(module.clone()).or_default();
                        for specifier in significant_children(binding) {
                            if specifier.kind() != "import_specifier" {
                                continue;
                            }
                            let written = text(specifier, source)
                                .split_whitespace()
                                .collect::<Vec<_>>()
                                .join(" ");
                            if type_only && !written.starts_with("type ") {
                                entry.named.insert(format!("type {written}"));
                            } else {
                                entry.named.insert(written);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        self.imports.entry(module).or_default();
        Ok(())
    }

    /// Record a default or namespace binding. A module keeps one name per
    /// kind, so a second, different name is rejected.
    fn bind(
        &mut self,
        node: Node<'_>,
        module: &str,
        kind: &'static str,
        name: &str,
    ) -> DeclResult<()> {
        let entry = self.imports.entry(module.to_string()).or_default();
        let slot = if kind == "namespace" {
            &mut entry.namespace
        } else {
            &mut entry.default
        };
        let Some(existing) = slot.as_ref() else {
            *slot = Some(name.to_string());
            return Ok(());
        };
        if existing == name {
            return Ok(());
        }
        let existing = existing.clone();
        Err(self.error(
            node,
            DeclarationErrorKind::ConflictingImport {
                module: module.to_string(),
                kind,
                existing,
                incoming: name.to_string(),
            },
        ))
    }

    fn visit(&mut self, statement: Node<'_>) -> DeclResult<()> {
        match statement.kind() {
            "import_statement" if statement.child_by_field_name("source").is_some() => {}
            "hash_bang_line" | "empty_statement" => {}
            "expression_statement" => return self.visit_expression(statement),
            "lexical_declaration" | "variable_declaration" => {
                self.register_variable_callbacks(statement);
                self.push_common(statement);
            }
            "function_declaration" => {
                self.register_function_callback(statement);
                self.push_common(statement);
            }
            _ => self.push_common(statement),
        }
        Ok(())
    }

    fn visit_expression(&mut self, statement: Node<'_>) -> DeclResult<()> {
        let parsed = statement.named_child(0).and_then(|expression| {
            simple_call(expression, self.source).map(|(callee, args)| (expression, callee, args))
        });
        let Some((call, callee, args)) = parsed else {
            self.push_common(statement);
            return Ok(());
        };

        if callee == FILE_SCOPES {
            self.require_import(call, &callee)?;
            return self.define_file_scopes(call, &args);
        }
        if callee == DEFINE_STEP {
            self.require_import(call, &callee)?;
            return self.define_step(call, &callee, &args, None);
        }
        if let Ok(block) = callee.parse::<StepBlock>() {
            self.require_import(call, &callee)?;
            return self.define_step(call, &callee, &args, Some(block));
        }
        if let Some(hook) = HookName::from_callee(&callee) {
            return self.define_hook(call, hook, &args);
        }
        self.push_common(statement);
        Ok(())
    }

    fn require_import(&self, call: Node<'_>, callee: &str) -> DeclResult<()> {
        let imported = self
            .imports
            .get(&self.surface.module)
            .is_some_and(|module| module.named.contains(callee));
        if imported {
            return Ok(());
        }
        Err(self.error(
            call,
            DeclarationErrorKind::MissingImport {
                callee: callee.to_string(),
                module: self.surface.module.clone(),
            },
        ))
    }

    fn define_file_scopes(&mut self, call: Node<'_>, args: &[Node<'_>]) -> DeclResult<()> {
        if self.file_scopes.is_some() {
            return Err(self.error(call, DeclarationErrorKind::DuplicateFileScopes));
        }
        let [argument] = args else {
            return Err(self.error(call, DeclarationErrorKind::FileScopesArguments));
        };
        if argument.kind() != "array" {
            return Err(self.error(*argument, DeclarationErrorKind::FileScopesArguments));
        }
        self.file_scopes = Some(self.scopes(*argument)?);
        Ok(())
    }

    fn define_step(
        &mut self,
        call: Node<'_>,
        callee: &str,
        args: &[Node<'_>],
        implicit: Option<StepBlock>,
    ) -> DeclResult<()> {
        let (expected, accepted) = if implicit.is_some() {
            ("2 or 3", 2..=3)
        } else {
            ("3 or 4", 3..=4)
        };
        let count_error = || {
            self.error(
                call,
                DeclarationErrorKind::StepArgumentCount {
                    callee: callee.to_string(),
                    expected,
                    found: args.len(),
                },
            )
        };
        if !accepted.contains(&args.len()) {
            return Err(count_error());
        }

        let (blocks, rest) = match (implicit, args.split_first()) {
            (Some(block), _) => (BTreeSet::from([block]), args),
            (None, Some((first, rest))) => (self.blocks(*first)?, rest),
            (None, None) => return Err(count_error()),
        };
        let [matcher, body, scopes @ ..] = rest else {
            return Err(count_error());
        };

        let matcher = self.matcher(*matcher)?;
        let body = self.body(*body)?;
        let scopes = match scopes.first() {
            Some(node) => self.scopes(*node)?,
            None => Vec::new(),
        };
        self.steps.push(PendingStep {
            blocks,
            matcher,
            body,
            scopes,
            line: location(call).0,
        });
        Ok(())
    }

    fn blocks(&self, node: Node<'_>) -> DeclResult<BTreeSet<StepBlock>> {
        if node.kind() != "array" {
            return Err(self.error(node, DeclarationErrorKind::InvalidBlocks));
        }
        let mut blocks = BTreeSet::new();
        for element in significant_children(node) {
            let block = string_value(element, self.source)
                .and_then(|value| value.parse::<StepBlock>().ok())
                .ok_or_else(|| self.error(element, DeclarationErrorKind::InvalidBlocks))?;
            blocks.insert(block);
        }
        if blocks.is_empty() {
            return Err(self.error(node, DeclarationErrorKind::InvalidBlocks));
        }
        Ok(blocks)
    }

    fn matcher(&self, node: Node<'_>) -> DeclResult<StepMatcher> {
        match node.kind() {
            "string" => string_value(node, self.source)
                .map(StepMatcher::Literal)
                .ok_or_else(|| self.error(node, DeclarationErrorKind::InvalidMatcher)),
            "regex" => {
                let field = |name: &str| {
                    node.child_by_field_name(name)
                        .map_or("", |child| text(child, self.source))
                };
                StepMatcher::from_regex_literal(field("pattern"), field("flags"))
                    .map_err(|err| self.error(node, DeclarationErrorKind::InvalidPattern(err)))
            }
            _ => Err(self.error(node, DeclarationErrorKind::InvalidMatcher)),
        }
    }

    fn body(&self, node: Node<'_>) -> DeclResult<String> {
        if is_function_literal(node) {
            return Ok(text(node, self.source).to_string());
        }
        if node.kind() != "identifier" {
            return Err(self.error(node, DeclarationErrorKind::InvalidBody));
        }
        let name = text(node, self.source);
        self.callbacks.get(name).cloned().ok_or_else(|| {
            self.error(
                node,
                DeclarationErrorKind::UnknownCallback {
                    name: name.to_string(),
                },
            )
        })
    }

    fn scopes(&self, node: Node<'_>) -> DeclResult<Vec<Scope>> {
        if node.kind() != "array" {
            return Err(self.error(node, DeclarationErrorKind::ScopesNotArray));
        }
        significant_children(node)
            .into_iter()
            .map(|element| self.scope(element))
            .collect()
    }

    fn scope(&self, node: Node<'_>) -> DeclResult<Scope> {
        if node.kind() != "object" {
            return Err(self.error(node, DeclarationErrorKind::ScopeNotObject));
        }
        let mut scope = Scope::default();
        for property in significant_children(node) {
            let (key_node, value_node) = match property.kind() {
                "pair" => (
                    property.child_by_field_name("key"),
                    property.child_by_field_name("value"),
                ),
                "shorthand_property_identifier" => (Some(property), None),
                _ => return Err(self.error(property, DeclarationErrorKind::ScopeNotObject)),
            };
            let Some(key_node) = key_node else {
                return Err(self.error(property, DeclarationErrorKind::ScopeNotObject));
            };
            let key = match key_node.kind() {
                "property_identifier" | "shorthand_property_identifier" => {
                    text(key_node, self.source).to_string()
                }
                "string" => string_value(key_node, self.source).unwrap_or_default(),
                _ => return Err(self.error(key_node, DeclarationErrorKind::ScopeNotObject)),
            };
            let slot = match key.as_str() {
                "feature" => &mut scope.feature,
                "scenario" => &mut scope.scenario,
                "tag" => &mut scope.tag,
                _ => {
                    return Err(self.error(key_node, DeclarationErrorKind::InvalidScope { key: key.clone() }));
                }
            };
            let value = value_node
                .and_then(|value| string_value(value, self.source))
                .ok_or_else(|| {
                    self.error(
                        value_node.unwrap_or(key_node),
                        DeclarationErrorKind::ScopeValue { key: key.clone() },
                    )
                })?;
            *slot = Some(value);
        }
        Ok(scope)
    }

    fn define_hook(&mut self, call: Node<'_>, hook: HookName, args: &[Node<'_>]) -> DeclResult<()> {
        let [argument] = args else {
            return Err(self.error(
                call,
                DeclarationErrorKind::HookArgumentCount {
                    hook,
                    found: args.len(),
                },
            ));
        };
        let body = Some(*argument)
            .filter(|node| is_function_literal(*node))
            .and_then(|node| node.child_by_field_name("body"))
            .ok_or_else(|| self.error(*argument, DeclarationErrorKind::HookBody { hook }))?;

        let lines = if body.kind() == "statement_block" {
            significant_children(body)
                .into_iter()
                .map(|statement| text(statement, self.source).to_string())
                .collect()
        } else {
            vec![text(body, self.source).to_string()]
        };
        self.hooks.push((hook, lines));
        Ok(())
    }

    fn register_variable_callbacks(&mut self, declaration: Node<'_>) {
        for declarator in significant_children(declaration) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let name = declarator.child_by_field_name("name");
            let value = declarator.child_by_field_name("value");
            if let (Some(name), Some(value)) = (name, value) {
                if name.kind() == "identifier" && is_function_literal(value) {
                    self.callbacks.insert(
                        text(name, self.source).to_string(),
                        text(value, self.source).to_string(),
                    );
                }
            }
        }
    }

    fn register_function_callback(&mut self, declaration: Node<'_>) {
        if let Some(name) = declaration.child_by_field_name("name") {
            self.callbacks.insert(
                text(name, self.source).to_string(),
                text(declaration, self.source).to_string(),
            );
        }
    }

    fn push_common(&mut self, statement: Node<'_>) {
        let code = text(statement, self.source);
        if mentions_identifier(code, &self.surface.context_identifier) {
            self.context_code.push(code);
        } else {
            self.root_code.push(code);
        }
    }

    fn finish(self) -> DeclResult<ExtractedFile> {
        let Self {
            path,
            surface,
            mut imports,
            file_scopes,
            steps,
            hooks,
            root_code,
            context_code,
            ..
        } = self;

        let Some(file_scopes) = file_scopes else {
            return Err(Box::new(DeclarationError {
                path: path.to_path_buf(),
                line: 1,
                column: 1,
                kind: DeclarationErrorKind::MissingFileScopes,
            }));
        };

        if let Some(own) = imports.get_mut(&surface.module) {
            own.named.retain(|name| !surface.is_binding(name));
            if own.is_side_effect_only() {
                imports.remove(&surface.module);
            }
        }

        let source_kind = SourceKind::from_path(path);
        let steps = steps
            .into_iter()
            .map(|pending| StepDefinition {
                blocks: pending.blocks,
                generated_name: generated_name(&pending.matcher),
                matcher: pending.matcher,
                body: pending.body,
                scopes: pending
                    .scopes
                    .into_iter()
                    .chain(file_scopes.iter().cloned())
                    .collect(),
                dependencies: imports.clone(),
                origin: path.to_path_buf(),
                line: pending.line,
                source_kind,
            })
            .collect();
        let hooks = hooks
            .into_iter()
            .map(|(name, body_lines)| Hook {
                name,
                scopes: file_scopes.clone(),
                body_lines,
                origin: path.to_path_buf(),
            })
            .collect();
        let common = |code: Vec<&str>, category| {
            (!code.is_empty()).then(|| CommonCode {
                origin: path.to_path_buf(),
                scopes: file_scopes.clone(),
                text: code.join("\n"),
                category,
            })
        };

        Ok(ExtractedFile {
            path: path.to_path_buf(),
            source_kind,
            steps,
            hooks,
            root_common_code: common(root_code, CodeCategory::Root),
            context_common_code: common(context_code, CodeCategory::ScenarioContext),
        })
    }
}

/// `import type { ... }` carries an anonymous `type` token after `import`.
fn is_type_only_import(statement: Node<'_>) -> bool {
    let mut cursor = statement.walk();
    statement
        .children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == "type")
}
