//! Thin helpers over the tree-sitter ECMAScript grammars.

use std::path::Path;

use tree_sitter::{Language, Node, Parser, Tree};

use super::error::ExtractError;

/// Pick the grammar for an implementation file by extension.
pub(super) fn language_for(path: &Path) -> Language {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("ts" | "mts" | "cts") => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        Some("tsx") => tree_sitter_typescript::LANGUAGE_TSX.into(),
        _ => tree_sitter_javascript::LANGUAGE.into(),
    }
}

pub(super) fn parse(path: &Path, source: &str) -> Result<Tree, ExtractError> {
    let mut parser = Parser::new();
    parser
        .set_language(&language_for(path))
        .map_err(|e| ExtractError::Parser {
            path: path.to_path_buf(),
            message: format!("failed to set language: {e}"),
        })?;
    parser
        .parse(source, None)
        .ok_or_else(|| ExtractError::Parser {
            path: path.to_path_buf(),
            message: "parser returned no tree".to_string(),
        })
}

/// Source text covered by `node`.
pub(super) fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or_default()
}

/// One-based line and column of the node start.
pub(super) fn location(node: Node<'_>) -> (usize, usize) {
    let point = node.start_position();
    (point.row + 1, point.column + 1)
}

/// The first error or missing node in document order.
pub(super) fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if !node.has_error() {
        return None;
    }
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .find_map(first_error)
        .or(Some(node))
}

/// Named children, skipping comments.
pub(super) fn significant_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// Callee identifier and argument nodes of a plain `name(...)` call.
pub(super) fn simple_call<'t>(node: Node<'t>, source: &str) -> Option<(String, Vec<Node<'t>>)> {
    if node.kind() != "call_expression" {
        return None;
    }
    let function = node.child_by_field_name("function")?;
    if function.kind() != "identifier" {
        return None;
    }
    let arguments = node.child_by_field_name("arguments")?;
    if arguments.kind() != "arguments" {
        return None;
    }
    Some((text(function, source).to_string(), significant_children(arguments)))
}

pub(super) fn is_function_literal(node: Node<'_>) -> bool {
    matches!(
        node.kind(),
        "arrow_function" | "function_expression" | "function"
    )
}

/// The cooked value of a string literal node.
pub(super) fn string_value(node: Node<'_>, source: &str) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    let raw = text(node, source);
    let inner = raw.get(1..raw.len().checked_sub(1)?)?;
    Some(unescape(inner))
}

/// Resolve ECMAScript string escapes. Unknown escapes yield the escaped
/// character itself.
fn unescape(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let Some(escaped) = chars.next() else {
            out.push('\\');
            break;
        };
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            // Line continuation.
            '\n' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            'x' => {
                let digits: String = chars.by_ref().take(2).collect();
                push_code_point(&mut out, &digits, 'x');
            }
            'u' => {
                let digits: String = if chars.peek() == Some(&'{') {
                    chars.next();
                    chars.by_ref().take_while(|c| *c != '}').collect()
                } else {
                    chars.by_ref().take(4).collect()
                };
                push_code_point(&mut out, &digits, 'u');
            }
            other => out.push(other),
        }
    }
    out
}

fn push_code_point(out: &mut String, digits: &str, marker: char) {
    if let Some(ch) = u32::from_str_radix(digits, 16).ok().and_then(char::from_u32) {
        out.push(ch);
        return;
    }
    out.push(marker);
    out.push_str(digits);
}

/// Return `true` when `text` mentions `identifier` as a whole word.
pub(super) fn mentions_identifier(text: &str, identifier: &str) -> bool {
    if identifier.is_empty() {
        return false;
    }
    let is_ident = |c: char| c.is_alphanumeric() || c == '_' || c == '$';
    text.match_indices(identifier).any(|(start, _)| {
        let before = text.get(..start).and_then(|s| s.chars().next_back());
        let after = text
            .get(start + identifier.len()..)
            .and_then(|s| s.chars().next());
        !before.is_some_and(is_ident) && !after.is_some_and(is_ident)
    })
}
