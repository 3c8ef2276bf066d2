//! Re-indentation of ECMAScript code copied into a suite.
//!
//! Lines are moved under the suite's indentation, except where a line break
//! falls inside a template literal: there the whitespace is part of a string
//! value and is kept byte for byte.

/// One line of code and whether it begins inside a template literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct CodeLine<'a> {
    pub(super) text: &'a str,
    pub(super) in_template: bool,
}

/// Split `code` into lines, flagging those that continue a template literal.
pub(super) fn code_lines(code: &str) -> Vec<CodeLine<'_>> {
    let mut scanner = TemplateScanner::default();
    code.lines()
        .map(|text| {
            let line = CodeLine {
                text,
                in_template: scanner.in_template(),
            };
            scanner.feed_line(text);
            line
        })
        .collect()
}

/// The first line of a block, trimmed unless its end is inside a template.
pub(super) fn opening_line<'a>(line: &CodeLine<'a>, next_in_template: bool) -> &'a str {
    let text = line.text.trim_start();
    if next_in_template {
        text
    } else {
        text.trim_end()
    }
}

/// The last line of a block, placed after `indent` unless it continues a
/// template literal.
pub(super) fn closing_line(line: &CodeLine<'_>, indent: &str) -> String {
    if line.in_template {
        line.text.trim_end().to_string()
    } else {
        format!("{indent}{}", line.text.trim())
    }
}

/// Remove the indentation shared by the code lines of `lines` and prefix
/// each with `indent`. `open_after` tells whether the line following the
/// block starts inside a template literal.
pub(super) fn reindent(lines: &[CodeLine<'_>], open_after: bool, indent: &str) -> Vec<String> {
    let shared = lines
        .iter()
        .filter(|line| !line.in_template && !line.text.trim().is_empty())
        .map(|line| leading_whitespace(line.text))
        .min()
        .unwrap_or(0);
    let next_open = lines
        .iter()
        .skip(1)
        .map(|line| line.in_template)
        .chain(std::iter::once(open_after));

    lines
        .iter()
        .zip(next_open)
        .map(|(line, ends_open)| {
            let text = if ends_open {
                line.text
            } else {
                line.text.trim_end()
            };
            if line.in_template {
                text.to_string()
            } else if text.trim().is_empty() {
                String::new()
            } else {
                let body = text.get(shared..).unwrap_or_else(|| text.trim_start());
                format!("{indent}{body}")
            }
        })
        .collect()
}

fn leading_whitespace(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Template,
    /// `${ ... }` inside a template, with the count of unclosed braces.
    Substitution(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comment {
    Line,
    Block,
}

/// Tracks string, comment and template state across lines.
#[derive(Debug, Default)]
struct TemplateScanner {
    frames: Vec<Frame>,
    quote: Option<char>,
    comment: Option<Comment>,
    escaped: bool,
    previous: Option<char>,
}

impl TemplateScanner {
    fn in_template(&self) -> bool {
        self.frames.last() == Some(&Frame::Template)
    }

    fn feed_line(&mut self, line: &str) {
        for ch in line.chars() {
            self.feed(ch);
        }
        self.feed('\n');
    }

    fn feed(&mut self, ch: char) {
        if self.escaped {
            self.escaped = false;
            self.previous = None;
            return;
        }
        if self.in_template() {
            self.feed_template(ch);
        } else {
            self.feed_code(ch);
        }
    }

    fn feed_template(&mut self, ch: char) {
        match ch {
            '\\' => self.escaped = true,
            '`' => {
                self.frames.pop();
            }
            '{' if self.previous == Some('$') => self.frames.push(Frame::Substitution(0)),
            _ => {}
        }
        self.previous = Some(ch);
    }

    fn feed_code(&mut self, ch: char) {
        let previous = self.previous.replace(ch);
        match self.comment {
            Some(Comment::Line) => {
                if ch == '\n' {
                    self.comment = None;
                }
                return;
            }
            Some(Comment::Block) => {
                if previous == Some('*') && ch == '/' {
                    self.comment = None;
                    self.previous = None;
                }
                return;
            }
            None => {}
        }
        if let Some(quote) = self.quote {
            match ch {
                '\\' => self.escaped = true,
                '\n' => self.quote = None,
                _ if ch == quote => self.quote = None,
                _ => {}
            }
            return;
        }
        match ch {
            '\'' | '"' => self.quote = Some(ch),
            '`' => self.frames.push(Frame::Template),
            '/' if previous == Some('/') => self.comment = Some(Comment::Line),
            '*' if previous == Some('/') => {
                self.comment = Some(Comment::Block);
                self.previous = None;
            }
            '{' => {
                if let Some(Frame::Substitution(depth)) = self.frames.last_mut() {
                    *depth += 1;
                }
            }
            '}' => match self.frames.last_mut() {
                Some(Frame::Substitution(0)) => {
                    self.frames.pop();
                }
                Some(Frame::Substitution(depth)) => *depth -= 1,
                _ => {}
            },
            _ => {}
        }
    }
}
