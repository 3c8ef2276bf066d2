//! Convert ECMAScript regular-expression literals into `regex` syntax.
//!
//! Groups, quantifiers, anchors and named groups carry over unchanged. The
//! translation rewrites what differs: flags become an inline group, `\/`
//! loses its escape, the empty classes `[]` and `[^]` get explicit
//! equivalents, and `\u{...}` braces are kept only when the `u` flag made
//! them meaningful. ECMAScript `\w`, `\d` and `\b` are ASCII-only while
//! `regex` makes them Unicode-aware, so they become ASCII classes and
//! assertions. Without the `u` or `v` flag a brace that does not open a
//! quantifier is a literal and gets escaped. Anything the `regex` crate
//! cannot express (look-around, back-references) is reported when the
//! result is compiled.

use crate::errors::PatternError;

/// Translate a regular-expression literal body and its flags.
///
/// # Errors
///
/// Returns [`PatternError::UnsupportedFlag`] for flags other than
/// `d`, `g`, `i`, `m`, `s`, `u`, `v` and `y`, and
/// [`PatternError::DanglingEscape`] when the body ends with a lone backslash.
///
/// # Examples
///
/// ```
/// use stepgen_patterns::translate_regex_literal;
///
/// let source = translate_regex_literal(r"^a\/b$", "i").unwrap();
/// assert_eq!(source, "(?i)^a/b$");
/// ```
pub fn translate_regex_literal(body: &str, flags: &str) -> Result<String, PatternError> {
    let mut inline = String::new();
    let mut unicode = false;
    for flag in flags.chars() {
        match flag {
            'i' | 'm' | 's' => {
                if !inline.contains(flag) {
                    inline.push(flag);
                }
            }
            'u' | 'v' => unicode = true,
            // Global, sticky and indices only affect iteration state in the
            // host language, never whether a single match exists.
            'g' | 'y' | 'd' => {}
            other => return Err(PatternError::UnsupportedFlag(other)),
        }
    }

    let mut out = String::with_capacity(body.len().saturating_add(8));
    if !inline.is_empty() {
        out.push_str("(?");
        out.push_str(&inline);
        out.push(')');
    }
    translate_body(body, unicode, &mut out)?;
    Ok(out)
}

fn translate_body(body: &str, unicode: bool, out: &mut String) -> Result<(), PatternError> {
    let mut chars = body.char_indices().peekable();
    let mut in_class = false;

    while let Some((index, ch)) = chars.next() {
        match ch {
            '\\' => {
                let Some((_, escaped)) = chars.next() else {
                    return Err(PatternError::DanglingEscape(index));
                };
                match escaped {
                    '/' => out.push('/'),
                    'u' if !unicode && chars.peek().is_some_and(|(_, c)| *c == '{') => {
                        // Without the unicode flag `\u{` is a literal `u{`.
                        out.push('u');
                    }
                    'w' | 'W' | 'd' | 'D' => out.push_str(ascii_class(escaped, in_class)),
                    // Inside a class `\b` is a backspace.
                    'b' if in_class => out.push_str(r"\x08"),
                    'b' | 'B' => {
                        out.push_str(r"(?-u:\");
                        out.push(escaped);
                        out.push(')');
                    }
                    other => {
                        out.push('\\');
                        out.push(other);
                    }
                }
            }
            '[' if !in_class => {
                if body.get(index..).is_some_and(|rest| rest.starts_with("[^]")) {
                    out.push_str(r"[\s\S]");
                    chars.next();
                    chars.next();
                } else if body.get(index..).is_some_and(|rest| rest.starts_with("[]")) {
                    // An empty class never matches.
                    out.push_str(r"[^\s\S]");
                    chars.next();
                } else {
                    in_class = true;
                    out.push('[');
                }
            }
            '[' => out.push_str(r"\["),
            ']' if in_class => {
                in_class = false;
                out.push(']');
            }
            '{' if !in_class && !unicode => {
                let quantifier = body.get(index..).and_then(quantifier_len);
                if let Some(len) = quantifier {
                    out.push('{');
                    // The quantifier is ASCII, so byte and char counts agree.
                    for _ in 1..len {
                        if let Some((_, c)) = chars.next() {
                            out.push(c);
                        }
                    }
                } else {
                    out.push_str(r"\{");
                }
            }
            '}' if !in_class && !unicode => out.push_str(r"\}"),
            _ => out.push(ch),
        }
    }
    Ok(())
}

/// ASCII spelling of a class escape, bracketed unless already in a class.
fn ascii_class(escape: char, in_class: bool) -> &'static str {
    match (escape, in_class) {
        ('w', false) => "[[:word:]]",
        ('w', true) => "[:word:]",
        ('W', false) => "[[:^word:]]",
        ('W', true) => "[:^word:]",
        ('d', false) => "[[:digit:]]",
        ('d', true) => "[:digit:]",
        ('D', false) => "[[:^digit:]]",
        _ => "[:^digit:]",
    }
}

/// Byte length of a `{n}`, `{n,}` or `{n,m}` quantifier at the start of
/// `rest`.
fn quantifier_len(rest: &str) -> Option<usize> {
    let inner = rest.strip_prefix('{')?;
    let close = inner.find('}')?;
    let bounds = inner.get(..close)?;
    let (min, max) = bounds.split_once(',').unwrap_or((bounds, "0"));
    let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    (!min.is_empty() && digits(min) && digits(max)).then_some(close + 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn translate(body: &str, flags: &str) -> String {
        match translate_regex_literal(body, flags) {
            Ok(source) => source,
            Err(err) => panic!("translation should succeed: {err}"),
        }
    }

    #[rstest]
    #[case(r#"^the number "(.*)"$"#, "", r#"^the number "(.*)"$"#)]
    #[case(r"a\/b", "", "a/b")]
    #[case("abc", "gi", "(?i)abc")]
    #[case("abc", "ims", "(?ims)abc")]
    #[case("abc", "ii", "(?i)abc")]
    #[case("[^]+", "", r"[\s\S]+")]
    #[case("x[]", "", r"x[^\s\S]")]
    #[case(r"[a[b]", "", r"[a\[b]")]
    #[case(r"(?<name>.+)", "", r"(?<name>.+)")]
    #[case(r"\u{41}", "", "u{41}")]
    #[case(r"\u{41}", "u", r"\u{41}")]
    #[case(r"\d+ \w+", "", "[[:digit:]]+ [[:word:]]+")]
    #[case(r"\D\W", "u", "[[:^digit:]][[:^word:]]")]
    #[case(r"[\w-][^\d\D]", "", "[[:word:]-][^[:digit:][:^digit:]]")]
    #[case(r"\bcat\B", "", r"(?-u:\b)cat(?-u:\B)")]
    #[case(r"[\b]", "", r"[\x08]")]
    #[case(r"\s\.", "", r"\s\.")]
    #[case("a{2}b{1,}c{1,3}", "", "a{2}b{1,}c{1,3}")]
    #[case("a{", "", r"a\{")]
    #[case("a{,2}", "", r"a\{,2\}")]
    #[case("x{y}", "", r"x\{y\}")]
    #[case("[{}]", "", "[{}]")]
    #[case("a{2}", "u", "a{2}")]
    fn translates_literals(#[case] body: &str, #[case] flags: &str, #[case] expected: &str) {
        assert_eq!(translate(body, flags), expected);
    }

    #[test]
    fn rejects_unknown_flags() {
        let Err(err) = translate_regex_literal("a", "q") else {
            panic!("flag should be rejected");
        };
        assert!(matches!(err, PatternError::UnsupportedFlag('q')));
    }

    #[test]
    fn rejects_dangling_escape() {
        let Err(err) = translate_regex_literal(r"abc\", "") else {
            panic!("dangling escape should be rejected");
        };
        assert!(matches!(err, PatternError::DanglingEscape(3)));
    }
}
