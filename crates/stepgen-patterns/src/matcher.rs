//! Literal-or-pattern step matchers.

use std::fmt;

use regex::Regex;

use crate::errors::PatternError;
use crate::translate::translate_regex_literal;

/// A compiled regular-expression matcher together with the literal it was
/// declared as.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    regex: Regex,
    source: String,
    flags: String,
}

impl PatternMatcher {
    /// The literal body as written between the slashes.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The literal flags as written after the closing slash.
    #[must_use]
    pub fn flags(&self) -> &str {
        &self.flags
    }

    /// The compiled expression.
    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

impl PartialEq for PatternMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.flags == other.flags
    }
}

impl Eq for PatternMatcher {}

/// How a step declaration selects the scenario lines it implements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepMatcher {
    /// Matches a line whose text equals the string exactly.
    Literal(String),
    /// Matches a line when the first match of the expression covers the
    /// whole text.
    Pattern(PatternMatcher),
}

impl StepMatcher {
    /// Build a pattern matcher from a regular-expression literal.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] when the flags are unsupported or the
    /// translated expression does not compile.
    ///
    /// # Examples
    ///
    /// ```
    /// use stepgen_patterns::StepMatcher;
    ///
    /// let matcher = StepMatcher::from_regex_literal(r#"^the number "(.*)"$"#, "").unwrap();
    /// assert!(matcher.is_full_match(r#"the number "5""#));
    /// ```
    pub fn from_regex_literal(source: &str, flags: &str) -> Result<Self, PatternError> {
        let translated = translate_regex_literal(source, flags)?;
        let regex = Regex::new(&translated)?;
        Ok(Self::Pattern(PatternMatcher {
            regex,
            source: source.to_string(),
            flags: flags.to_string(),
        }))
    }

    /// Return `true` when this matcher accepts the entire step text.
    ///
    /// A pattern that matches only a prefix, a suffix or an inner slice of
    /// the text is rejected, even if the expression is unanchored.
    ///
    /// # Examples
    ///
    /// ```
    /// use stepgen_patterns::StepMatcher;
    ///
    /// let unanchored = StepMatcher::from_regex_literal("the number", "").unwrap();
    /// assert!(unanchored.is_full_match("the number"));
    /// assert!(!unanchored.is_full_match(r#"the number "5""#));
    ///
    /// let literal = StepMatcher::Literal("I add them".into());
    /// assert!(literal.is_full_match("I add them"));
    /// assert!(!literal.is_full_match("I add them twice"));
    /// ```
    #[must_use]
    pub fn is_full_match(&self, text: &str) -> bool {
        match self {
            Self::Literal(literal) => literal == text,
            Self::Pattern(pattern) => pattern
                .regex
                .find(text)
                .is_some_and(|found| found.start() == 0 && found.end() == text.len()),
        }
    }

    /// The text generated names are derived from: the literal itself or
    /// the expression body.
    #[must_use]
    pub fn name_source(&self) -> &str {
        match self {
            Self::Literal(literal) => literal,
            Self::Pattern(pattern) => &pattern.source,
        }
    }
}

/// Renders the matcher the way it was declared: literals in double quotes,
/// patterns as `/body/flags`.
impl fmt::Display for StepMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(literal) => write!(f, "{literal:?}"),
            Self::Pattern(pattern) => write!(f, "/{}/{}", pattern.source, pattern.flags),
        }
    }
}
