//! Applicability scopes attached to steps, hooks and common code.
//!
//! A [`Scope`] restricts a declaration to a feature title, a scenario
//! title, a tag, or any conjunction of them. A declaration carrying several
//! scopes applies when any one of them matches. An empty scope applies
//! everywhere, while an empty list applies nowhere: `defineFileScopes([{}])`
//! is how a file opts into every feature.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One applicability filter. Present fields are AND-combined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// Exact feature title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
    /// Exact scenario title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    /// Tag name, compared case-insensitively against `@`-prefixed tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// The concrete context a scope is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct ScopeTarget<'a> {
    /// Title of the feature being linked.
    pub feature: &'a str,
    /// Title of the scenario, absent for feature-level declarations.
    pub scenario: Option<&'a str>,
    /// Normalised tags, see [`normalise_tag`].
    pub tags: &'a [String],
}

impl Scope {
    /// Return `true` when every present field agrees with `target`.
    ///
    /// A scenario restriction never matches a feature-level target.
    ///
    /// # Examples
    ///
    /// ```
    /// use stepgen::scope::{Scope, ScopeTarget};
    ///
    /// let scope = Scope { tag: Some("Smoke".into()), ..Scope::default() };
    /// let tags = vec!["@smoke".to_string()];
    /// let target = ScopeTarget { feature: "Login", scenario: None, tags: &tags };
    /// assert!(scope.matches(&target));
    /// ```
    #[must_use]
    pub fn matches(&self, target: &ScopeTarget<'_>) -> bool {
        if self
            .feature
            .as_deref()
            .is_some_and(|feature| feature != target.feature)
        {
            return false;
        }
        if let Some(scenario) = self.scenario.as_deref() {
            if target.scenario != Some(scenario) {
                return false;
            }
        }
        self.tag.as_deref().is_none_or(|tag| {
            let wanted = format!("@{}", tag.to_lowercase());
            target.tags.iter().any(|candidate| *candidate == wanted)
        })
    }
}

/// Renders the scope as the object literal it was declared with.
impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields = Vec::with_capacity(3);
        if let Some(feature) = &self.feature {
            fields.push(format!("feature: {feature:?}"));
        }
        if let Some(scenario) = &self.scenario {
            fields.push(format!("scenario: {scenario:?}"));
        }
        if let Some(tag) = &self.tag {
            fields.push(format!("tag: {tag:?}"));
        }
        if fields.is_empty() {
            f.write_str("{}")
        } else {
            write!(f, "{{ {} }}", fields.join(", "))
        }
    }
}

/// Return `true` when any scope in the list matches.
#[must_use]
pub fn matches_any(scopes: &[Scope], target: &ScopeTarget<'_>) -> bool {
    scopes.iter().any(|scope| scope.matches(target))
}

/// Lower-case a tag and make sure it carries a single leading `@`.
///
/// # Examples
///
/// ```
/// use stepgen::scope::normalise_tag;
///
/// assert_eq!(normalise_tag(" Skip "), "@skip");
/// assert_eq!(normalise_tag("@Only"), "@only");
/// ```
#[must_use]
pub fn normalise_tag(tag: &str) -> String {
    let trimmed = tag.trim().to_lowercase();
    if trimmed.starts_with('@') {
        trimmed
    } else {
        format!("@{trimmed}")
    }
}

/// Render a scope list for diagnostics.
pub(crate) fn describe_scopes(scopes: &[Scope]) -> String {
    let rendered: Vec<String> = scopes.iter().map(ToString::to_string).collect();
    format!("[{}]", rendered.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|tag| normalise_tag(tag)).collect()
    }

    fn scope(feature: Option<&str>, scenario: Option<&str>, tag: Option<&str>) -> Scope {
        Scope {
            feature: feature.map(str::to_string),
            scenario: scenario.map(str::to_string),
            tag: tag.map(str::to_string),
        }
    }

    #[rstest]
    #[case(scope(None, None, None), true)]
    #[case(scope(Some("Calculator"), None, None), true)]
    #[case(scope(Some("Other"), None, None), false)]
    #[case(scope(None, Some("Simple addition"), None), true)]
    #[case(scope(None, Some("Other"), None), false)]
    #[case(scope(None, None, Some("math")), true)]
    #[case(scope(None, None, Some("MATH")), true)]
    #[case(scope(None, None, Some("slow")), false)]
    #[case(scope(Some("Calculator"), Some("Simple addition"), Some("math")), true)]
    #[case(scope(Some("Calculator"), Some("Other"), Some("math")), false)]
    fn evaluates_each_field(#[case] scope: Scope, #[case] expected: bool) {
        let tags = tags(&["@Math", "@fast"]);
        let target = ScopeTarget {
            feature: "Calculator",
            scenario: Some("Simple addition"),
            tags: &tags,
        };
        assert_eq!(scope.matches(&target), expected);
    }

    #[rstest]
    #[case("math")]
    #[case("Math")]
    #[case("fast")]
    fn tag_scope_checks_membership(#[case] tag: &str) {
        let tags = tags(&["math", "fast", "other"]);
        let target = ScopeTarget {
            feature: "f",
            scenario: None,
            tags: &tags,
        };
        let scope = scope(None, None, Some(tag));
        assert_eq!(
            scope.matches(&target),
            tags.contains(&format!("@{}", tag.to_lowercase()))
        );
    }

    #[test]
    fn scenario_scope_never_matches_feature_level_target() {
        let target = ScopeTarget {
            feature: "f",
            scenario: None,
            tags: &[],
        };
        assert!(!scope(None, Some("s"), None).matches(&target));
    }

    #[test]
    fn scope_lists_are_or_combined() {
        let target = ScopeTarget {
            feature: "b",
            scenario: None,
            tags: &[],
        };
        assert!(!matches_any(&[], &target));
        assert!(matches_any(&[Scope::default()], &target));
        assert!(matches_any(
            &[scope(Some("a"), None, None), scope(Some("b"), None, None)],
            &target
        ));
        assert!(!matches_any(&[scope(Some("a"), None, None)], &target));
    }

    #[test]
    fn displays_declared_fields() {
        assert_eq!(scope(None, None, None).to_string(), "{}");
        assert_eq!(
            scope(Some("Calc"), None, Some("math")).to_string(),
            r#"{ feature: "Calc", tag: "math" }"#
        );
        assert_eq!(
            describe_scopes(&[scope(None, None, None), scope(None, Some("s"), None)]),
            r#"[{}, { scenario: "s" }]"#
        );
    }
}
