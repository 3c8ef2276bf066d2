//! Generated function names for step definitions.

use crate::matcher::StepMatcher;

/// Prefix used when the derived name would not be a valid identifier.
const FALLBACK_PREFIX: &str = "Step";

/// Derive the generated function name for a matcher.
///
/// Every character that is neither an ASCII word character nor whitespace
/// is dropped, the remaining words are title-cased and concatenated. Names
/// that end up empty or starting with a digit are prefixed with `Step`.
/// Different matchers may produce the same name; callers that emit several
/// definitions side by side must disambiguate.
///
/// # Examples
///
/// ```
/// use stepgen_patterns::{generated_name, StepMatcher};
///
/// let matcher = StepMatcher::from_regex_literal(r#"^the number "(.*)"$"#, "").unwrap();
/// assert_eq!(generated_name(&matcher), "TheNumber");
///
/// let literal = StepMatcher::Literal("I enter my password correctly".into());
/// assert_eq!(generated_name(&literal), "IEnterMyPasswordCorrectly");
/// ```
#[must_use]
pub fn generated_name(matcher: &StepMatcher) -> String {
    let stripped: String = matcher
        .name_source()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();

    let mut name = String::with_capacity(stripped.len());
    for word in stripped.split_whitespace() {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            name.push(first.to_ascii_uppercase());
            name.extend(chars);
        }
    }

    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert_str(0, FALLBACK_PREFIX);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn pattern(source: &str) -> StepMatcher {
        match StepMatcher::from_regex_literal(source, "") {
            Ok(matcher) => matcher,
            Err(err) => panic!("pattern should compile: {err}"),
        }
    }

    #[rstest]
    #[case(r"I (multiply|add|substract|divide) them", "IMultiplyaddsubstractdivideThem")]
    #[case(r#"the result should be "(.*)""#, "TheResultShouldBe")]
    #[case(r"^I add them$", "IAddThem")]
    #[case(r"I have \d+ cukes", "IHaveDCukes")]
    #[case(r"^(1|2) items$", "Step12Items")]
    #[case(r"^.*$", "Step")]
    fn derives_names_from_patterns(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(generated_name(&pattern(source)), expected);
    }

    #[rstest]
    #[case("YOLO", "YOLO")]
    #[case("I should be granted access", "IShouldBeGrantedAccess")]
    #[case("  spaced\tout  words ", "SpacedOutWords")]
    #[case("l'addition est « faite »", "LadditionEstFaite")]
    #[case("snake_case step", "Snake_caseStep")]
    fn derives_names_from_literals(#[case] literal: &str, #[case] expected: &str) {
        assert_eq!(
            generated_name(&StepMatcher::Literal(literal.to_string())),
            expected
        );
    }
}
