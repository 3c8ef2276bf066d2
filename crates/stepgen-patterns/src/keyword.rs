//! Step keyword and block vocabulary.
//!
//! [`StepBlock`] is the closed set of registrars a step definition can be
//! declared for, while [`StepKeyword`] is what a scenario line actually
//! starts with, including the `And`/`But` continuations that inherit the
//! previous block.

use std::fmt;
use std::str::FromStr;

use gherkin::StepType;

use crate::errors::UnknownBlock;

/// Registrar a step definition is declared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StepBlock {
    /// Preconditions.
    Given,
    /// The action under test.
    When,
    /// Expected outcome.
    Then,
}

impl StepBlock {
    /// Every block, in scenario order.
    pub const ALL: [Self; 3] = [Self::Given, Self::When, Self::Then];

    /// Lower-case name shared by declarations and generated registrars.
    ///
    /// # Examples
    ///
    /// ```
    /// use stepgen_patterns::StepBlock;
    ///
    /// assert_eq!(StepBlock::Then.as_str(), "then");
    /// ```
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Given => "given",
            Self::When => "when",
            Self::Then => "then",
        }
    }
}

impl fmt::Display for StepBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the exact lower-case spelling used in `defineStep(['given'], ...)`
/// and by the shorthand declarations.
impl FromStr for StepBlock {
    type Err = UnknownBlock;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|block| block.as_str() == value)
            .ok_or_else(|| UnknownBlock(value.to_string()))
    }
}

/// Keyword a scenario line starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKeyword {
    /// `Given`.
    Given,
    /// `When`.
    When,
    /// `Then`.
    Then,
    /// `And`, or the `*` bullet.
    And,
    /// `But`.
    But,
}

impl StepKeyword {
    /// English spelling, used in diagnostics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
            Self::And => "And",
            Self::But => "But",
        }
    }

    /// Resolve this keyword to a block, tracking the current block.
    ///
    /// Continuations return `current` unchanged. Primary keywords overwrite
    /// `current`. Seed `current` with [`StepBlock::Given`] at the start of
    /// each scenario.
    ///
    /// # Examples
    ///
    /// ```
    /// use stepgen_patterns::{StepBlock, StepKeyword};
    ///
    /// let mut current = StepBlock::Given;
    /// assert_eq!(StepKeyword::And.resolve(&mut current), StepBlock::Given);
    /// assert_eq!(StepKeyword::When.resolve(&mut current), StepBlock::When);
    /// assert_eq!(StepKeyword::But.resolve(&mut current), StepBlock::When);
    /// ```
    #[must_use]
    pub fn resolve(self, current: &mut StepBlock) -> StepBlock {
        match self {
            Self::Given => *current = StepBlock::Given,
            Self::When => *current = StepBlock::When,
            Self::Then => *current = StepBlock::Then,
            Self::And | Self::But => {}
        }
        *current
    }

    /// Map the written keyword and the parser's step type onto a keyword.
    ///
    /// `And`, `But` and `*` are recognised from the text so continuations
    /// stay distinguishable; anything else, localised primaries included,
    /// follows the typed step.
    #[must_use]
    pub fn from_gherkin(text: &str, ty: StepType) -> Self {
        match text.trim() {
            "*" => Self::And,
            s if s.eq_ignore_ascii_case("and") => Self::And,
            s if s.eq_ignore_ascii_case("but") => Self::But,
            _ => match ty {
                StepType::Given => Self::Given,
                StepType::When => Self::When,
                StepType::Then => Self::Then,
            },
        }
    }
}

impl fmt::Display for StepKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("given", Some(StepBlock::Given))]
    #[case("when", Some(StepBlock::When))]
    #[case("then", Some(StepBlock::Then))]
    #[case("Given", None)]
    #[case(" then", None)]
    #[case("and", None)]
    fn parses_declared_blocks(#[case] input: &str, #[case] expected: Option<StepBlock>) {
        assert_eq!(input.parse::<StepBlock>().ok(), expected);
    }

    #[test]
    fn unknown_block_names_the_input() {
        let Err(err) = "soit".parse::<StepBlock>() else {
            panic!("unknown block should be rejected");
        };
        assert_eq!(err.to_string(), "unknown step block 'soit'");
    }

    #[rstest]
    #[case("And ", StepType::When, StepKeyword::And)]
    #[case("But", StepType::Then, StepKeyword::But)]
    #[case("* ", StepType::Given, StepKeyword::And)]
    #[case("Given ", StepType::Given, StepKeyword::Given)]
    #[case("Quand ", StepType::When, StepKeyword::When)]
    fn maps_gherkin_keywords(
        #[case] text: &str,
        #[case] ty: StepType,
        #[case] expected: StepKeyword,
    ) {
        assert_eq!(StepKeyword::from_gherkin(text, ty), expected);
    }

    #[test]
    fn continuations_inherit_the_current_block() {
        let mut current = StepBlock::When;
        assert_eq!(StepKeyword::And.resolve(&mut current), StepBlock::When);
        assert_eq!(StepKeyword::But.resolve(&mut current), StepBlock::When);
        assert_eq!(StepKeyword::Then.resolve(&mut current), StepBlock::Then);
        assert_eq!(StepKeyword::Given.resolve(&mut current), StepBlock::Given);
        assert_eq!(current, StepBlock::Given);
    }

    #[test]
    fn block_display_matches_registrar_names() {
        let names: Vec<_> = StepBlock::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["given", "when", "then"]);
    }
}
