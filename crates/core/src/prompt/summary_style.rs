use std::fmt;
use std::str::FromStr;

use crate::shared::error::SummaryError;

/// Closed set of video summary styles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SummaryStyle {
    #[default]
    Short,
    Timeline,
    Detailed,
    Technical,
}

impl SummaryStyle {
    pub const ALL: &[SummaryStyle] = &[
        SummaryStyle::Short,
        SummaryStyle::Timeline,
        SummaryStyle::Detailed,
        SummaryStyle::Technical,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SummaryStyle::Short => "short",
            SummaryStyle::Timeline => "timeline",
            SummaryStyle::Detailed => "detailed",
            SummaryStyle::Technical => "technical",
        }
    }

    /// Resolves an optional style name, defaulting to `short`.
    pub fn parse_optional(name: Option<&str>) -> Result<Self, SummaryError> {
        name.map_or(Ok(Self::default()), |s| s.parse())
    }
}

impl FromStr for SummaryStyle {
    type Err = SummaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|style| style.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SummaryError::UnknownStyle(s.to_string()))
    }
}

impl fmt::Display for SummaryStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("short", SummaryStyle::Short)]
    #[case("timeline", SummaryStyle::Timeline)]
    #[case("detailed", SummaryStyle::Detailed)]
    #[case("technical", SummaryStyle::Technical)]
    #[case("Timeline", SummaryStyle::Timeline)]
    #[case(" short ", SummaryStyle::Short)]
    fn test_parse_known_styles(#[case] name: &str, #[case] expected: SummaryStyle) {
        assert_eq!(name.parse::<SummaryStyle>().unwrap(), expected);
    }

    #[rstest]
    #[case("bogus")]
    #[case("")]
    #[case("descriptive")]
    fn test_parse_unknown_style(#[case] name: &str) {
        assert!(matches!(
            name.parse::<SummaryStyle>(),
            Err(SummaryError::UnknownStyle(s)) if s == name
        ));
    }

    #[test]
    fn test_missing_style_defaults_to_short() {
        assert_eq!(
            SummaryStyle::parse_optional(None).unwrap(),
            SummaryStyle::Short
        );
        assert_eq!(
            SummaryStyle::parse_optional(Some("detailed")).unwrap(),
            SummaryStyle::Detailed
        );
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for style in SummaryStyle::ALL {
            assert_eq!(style.to_string().parse::<SummaryStyle>().unwrap(), *style);
        }
    }
}
