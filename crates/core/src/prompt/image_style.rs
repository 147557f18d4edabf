use std::fmt;
use std::str::FromStr;

use crate::shared::error::SummaryError;

/// Closed set of still-image analysis styles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ImageStyle {
    #[default]
    Short,
    Detailed,
    Technical,
    Descriptive,
}

impl ImageStyle {
    pub const ALL: &[ImageStyle] = &[
        ImageStyle::Short,
        ImageStyle::Detailed,
        ImageStyle::Technical,
        ImageStyle::Descriptive,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ImageStyle::Short => "short",
            ImageStyle::Detailed => "detailed",
            ImageStyle::Technical => "technical",
            ImageStyle::Descriptive => "descriptive",
        }
    }

    pub fn parse_optional(name: Option<&str>) -> Result<Self, SummaryError> {
        name.map_or(Ok(Self::default()), |s| s.parse())
    }
}

impl FromStr for ImageStyle {
    type Err = SummaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|style| style.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SummaryError::UnknownStyle(s.to_string()))
    }
}

impl fmt::Display for ImageStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_names() {
        for style in ImageStyle::ALL {
            assert_eq!(style.name().parse::<ImageStyle>().unwrap(), *style);
        }
    }

    #[test]
    fn test_timeline_is_not_an_image_style() {
        assert!(matches!(
            "timeline".parse::<ImageStyle>(),
            Err(SummaryError::UnknownStyle(_))
        ));
    }
}
