//! Handout mode: slides plus speaker notes laid out for print.
//!
//! The marp engine and the post-processor both read their settings from the
//! environment.

use std::fmt;
use std::str::FromStr;

pub const ENV_HANDOUT: &str = "MARP_HANDOUT";
pub const ENV_LAYOUT: &str = "MARP_HANDOUT_LAYOUT";
pub const ENV_SLIDES_PER_PAGE: &str = "MARP_HANDOUT_SLIDES_PER_PAGE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandoutLayout {
    #[default]
    Portrait,
    Landscape,
}

impl fmt::Display for HandoutLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandoutLayout::Portrait => write!(f, "portrait"),
            HandoutLayout::Landscape => write!(f, "landscape"),
        }
    }
}

impl FromStr for HandoutLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "portrait" => Ok(HandoutLayout::Portrait),
            "landscape" => Ok(HandoutLayout::Landscape),
            other => Err(format!(
                "unknown handout layout '{other}'; expected: portrait, landscape"
            )),
        }
    }
}

/// Slides per handout page; only 1, 2, 3, 4 and 6 are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlidesPerPage(u8);

impl SlidesPerPage {
    pub const ALLOWED: [u8; 5] = [1, 2, 3, 4, 6];

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for SlidesPerPage {
    fn default() -> Self {
        Self(1)
    }
}

impl TryFrom<u8> for SlidesPerPage {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        if Self::ALLOWED.contains(&n) {
            Ok(Self(n))
        } else {
            Err(format!("{n} slides per page not supported; expected one of 1, 2, 3, 4, 6"))
        }
    }
}

impl FromStr for SlidesPerPage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u8 = s
            .trim()
            .parse()
            .map_err(|_| format!("'{s}' is not a number"))?;
        Self::try_from(n)
    }
}

impl fmt::Display for SlidesPerPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Handout {
    pub layout: HandoutLayout,
    pub slides_per_page: SlidesPerPage,
}

impl Handout {
    /// Environment for the marp engine.
    pub fn engine_env(&self) -> Vec<(String, String)> {
        let mut env = vec![(ENV_HANDOUT.to_string(), "true".to_string())];
        env.extend(self.postprocess_env());
        env
    }

    /// Environment for the post-processor.
    pub fn postprocess_env(&self) -> Vec<(String, String)> {
        vec![
            (ENV_LAYOUT.to_string(), self.layout.to_string()),
            (ENV_SLIDES_PER_PAGE.to_string(), self.slides_per_page.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slides_per_page_rejects_five() {
        assert!(SlidesPerPage::try_from(5).is_err());
        assert_eq!("6".parse::<SlidesPerPage>().map(SlidesPerPage::get), Ok(6));
        assert!("six".parse::<SlidesPerPage>().is_err());
    }

    #[test]
    fn layout_parses_case_insensitively() {
        assert_eq!("Landscape".parse::<HandoutLayout>(), Ok(HandoutLayout::Landscape));
        assert!("square".parse::<HandoutLayout>().is_err());
    }
}
