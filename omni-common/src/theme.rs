use std::fmt;
use std::str::FromStr;

use crate::ParseOptionError;

/// Built-in visual theme for an embedded dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Theme {
    Dawn,
    Vibes,
    Breeze,
    Blank,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dawn => "dawn",
            Theme::Vibes => "vibes",
            Theme::Breeze => "breeze",
            Theme::Blank => "blank",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dawn" => Ok(Theme::Dawn),
            "vibes" => Ok(Theme::Vibes),
            "breeze" => Ok(Theme::Breeze),
            "blank" => Ok(Theme::Blank),
            _ => Err(ParseOptionError {
                option: "theme",
                value: s.to_string(),
            }),
        }
    }
}
