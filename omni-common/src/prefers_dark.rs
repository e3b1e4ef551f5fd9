use std::fmt;
use std::str::FromStr;

use crate::ParseOptionError;

/// Dark mode preference for the embedded session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefersDark {
    Yes,
    No,
    /// Follow the viewer's system setting
    System,
}

impl PrefersDark {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrefersDark::Yes => "true",
            PrefersDark::No => "false",
            PrefersDark::System => "system",
        }
    }
}

impl fmt::Display for PrefersDark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrefersDark {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "true" => Ok(PrefersDark::Yes),
            "false" => Ok(PrefersDark::No),
            "system" => Ok(PrefersDark::System),
            _ => Err(ParseOptionError {
                option: "prefersDark",
                value: s.to_string(),
            }),
        }
    }
}
