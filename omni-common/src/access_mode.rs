use std::fmt;
use std::str::FromStr;

use crate::ParseOptionError;

/// How much of the Omni application the embed user can reach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Full application shell (navigation, other content)
    Application,
    /// Only the requested piece of content
    SingleContent,
}

impl AccessMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMode::Application => "APPLICATION",
            AccessMode::SingleContent => "SINGLE_CONTENT",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessMode {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "APPLICATION" => Ok(AccessMode::Application),
            "SINGLE_CONTENT" => Ok(AccessMode::SingleContent),
            _ => Err(ParseOptionError {
                option: "mode",
                value: s.to_string(),
            }),
        }
    }
}
