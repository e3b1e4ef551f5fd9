use std::fmt;
use std::str::FromStr;

use crate::ParseOptionError;

/// Role granted on entity folder content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentRole {
    NoAccess,
    Viewer,
    Editor,
    Manager,
}

impl ContentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentRole::NoAccess => "NO_ACCESS",
            ContentRole::Viewer => "VIEWER",
            ContentRole::Editor => "EDITOR",
            ContentRole::Manager => "MANAGER",
        }
    }
}

impl fmt::Display for ContentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentRole {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NO_ACCESS" => Ok(ContentRole::NoAccess),
            "VIEWER" => Ok(ContentRole::Viewer),
            "EDITOR" => Ok(ContentRole::Editor),
            "MANAGER" => Ok(ContentRole::Manager),
            _ => Err(ParseOptionError {
                option: "content role",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_role() {
        for role in [
            ContentRole::NoAccess,
            ContentRole::Viewer,
            ContentRole::Editor,
            ContentRole::Manager,
        ] {
            assert_eq!(role.to_string().parse::<ContentRole>().unwrap(), role);
        }
    }
}
