mod access_mode;
mod content_role;
mod prefers_dark;
mod theme;

pub use access_mode::AccessMode;
pub use content_role::ContentRole;
pub use prefers_dark::PrefersDark;
pub use theme::Theme;

/// Returned when a string is not a known wire token for an embed option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptionError {
    pub option: &'static str,
    pub value: String,
}

impl std::fmt::Display for ParseOptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {} value: {:?}", self.option, self.value)
    }
}

impl std::error::Error for ParseOptionError {}
