pub mod config;
pub mod embed;
pub mod filter;
pub mod json;
pub mod nonce;
pub mod signing;

pub use config::{ConfigError, ConfigSource, ProcessEnv, StaticEnv};
pub use embed::{
    DashboardEmbedUrl, EmbedError, EmbedRequest, EmbedderOptions, FilterSearch, LinkAccess,
    OmniDashboardEmbedder,
};
pub use filter::{
    FilterError, FilterOperator, FilterSearchParams, FilterType, FilterValues,
    OmniFilterDefinition, OmniFilterSet,
};
pub use omni_common::{AccessMode, ContentRole, PrefersDark, Theme};
