//! Signed dashboard embed URLs.
//!
//! [`OmniDashboardEmbedder`] is configured once with the signing secret and
//! login host, then builds one signed URL per [`EmbedRequest`]. Each build
//! draws a fresh nonce; nothing else is shared between builds.

mod url;

pub use url::DashboardEmbedUrl;

use std::fmt;
use std::sync::Arc;

use omni_common::{AccessMode, ContentRole, PrefersDark, Theme};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{self, ConfigError, ConfigField, ConfigSource, MissingFields, ProcessEnv};
use crate::filter::FilterSearchParams;
use crate::json::to_compact_string;
use crate::nonce::{NonceSource, RandomNonce};

/// `linkAccess` value that permits links to every dashboard.
pub const LINK_ACCESS_OPEN: &str = "__omni_link_access_open";

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("{0}")]
    Usage(String),
    #[error("Failed to encode query string: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),
    #[error("Invalid embed URL: {0}")]
    Parse(String),
}

/// Which other Omni dashboards can be opened from links in the embed.
///
/// Links to anything that is not an Omni dashboard are always allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LinkAccess {
    /// No links to other dashboards.
    #[default]
    Restricted,
    /// Links to every dashboard.
    Open,
    /// Links only to these dashboard ids.
    Dashboards(Vec<String>),
}

impl LinkAccess {
    fn wire_value(&self) -> Option<String> {
        match self {
            LinkAccess::Restricted => None,
            LinkAccess::Open => Some(LINK_ACCESS_OPEN.to_string()),
            LinkAccess::Dashboards(ids) if ids.is_empty() => None,
            LinkAccess::Dashboards(ids) => Some(ids.join(",")),
        }
    }
}

impl From<bool> for LinkAccess {
    fn from(open: bool) -> Self {
        if open {
            LinkAccess::Open
        } else {
            LinkAccess::Restricted
        }
    }
}

impl From<Vec<String>> for LinkAccess {
    fn from(ids: Vec<String>) -> Self {
        LinkAccess::Dashboards(ids)
    }
}

impl From<Vec<&str>> for LinkAccess {
    fn from(ids: Vec<&str>) -> Self {
        LinkAccess::Dashboards(ids.into_iter().map(String::from).collect())
    }
}

/// Accepts `true`, `false`, `null` or an array of dashboard id strings.
impl TryFrom<&Value> for LinkAccess {
    type Error = EmbedError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let usage = || {
            EmbedError::Usage(
                "link_access must be a list of dashboard IDs or true to allow links to all \
                 dashboards."
                    .to_string(),
            )
        };
        match value {
            Value::Null => Ok(LinkAccess::Restricted),
            Value::Bool(open) => Ok(LinkAccess::from(*open)),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(String::from).ok_or_else(usage))
                .collect::<Result<Vec<_>, _>>()
                .map(LinkAccess::Dashboards),
            _ => Err(usage()),
        }
    }
}

/// Dashboard filter values, either pre-encoded (the part after `?` in a
/// dashboard URL) or as a mapping to encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSearch {
    Encoded(String),
    Params(FilterSearchParams),
}

impl FilterSearch {
    fn wire_value(&self) -> Result<Option<String>, EmbedError> {
        match self {
            FilterSearch::Encoded(query) => Ok(non_empty(query)),
            FilterSearch::Params(params) if params.is_empty() => Ok(None),
            FilterSearch::Params(params) => Ok(non_empty(&params.encode()?)),
        }
    }
}

impl From<&str> for FilterSearch {
    fn from(query: &str) -> Self {
        FilterSearch::Encoded(query.to_string())
    }
}

impl From<String> for FilterSearch {
    fn from(query: String) -> Self {
        FilterSearch::Encoded(query)
    }
}

impl From<FilterSearchParams> for FilterSearch {
    fn from(params: FilterSearchParams) -> Self {
        FilterSearch::Params(params)
    }
}

/// Parameters for one embed URL.
///
/// Only `content_path`, `external_id` and `name` are required. Optional
/// values that are `None`, empty strings, or empty JSON containers are left
/// out of the URL entirely. See the Omni embed docs for what each option does.
#[derive(Debug, Clone, Default)]
pub struct EmbedRequest {
    /// Path of the content to embed, e.g. `/dashboards/da24491e`.
    pub content_path: String,
    /// Stable id of the embed user in the host application.
    pub external_id: String,
    /// Display name of the embed user; need not be unique.
    pub name: String,
    pub access_boost: bool,
    /// Connection id to connection role.
    pub connection_roles: Option<Value>,
    pub custom_theme: Option<Value>,
    pub custom_theme_id: Option<String>,
    pub email: Option<String>,
    /// Customer or tenant the user belongs to.
    pub entity: Option<String>,
    pub entity_folder_content_role: Option<ContentRole>,
    pub entity_folder_group_content_role: Option<ContentRole>,
    pub entity_folder_label: Option<String>,
    pub entity_group_label: Option<String>,
    pub filter_search_params: Option<FilterSearch>,
    /// Existing Omni groups to add the embed user to.
    pub groups: Vec<String>,
    pub link_access: LinkAccess,
    pub mode: Option<AccessMode>,
    /// Model id to model role.
    pub model_roles: Option<Value>,
    pub prefers_dark: Option<PrefersDark>,
    pub preserve_entity_folder_content_role: bool,
    pub theme: Option<Theme>,
    pub ui_settings: Option<Value>,
    /// Values for user attributes defined in Omni.
    pub user_attributes: Option<Value>,
}

impl EmbedRequest {
    pub fn new(
        content_path: impl Into<String>,
        external_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            content_path: content_path.into(),
            external_id: external_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Arguments for [`OmniDashboardEmbedder`]. Anything left `None` falls back
/// to `OMNI_ORGANIZATION_NAME`, `OMNI_EMBED_SECRET` and `OMNI_VANITY_DOMAIN`.
#[derive(Clone, Default)]
pub struct EmbedderOptions {
    pub organization_name: Option<String>,
    pub embed_secret: Option<String>,
    /// Custom domain configured in Omni, without scheme.
    pub vanity_domain: Option<String>,
}

/// Builds and signs dashboard embed URLs.
#[derive(Clone)]
pub struct OmniDashboardEmbedder {
    embed_login_url: String,
    embed_secret: String,
    nonces: Arc<dyn NonceSource>,
}

impl OmniDashboardEmbedder {
    /// Configure from `options`, falling back to the process environment.
    pub fn new(options: EmbedderOptions) -> Result<Self, ConfigError> {
        Self::with_source(options, &ProcessEnv)
    }

    /// Configure from `options`, falling back to `source`.
    ///
    /// All missing settings are reported together.
    pub fn with_source(
        options: EmbedderOptions,
        source: &dyn ConfigSource,
    ) -> Result<Self, ConfigError> {
        let secret = config::resolve(
            options.embed_secret.as_deref(),
            source,
            ConfigField::EmbedSecret,
        );
        let host = config::resolve_host(
            options.vanity_domain.as_deref(),
            options.organization_name.as_deref(),
            source,
        );

        let (embed_secret, host) = match (secret, host) {
            (Some(secret), Some(host)) => (secret, host),
            (secret, host) => {
                let mut missing = MissingFields::default();
                if secret.is_none() {
                    missing.field(ConfigField::EmbedSecret);
                }
                if host.is_none() {
                    missing.one_of(&[ConfigField::VanityDomain, ConfigField::OrganizationName]);
                }
                return Err(missing.into_error());
            }
        };
        let embed_login_url = format!("https://{}/embed/login", host.host());
        info!("Embed URLs will use {}", embed_login_url);

        Ok(Self {
            embed_login_url,
            embed_secret,
            nonces: Arc::new(RandomNonce),
        })
    }

    /// Replace the nonce generator.
    pub fn with_nonce_source(mut self, nonces: impl NonceSource + 'static) -> Self {
        self.nonces = Arc::new(nonces);
        self
    }

    /// Base of every URL this embedder builds.
    pub fn embed_login_url(&self) -> &str {
        &self.embed_login_url
    }

    /// Build and sign an embed URL, rendered as a string.
    pub fn build_url(&self, request: &EmbedRequest) -> Result<String, EmbedError> {
        self.build(request)?.to_url()
    }

    /// Build and sign an embed URL, keeping the individual parameters.
    pub fn build(&self, request: &EmbedRequest) -> Result<DashboardEmbedUrl, EmbedError> {
        let filter_search_param = match &request.filter_search_params {
            Some(search) => search.wire_value()?,
            None => None,
        };

        let mut url = DashboardEmbedUrl {
            base_url: self.embed_login_url.clone(),
            content_path: request.content_path.clone(),
            external_id: request.external_id.clone(),
            name: request.name.clone(),
            nonce: self.nonces.nonce(),
            access_boost: flag(request.access_boost),
            connection_roles: compact(&request.connection_roles),
            custom_theme: compact(&request.custom_theme),
            custom_theme_id: optional(&request.custom_theme_id),
            email: optional(&request.email),
            entity: optional(&request.entity),
            entity_folder_content_role: request
                .entity_folder_content_role
                .map(|r| r.as_str().to_string()),
            entity_folder_group_content_role: request
                .entity_folder_group_content_role
                .map(|r| r.as_str().to_string()),
            entity_folder_label: optional(&request.entity_folder_label),
            entity_group_label: optional(&request.entity_group_label),
            filter_search_param,
            groups: (!request.groups.is_empty())
                .then(|| to_compact_string(&Value::from(request.groups.clone()))),
            link_access: request.link_access.wire_value(),
            mode: request.mode.map(|m| m.as_str().to_string()),
            model_roles: compact(&request.model_roles),
            prefers_dark: request.prefers_dark.map(|p| p.as_str().to_string()),
            preserve_entity_folder_content_role: flag(request.preserve_entity_folder_content_role),
            theme: request.theme.map(|t| t.as_str().to_string()),
            ui_settings: compact(&request.ui_settings),
            user_attributes: compact(&request.user_attributes),
            signature: None,
        };
        url.sign(self.embed_secret.as_bytes());

        debug!(
            "Built embed URL for {} (external id {})",
            url.content_path, url.external_id
        );
        Ok(url)
    }

    /// Whether `url` carries a valid signature for this embedder's secret.
    pub fn verify(&self, url: &DashboardEmbedUrl) -> bool {
        url.verify(self.embed_secret.as_bytes())
    }
}

impl fmt::Debug for OmniDashboardEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OmniDashboardEmbedder")
            .field("embed_login_url", &self.embed_login_url)
            .field("embed_secret", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for EmbedderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbedderOptions")
            .field("organization_name", &self.organization_name)
            .field(
                "embed_secret",
                &self.embed_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("vanity_domain", &self.vanity_domain)
            .finish()
    }
}

fn flag(enabled: bool) -> Option<String> {
    enabled.then(|| "true".to_string())
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn optional(value: &Option<String>) -> Option<String> {
    value.as_deref().and_then(non_empty)
}

fn compact(value: &Option<Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) if map.is_empty() => None,
        Some(Value::Array(items)) if items.is_empty() => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(value) => Some(to_compact_string(value)),
    }
}
