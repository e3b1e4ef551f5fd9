//! Configuration for the SDK: explicit arguments first, then an injected
//! [`ConfigSource`] (normally the process environment) as a fallback.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Every required setting that was found neither in the arguments nor in
    /// the configuration source.
    #[error(
        "Omni SDK has not been configured correctly. You must pass the arguments {arguments:?} \
         and/or set the environment variables {variables:?}. Please see the documentation for \
         more information on configuration."
    )]
    Missing {
        arguments: Vec<String>,
        variables: Vec<String>,
    },
    #[error("Failed to load {path}: {message}")]
    Dotenv { path: String, message: String },
}

/// Source of fallback configuration values.
pub trait ConfigSource: Send + Sync {
    /// Look up a variable by its full name (e.g. `OMNI_EMBED_SECRET`).
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl ConfigSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Fixed set of variables, e.g. for tests or configuration loaded from a file.
#[derive(Debug, Clone, Default)]
pub struct StaticEnv {
    vars: HashMap<String, String>,
}

impl StaticEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Load variables from a `.env` file without touching the process environment.
    pub fn from_dotenv(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let dotenv_err = |e: dotenvy::Error| {
            warn!("Failed to read {}: {}", path.display(), e);
            ConfigError::Dotenv {
                path: path.display().to_string(),
                message: e.to_string(),
            }
        };

        let mut vars = HashMap::new();
        for item in dotenvy::from_path_iter(path).map_err(dotenv_err)? {
            let (key, value) = item.map_err(dotenv_err)?;
            vars.insert(key, value);
        }
        debug!("Loaded {} variables from {}", vars.len(), path.display());
        Ok(Self { vars })
    }
}

impl ConfigSource for StaticEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Settings that can fall back to the configuration source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    OrganizationName,
    VanityDomain,
    EmbedSecret,
}

impl ConfigField {
    /// Argument name as callers pass it.
    pub fn name(&self) -> &'static str {
        match self {
            ConfigField::OrganizationName => "organization_name",
            ConfigField::VanityDomain => "vanity_domain",
            ConfigField::EmbedSecret => "embed_secret",
        }
    }

    /// `OMNI_` followed by the uppercased argument name.
    pub fn env_var(&self) -> String {
        format!("OMNI_{}", self.name().to_uppercase())
    }
}

/// Return the explicit value if present, otherwise the source's value.
///
/// Empty strings count as absent in both places.
pub fn resolve(
    explicit: Option<&str>,
    source: &dyn ConfigSource,
    field: ConfigField,
) -> Option<String> {
    if let Some(value) = explicit.filter(|v| !v.is_empty()) {
        return Some(value.to_string());
    }
    let value = source.var(&field.env_var()).filter(|v| !v.is_empty());
    if value.is_some() {
        debug!("Using {} from {}", field.name(), field.env_var());
    }
    value
}

/// Where the embed login host comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedHost {
    /// Custom domain, used verbatim.
    Vanity(String),
    /// Omni organization, served from `{name}.embed-omniapp.co`.
    Organization(String),
}

impl EmbedHost {
    pub fn host(&self) -> String {
        match self {
            EmbedHost::Vanity(domain) => domain.clone(),
            EmbedHost::Organization(name) => format!("{name}.embed-omniapp.co"),
        }
    }
}

/// Pick the embed host.
///
/// Precedence: explicit vanity domain, explicit organization name,
/// `OMNI_VANITY_DOMAIN`, `OMNI_ORGANIZATION_NAME`.
pub fn resolve_host(
    vanity_domain: Option<&str>,
    organization_name: Option<&str>,
    source: &dyn ConfigSource,
) -> Option<EmbedHost> {
    vanity_domain
        .filter(|v| !v.is_empty())
        .map(|v| EmbedHost::Vanity(v.to_string()))
        .or_else(|| {
            organization_name
                .filter(|v| !v.is_empty())
                .map(|v| EmbedHost::Organization(v.to_string()))
        })
        .or_else(|| resolve(None, source, ConfigField::VanityDomain).map(EmbedHost::Vanity))
        .or_else(|| resolve(None, source, ConfigField::OrganizationName).map(EmbedHost::Organization))
}

/// Accumulates missing settings so they can be reported in one error.
#[derive(Debug, Default)]
pub(crate) struct MissingFields {
    arguments: Vec<String>,
    variables: Vec<String>,
}

impl MissingFields {
    pub(crate) fn field(&mut self, field: ConfigField) {
        self.arguments.push(field.name().to_string());
        self.variables.push(field.env_var());
    }

    /// Record a requirement satisfied by any one of `fields`.
    pub(crate) fn one_of(&mut self, fields: &[ConfigField]) {
        let names: Vec<&str> = fields.iter().map(|f| f.name()).collect();
        let vars: Vec<String> = fields.iter().map(|f| f.env_var()).collect();
        self.arguments.push(names.join(" or "));
        self.variables.push(vars.join(" or "));
    }

    pub(crate) fn into_error(self) -> ConfigError {
        ConfigError::Missing {
            arguments: self.arguments,
            variables: self.variables,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn env_var_names_follow_prefix_convention() {
        assert_eq!(ConfigField::EmbedSecret.env_var(), "OMNI_EMBED_SECRET");
        assert_eq!(
            ConfigField::OrganizationName.env_var(),
            "OMNI_ORGANIZATION_NAME"
        );
        assert_eq!(ConfigField::VanityDomain.env_var(), "OMNI_VANITY_DOMAIN");
    }

    #[test]
    fn explicit_value_wins_over_source() {
        let env = StaticEnv::new().with("OMNI_EMBED_SECRET", "from-env");
        assert_eq!(
            resolve(Some("explicit"), &env, ConfigField::EmbedSecret).as_deref(),
            Some("explicit")
        );
        assert_eq!(
            resolve(None, &env, ConfigField::EmbedSecret).as_deref(),
            Some("from-env")
        );
    }

    #[test]
    fn empty_values_are_absent() {
        let env = StaticEnv::new().with("OMNI_EMBED_SECRET", "");
        assert_eq!(resolve(Some(""), &env, ConfigField::EmbedSecret), None);
    }

    #[test]
    fn host_precedence() {
        let env = StaticEnv::new()
            .with("OMNI_VANITY_DOMAIN", "env.example.com")
            .with("OMNI_ORGANIZATION_NAME", "envorg");

        assert_eq!(
            resolve_host(Some("foo.example.com"), Some("acme"), &env),
            Some(EmbedHost::Vanity("foo.example.com".into()))
        );
        assert_eq!(
            resolve_host(None, Some("acme"), &env),
            Some(EmbedHost::Organization("acme".into()))
        );
        assert_eq!(
            resolve_host(None, None, &env),
            Some(EmbedHost::Vanity("env.example.com".into()))
        );

        let org_only = StaticEnv::new().with("OMNI_ORGANIZATION_NAME", "envorg");
        assert_eq!(
            resolve_host(None, None, &org_only).map(|h| h.host()),
            Some("envorg.embed-omniapp.co".to_string())
        );
        assert_eq!(resolve_host(None, None, &StaticEnv::new()), None);
    }

    #[test]
    fn missing_fields_are_reported_together() {
        let mut missing = MissingFields::default();
        missing.field(ConfigField::EmbedSecret);
        missing.one_of(&[ConfigField::VanityDomain, ConfigField::OrganizationName]);

        let err = missing.into_error();
        match &err {
            ConfigError::Missing {
                arguments,
                variables,
            } => {
                assert_eq!(
                    arguments,
                    &["embed_secret", "vanity_domain or organization_name"]
                );
                assert_eq!(
                    variables,
                    &[
                        "OMNI_EMBED_SECRET",
                        "OMNI_VANITY_DOMAIN or OMNI_ORGANIZATION_NAME"
                    ]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let message = err.to_string();
        assert!(message.contains("embed_secret"));
        assert!(message.contains("OMNI_ORGANIZATION_NAME"));
    }

    #[test]
    fn loads_dotenv_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".env");
        std::fs::write(
            &path,
            "OMNI_ORGANIZATION_NAME=acme\n# comment\nOMNI_EMBED_SECRET=\"super_secret\"\n",
        )
        .unwrap();

        let env = StaticEnv::from_dotenv(&path).unwrap();
        assert_eq!(env.var("OMNI_ORGANIZATION_NAME").as_deref(), Some("acme"));
        assert_eq!(env.var("OMNI_EMBED_SECRET").as_deref(), Some("super_secret"));
        assert_eq!(env.var("OMNI_VANITY_DOMAIN"), None);
    }

    #[test]
    fn missing_dotenv_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = StaticEnv::from_dotenv(tmp.path().join("nope.env")).unwrap_err();
        assert!(matches!(err, ConfigError::Dotenv { .. }));
    }
}
