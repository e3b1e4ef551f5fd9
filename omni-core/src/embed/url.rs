//! Signed embed login URL.
//!
//! The signature covers the login URL followed by every present parameter in
//! the order of [`DashboardEmbedUrl::params`], joined with `\n`. The
//! verifying server rebuilds the same blob, so this order is a wire contract
//! and only ever grows by appending new parameters at their documented slot.

use std::collections::HashSet;

use super::EmbedError;
use crate::signing;

/// Every parameter of an embed login URL, already normalized to its wire string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardEmbedUrl {
    /// `https://{host}/embed/login`
    pub base_url: String,
    pub content_path: String,
    pub external_id: String,
    pub name: String,
    pub nonce: String,
    pub access_boost: Option<String>,
    pub connection_roles: Option<String>,
    pub custom_theme: Option<String>,
    pub custom_theme_id: Option<String>,
    pub email: Option<String>,
    pub entity: Option<String>,
    pub entity_folder_content_role: Option<String>,
    pub entity_folder_group_content_role: Option<String>,
    pub entity_folder_label: Option<String>,
    pub entity_group_label: Option<String>,
    pub filter_search_param: Option<String>,
    pub groups: Option<String>,
    pub link_access: Option<String>,
    pub mode: Option<String>,
    pub model_roles: Option<String>,
    pub prefers_dark: Option<String>,
    pub preserve_entity_folder_content_role: Option<String>,
    pub theme: Option<String>,
    pub ui_settings: Option<String>,
    pub user_attributes: Option<String>,
    pub signature: Option<String>,
}

impl DashboardEmbedUrl {
    /// Present parameters in signing order. Excludes the signature.
    pub fn params(&self) -> Vec<(&'static str, &str)> {
        let optional = [
            ("accessBoost", &self.access_boost),
            ("connectionRoles", &self.connection_roles),
            ("customTheme", &self.custom_theme),
            ("customThemeId", &self.custom_theme_id),
            ("email", &self.email),
            ("entity", &self.entity),
            ("entityFolderContentRole", &self.entity_folder_content_role),
            (
                "entityFolderGroupContentRole",
                &self.entity_folder_group_content_role,
            ),
            ("entityFolderLabel", &self.entity_folder_label),
            ("entityGroupLabel", &self.entity_group_label),
            ("filterSearchParam", &self.filter_search_param),
            ("groups", &self.groups),
            ("linkAccess", &self.link_access),
            ("mode", &self.mode),
            ("modelRoles", &self.model_roles),
            ("prefersDark", &self.prefers_dark),
            (
                "preserveEntityFolderContentRole",
                &self.preserve_entity_folder_content_role,
            ),
            ("theme", &self.theme),
            ("uiSettings", &self.ui_settings),
            ("userAttributes", &self.user_attributes),
        ];

        let mut params = vec![
            ("contentPath", self.content_path.as_str()),
            ("externalId", self.external_id.as_str()),
            ("name", self.name.as_str()),
            ("nonce", self.nonce.as_str()),
        ];
        params.extend(
            optional
                .into_iter()
                .filter_map(|(key, value)| value.as_deref().map(|v| (key, v))),
        );
        params
    }

    /// The exact string that gets signed.
    pub fn signing_blob(&self) -> String {
        let mut blob = self.base_url.clone();
        for (_, value) in self.params() {
            blob.push('\n');
            blob.push_str(value);
        }
        blob
    }

    /// Compute the signature (base64url, padded) and store it on the URL.
    pub fn sign(&mut self, secret: &[u8]) {
        self.signature = Some(signing::sign(secret, &self.signing_blob()));
    }

    /// Check the stored signature against `secret`. Unsigned URLs never verify.
    pub fn verify(&self, secret: &[u8]) -> bool {
        match &self.signature {
            Some(signature) => signing::verify(secret, &self.signing_blob(), signature),
            None => false,
        }
    }

    /// Render the full URL with `signature` as the last query parameter.
    pub fn to_url(&self) -> Result<String, EmbedError> {
        let mut params = self.params();
        if let Some(signature) = &self.signature {
            params.push(("signature", signature.as_str()));
        }
        let query = serde_urlencoded::to_string(params)?;
        Ok(format!("{}?{}", self.base_url, query))
    }

    /// Parse a rendered embed login URL back into its parameters.
    ///
    /// Every key may appear once, and `signature`, if present, must come last.
    pub fn parse(url: &str) -> Result<Self, EmbedError> {
        let (base_url, query) = url
            .split_once('?')
            .ok_or_else(|| EmbedError::Parse("missing query string".to_string()))?;
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_str(query).map_err(|e| EmbedError::Parse(e.to_string()))?;

        let mut parsed = DashboardEmbedUrl {
            base_url: base_url.to_string(),
            ..Default::default()
        };
        if let Some(position) = pairs.iter().position(|(key, _)| key == "signature") {
            if position + 1 != pairs.len() {
                return Err(EmbedError::Parse(
                    "signature must be the last parameter".to_string(),
                ));
            }
        }
        let mut seen = HashSet::new();
        if let Some((key, _)) = pairs.iter().find(|(key, _)| !seen.insert(key.as_str())) {
            return Err(EmbedError::Parse(format!("repeated parameter {key}")));
        }

        let (mut content_path, mut external_id, mut name, mut nonce) = (None, None, None, None);
        for (key, value) in pairs {
            match key.as_str() {
                "contentPath" => content_path = Some(value),
                "externalId" => external_id = Some(value),
                "name" => name = Some(value),
                "nonce" => nonce = Some(value),
                other => match parsed.optional_slot(other) {
                    Some(slot) => *slot = Some(value),
                    None => return Err(EmbedError::Parse(format!("unknown parameter {other}"))),
                },
            }
        }

        let required = |value: Option<String>, key: &str| {
            value.ok_or_else(|| EmbedError::Parse(format!("missing parameter {key}")))
        };
        parsed.content_path = required(content_path, "contentPath")?;
        parsed.external_id = required(external_id, "externalId")?;
        parsed.name = required(name, "name")?;
        parsed.nonce = required(nonce, "nonce")?;
        Ok(parsed)
    }

    fn optional_slot(&mut self, key: &str) -> Option<&mut Option<String>> {
        let slot = match key {
            "accessBoost" => &mut self.access_boost,
            "connectionRoles" => &mut self.connection_roles,
            "customTheme" => &mut self.custom_theme,
            "customThemeId" => &mut self.custom_theme_id,
            "email" => &mut self.email,
            "entity" => &mut self.entity,
            "entityFolderContentRole" => &mut self.entity_folder_content_role,
            "entityFolderGroupContentRole" => &mut self.entity_folder_group_content_role,
            "entityFolderLabel" => &mut self.entity_folder_label,
            "entityGroupLabel" => &mut self.entity_group_label,
            "filterSearchParam" => &mut self.filter_search_param,
            "groups" => &mut self.groups,
            "linkAccess" => &mut self.link_access,
            "mode" => &mut self.mode,
            "modelRoles" => &mut self.model_roles,
            "prefersDark" => &mut self.prefers_dark,
            "preserveEntityFolderContentRole" => &mut self.preserve_entity_folder_content_role,
            "theme" => &mut self.theme,
            "uiSettings" => &mut self.ui_settings,
            "userAttributes" => &mut self.user_attributes,
            "signature" => &mut self.signature,
            _ => return None,
        };
        Some(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"super_secret";

    fn basic() -> DashboardEmbedUrl {
        DashboardEmbedUrl {
            base_url: "https://acme.embed-omniapp.co/embed/login".into(),
            content_path: "/dashboards/da24491e".into(),
            external_id: "1".into(),
            name: "Somebody".into(),
            nonce: "365f7003aa5b4f3586d9b81b4a5d9f69".into(),
            ..Default::default()
        }
    }

    #[test]
    fn blob_starts_with_login_url_and_skips_absent_params() {
        let mut url = basic();
        url.theme = Some("dawn".into());
        assert_eq!(
            url.signing_blob(),
            "https://acme.embed-omniapp.co/embed/login\n/dashboards/da24491e\n1\nSomebody\n\
             365f7003aa5b4f3586d9b81b4a5d9f69\ndawn"
        );
    }

    #[test]
    fn signature_is_never_part_of_the_blob() {
        let mut url = basic();
        let before = url.signing_blob();
        url.sign(SECRET);
        assert_eq!(url.signing_blob(), before);
    }

    #[test]
    fn sign_matches_known_value() {
        let mut url = basic();
        url.sign(SECRET);
        assert_eq!(
            url.signature.as_deref(),
            Some("mToqUfdkmVSyDIGAl6Ggs9uAmGQAH9OzbbCZ-xgEU8c=")
        );
        assert!(url.verify(SECRET));
        assert!(!url.verify(b"other_secret"));
    }

    #[test]
    fn tampering_breaks_verification() {
        let mut url = basic();
        url.sign(SECRET);
        url.external_id = "2".into();
        assert!(!url.verify(SECRET));
    }

    #[test]
    fn unsigned_or_garbled_signatures_do_not_verify() {
        let mut url = basic();
        assert!(!url.verify(SECRET));
        url.signature = Some("not base64!".into());
        assert!(!url.verify(SECRET));
    }

    #[test]
    fn signature_is_rendered_last() {
        let mut url = basic();
        url.user_attributes = Some(r#"{"country":"USA"}"#.into());
        url.sign(SECRET);
        let rendered = url.to_url().unwrap();
        let query = rendered.split_once('?').unwrap().1;
        let last = query.rsplit('&').next().unwrap();
        assert!(last.starts_with("signature="));
        assert!(query.contains("userAttributes=%7B%22country%22%3A%22USA%22%7D&signature="));
    }

    #[test]
    fn parse_restores_rendered_url() {
        let mut url = basic();
        url.link_access = Some("abcd1234,efgh5678".into());
        url.filter_search_param = Some("state=GA&county=Fulton".into());
        url.sign(SECRET);

        let parsed = DashboardEmbedUrl::parse(&url.to_url().unwrap()).unwrap();
        assert_eq!(parsed, url);
        assert!(parsed.verify(SECRET));
    }

    #[test]
    fn parse_rejects_incomplete_urls() {
        assert!(matches!(
            DashboardEmbedUrl::parse("https://acme.embed-omniapp.co/embed/login"),
            Err(EmbedError::Parse(_))
        ));
        assert!(matches!(
            DashboardEmbedUrl::parse("https://h/embed/login?contentPath=x&externalId=1&name=n"),
            Err(EmbedError::Parse(msg)) if msg.contains("nonce")
        ));
        assert!(matches!(
            DashboardEmbedUrl::parse(
                "https://h/embed/login?contentPath=x&externalId=1&name=n&nonce=a&bogus=1"
            ),
            Err(EmbedError::Parse(msg)) if msg.contains("bogus")
        ));
        assert!(matches!(
            DashboardEmbedUrl::parse(
                "https://h/embed/login?contentPath=a&contentPath=b&externalId=1&name=n&nonce=z"
            ),
            Err(EmbedError::Parse(msg)) if msg.contains("contentPath")
        ));
        assert!(matches!(
            DashboardEmbedUrl::parse(
                "https://h/embed/login?contentPath=a&externalId=1&name=n&nonce=z\
                 &signature=AAAA&entity=late"
            ),
            Err(EmbedError::Parse(msg)) if msg.contains("last")
        ));
        assert!(matches!(
            DashboardEmbedUrl::parse(
                "https://h/embed/login?contentPath=a&externalId=1&name=n&nonce=z\
                 &signature=AAAA&signature=BBBB"
            ),
            Err(EmbedError::Parse(_))
        ));
    }
}
