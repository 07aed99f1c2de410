//! Runtime configuration for the Supabase client and Google OAuth. The site is
//! deployed as static files, so every value is looked up at page load from an
//! ordered list of sources: injected `window` globals, `<meta>` tags, `data-*`
//! attributes, and finally the query string (a development escape hatch).
//! The first non-empty hit wins. Configuration values are public; do not store
//! secrets here.

use super::errors::AppError;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

pub const SUPABASE_URL: &str = "SUPABASE_URL";
pub const SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
pub const GOOGLE_CLIENT_ID: &str = "GOOGLE_CLIENT_ID";
pub const AUTH_REDIRECT_URL: &str = "AUTH_REDIRECT_URL";

/// Global holding the legacy nested config object.
pub const LEGACY_CONFIG_GLOBAL: &str = "AI_DAY_CONFIG";

/// Where OAuth sends the browser back to when no override is configured.
pub const DEFAULT_REDIRECT_URL: &str = "https://zlgan-spec.github.io/ai-day-website/";

/// Frontend configuration resolved once per page load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub endpoint_url: String,
    pub endpoint_key: String,
    pub oauth_client_id: String,
    pub redirect_url: String,
}

impl AppConfig {
    /// Required keys that are still empty.
    #[must_use]
    pub fn missing_keys(&self) -> Vec<&'static str> {
        [
            (SUPABASE_URL, &self.endpoint_url),
            (SUPABASE_ANON_KEY, &self.endpoint_key),
            (GOOGLE_CLIENT_ID, &self.oauth_client_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(key, _)| key)
        .collect()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_keys().is_empty()
    }

    /// Replaces the held values with `next` if it is complete.
    pub fn update(&mut self, next: AppConfig) -> bool {
        if !next.is_complete() {
            warn!(missing = ?next.missing_keys(), "Rejected incomplete config update");
            return false;
        }
        *self = next;
        debug!("Config updated");
        true
    }

    fn into_result(self) -> Result<Self, AppError> {
        let missing = self.missing_keys();
        if missing.is_empty() {
            Ok(self)
        } else {
            Err(AppError::Config { missing })
        }
    }
}

/// One lookup strategy. Implementations return the raw value for `key`, or
/// `None` when this source does not define it.
pub trait ConfigSource {
    fn name(&self) -> &'static str;

    fn lookup(&self, key: &str) -> Option<String>;

    /// Sources only meant for local testing log a warning when they are used.
    fn development_only(&self) -> bool {
        false
    }
}

/// Fixed key/value source, used for injected maps and in tests.
#[derive(Clone, Debug, Default)]
pub struct StaticSource {
    name: &'static str,
    values: HashMap<String, String>,
}

impl StaticSource {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            values: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl ConfigSource for StaticSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Query-string parameters, matched on the lowercased key.
#[derive(Clone, Debug, Default)]
pub struct QuerySource {
    pairs: Vec<(String, String)>,
}

impl QuerySource {
    /// Parses `?a=1&b=2` (leading `?` optional).
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let query = query.trim().trim_start_matches('?');
        let pairs = url::form_urlencoded::parse(query.as_bytes())
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        Self { pairs }
    }
}

impl ConfigSource for QuerySource {
    fn name(&self) -> &'static str {
        "query"
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let wanted = key.to_lowercase();
        self.pairs
            .iter()
            .find(|(name, _)| *name == wanted)
            .map(|(_, value)| value.clone())
    }

    fn development_only(&self) -> bool {
        true
    }
}

/// The older nested object injected as `window.AI_DAY_CONFIG`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LegacyConfig {
    pub supabase: LegacySupabase,
    pub google: LegacyGoogle,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LegacySupabase {
    pub url: String,
    pub anon_key: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LegacyGoogle {
    pub client_id: String,
}

impl LegacyConfig {
    fn into_config(self, redirect_url: String) -> AppConfig {
        AppConfig {
            endpoint_url: self.supabase.url.trim().to_string(),
            endpoint_key: self.supabase.anon_key.trim().to_string(),
            oauth_client_id: self.google.client_id.trim().to_string(),
            redirect_url,
        }
    }
}

/// Ordered source chain; earlier sources take precedence.
#[derive(Default)]
pub struct Resolver {
    sources: Vec<Box<dyn ConfigSource>>,
    legacy: Option<LegacyConfig>,
}

impl Resolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Sets the legacy object consulted when the per-key chain is incomplete.
    #[must_use]
    pub fn with_legacy(mut self, legacy: Option<LegacyConfig>) -> Self {
        self.legacy = legacy;
        self
    }

    /// Returns the first non-empty value for `key` across all sources.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<String> {
        self.sources.iter().find_map(|source| {
            let value = source.lookup(key).as_deref().and_then(normalize_runtime_value)?;
            if source.development_only() {
                warn!(key, source = source.name(), "Using development-only config source");
            } else {
                debug!(key, source = source.name(), "Resolved config value");
            }
            Some(value)
        })
    }

    /// Resolves every required value, falling back to the legacy object.
    ///
    /// # Errors
    /// Returns `AppError::Config` naming each key no source could provide.
    pub fn resolve(&self) -> Result<AppConfig, AppError> {
        let redirect_url =
            self.lookup(AUTH_REDIRECT_URL).unwrap_or_else(|| DEFAULT_REDIRECT_URL.to_string());
        let config = AppConfig {
            endpoint_url: self.lookup(SUPABASE_URL).unwrap_or_default(),
            endpoint_key: self.lookup(SUPABASE_ANON_KEY).unwrap_or_default(),
            oauth_client_id: self.lookup(GOOGLE_CLIENT_ID).unwrap_or_default(),
            redirect_url,
        };
        if config.is_complete() {
            return Ok(config);
        }

        warn!(missing = ?config.missing_keys(), "Per-key config incomplete, trying legacy object");
        match &self.legacy {
            Some(legacy) => {
                let fallback = legacy.clone().into_config(config.redirect_url.clone());
                if fallback.is_complete() {
                    debug!("Using legacy config object");
                    Ok(fallback)
                } else {
                    config.into_result()
                }
            }
            None => config.into_result(),
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod page {
    use super::{ConfigSource, LEGACY_CONFIG_GLOBAL, LegacyConfig, QuerySource, Resolver};
    use tracing::warn;
    use wasm_bindgen::JsValue;

    /// Values injected as `window.KEY` by the deploy pipeline.
    pub struct GlobalSource;

    impl ConfigSource for GlobalSource {
        fn name(&self) -> &'static str {
            "global"
        }

        fn lookup(&self, key: &str) -> Option<String> {
            let window = web_sys::window()?;
            js_sys::Reflect::get(&window, &JsValue::from_str(key))
                .ok()?
                .as_string()
        }
    }

    /// `<meta name="KEY" content="...">`.
    pub struct MetaTagSource;

    impl ConfigSource for MetaTagSource {
        fn name(&self) -> &'static str {
            "meta"
        }

        fn lookup(&self, key: &str) -> Option<String> {
            let document = web_sys::window()?.document()?;
            document
                .query_selector(&format!("meta[name=\"{key}\"]"))
                .ok()??
                .get_attribute("content")
        }
    }

    /// `data-key` attribute on any element.
    pub struct DataAttributeSource;

    impl ConfigSource for DataAttributeSource {
        fn name(&self) -> &'static str {
            "data-attribute"
        }

        fn lookup(&self, key: &str) -> Option<String> {
            let attribute = format!("data-{}", key.to_lowercase());
            let document = web_sys::window()?.document()?;
            document
                .query_selector(&format!("[{attribute}]"))
                .ok()??
                .get_attribute(&attribute)
        }
    }

    fn legacy_config() -> Option<LegacyConfig> {
        let window = web_sys::window()?;
        let value = js_sys::Reflect::get(&window, &JsValue::from_str(LEGACY_CONFIG_GLOBAL)).ok()?;
        if value.is_null() || value.is_undefined() {
            return None;
        }
        let json = js_sys::JSON::stringify(&value).ok()?.as_string()?;
        match serde_json::from_str(&json) {
            Ok(legacy) => Some(legacy),
            Err(err) => {
                warn!("Ignoring malformed {LEGACY_CONFIG_GLOBAL}: {err}");
                None
            }
        }
    }

    impl Resolver {
        /// The full browser chain in precedence order.
        #[must_use]
        pub fn from_page() -> Self {
            let query = web_sys::window()
                .and_then(|window| window.location().search().ok())
                .unwrap_or_default();
            Resolver::new()
                .with_source(GlobalSource)
                .with_source(MetaTagSource)
                .with_source(DataAttributeSource)
                .with_source(QuerySource::parse(&query))
                .with_legacy(legacy_config())
        }
    }
}

fn normalize_runtime_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_source(name: &'static str, prefix: &str) -> StaticSource {
        StaticSource::new(name)
            .with(SUPABASE_URL, &format!("https://{prefix}.supabase.co"))
            .with(SUPABASE_ANON_KEY, &format!("{prefix}-anon"))
            .with(GOOGLE_CLIENT_ID, &format!("{prefix}-client"))
    }

    #[test]
    fn normalize_runtime_value_trims_and_rejects_empty() {
        assert_eq!(normalize_runtime_value(""), None);
        assert_eq!(normalize_runtime_value("   "), None);
        assert_eq!(
            normalize_runtime_value("  https://x.supabase.co "),
            Some("https://x.supabase.co".to_string())
        );
    }

    #[test]
    fn first_source_wins() {
        let resolver = Resolver::new()
            .with_source(complete_source("global", "first"))
            .with_source(complete_source("meta", "second"));

        let config = resolver.resolve().expect("complete config");
        assert_eq!(config.endpoint_url, "https://first.supabase.co");
        assert_eq!(config.endpoint_key, "first-anon");
        assert_eq!(config.oauth_client_id, "first-client");
        assert_eq!(config.redirect_url, DEFAULT_REDIRECT_URL);
    }

    #[test]
    fn blank_values_fall_through_to_later_sources() {
        let resolver = Resolver::new()
            .with_source(StaticSource::new("global").with(SUPABASE_URL, "   "))
            .with_source(StaticSource::new("meta").with(SUPABASE_URL, "https://meta.supabase.co"))
            .with_source(
                StaticSource::new("data")
                    .with(SUPABASE_ANON_KEY, "data-anon")
                    .with(GOOGLE_CLIENT_ID, "data-client"),
            );

        let config = resolver.resolve().expect("complete config");
        assert_eq!(config.endpoint_url, "https://meta.supabase.co");
        assert_eq!(config.endpoint_key, "data-anon");
        assert_eq!(config.oauth_client_id, "data-client");
    }

    #[test]
    fn missing_keys_are_all_reported() {
        let resolver = Resolver::new()
            .with_source(StaticSource::new("global").with(SUPABASE_URL, "https://x.supabase.co"));

        let err = resolver.resolve().unwrap_err();
        assert_eq!(
            err,
            AppError::Config {
                missing: vec![SUPABASE_ANON_KEY, GOOGLE_CLIENT_ID]
            }
        );
    }

    #[test]
    fn empty_chain_fails() {
        assert!(matches!(
            Resolver::new().resolve(),
            Err(AppError::Config { missing }) if missing.len() == 3
        ));
    }

    #[test]
    fn query_source_matches_lowercase_and_decodes() {
        let query = QuerySource::parse(
            "?supabase_url=https%3A%2F%2Fq.supabase.co&supabase_anon_key=q+anon&google_client_id=q",
        );
        assert_eq!(
            query.lookup(SUPABASE_URL),
            Some("https://q.supabase.co".to_string())
        );
        assert_eq!(query.lookup(SUPABASE_ANON_KEY), Some("q anon".to_string()));
        assert_eq!(query.lookup("SUPABASE_URL_EXTRA"), None);
        assert!(query.development_only());
    }

    #[test]
    fn query_source_is_last_resort() {
        let resolver = Resolver::new()
            .with_source(complete_source("global", "page"))
            .with_source(QuerySource::parse(
                "supabase_url=https://evil.example&supabase_anon_key=x&google_client_id=y",
            ));

        let config = resolver.resolve().expect("complete config");
        assert_eq!(config.endpoint_url, "https://page.supabase.co");
    }

    #[test]
    fn redirect_override_is_used() {
        let resolver = Resolver::new().with_source(
            complete_source("global", "site").with(AUTH_REDIRECT_URL, "http://localhost:8080/"),
        );
        let config = resolver.resolve().expect("complete config");
        assert_eq!(config.redirect_url, "http://localhost:8080/");
    }

    #[test]
    fn legacy_object_fills_incomplete_chain() {
        let legacy: LegacyConfig = serde_json::from_str(
            r#"{"supabase":{"url":"https://legacy.supabase.co","anon_key":"legacy-anon"},"google":{"client_id":"legacy-client"}}"#,
        )
        .expect("legacy json");
        let resolver = Resolver::new()
            .with_source(StaticSource::new("global").with(SUPABASE_URL, "https://x.supabase.co"))
            .with_legacy(Some(legacy));

        let config = resolver.resolve().expect("legacy config");
        assert_eq!(config.endpoint_url, "https://legacy.supabase.co");
        assert_eq!(config.endpoint_key, "legacy-anon");
        assert_eq!(config.oauth_client_id, "legacy-client");
    }

    #[test]
    fn incomplete_legacy_object_is_rejected() {
        let legacy: LegacyConfig =
            serde_json::from_str(r#"{"supabase":{"url":"https://legacy.supabase.co"}}"#)
                .expect("legacy json");
        let resolver = Resolver::new().with_legacy(Some(legacy));

        assert!(matches!(resolver.resolve(), Err(AppError::Config { .. })));
    }

    #[test]
    fn update_rejects_incomplete_config() {
        let mut config = Resolver::new()
            .with_source(complete_source("global", "site"))
            .resolve()
            .expect("complete config");
        let before = config.clone();

        let mut incomplete = before.clone();
        incomplete.endpoint_key = String::new();
        assert!(!config.update(incomplete));
        assert_eq!(config, before);

        let mut next = before.clone();
        next.endpoint_url = "https://next.supabase.co".to_string();
        assert!(config.update(next));
        assert_eq!(config.endpoint_url, "https://next.supabase.co");
    }
}
