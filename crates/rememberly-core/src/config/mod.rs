//! Client configuration.
//!
//! The Supabase project URL and anon key are public values shipped with the
//! client. They come from the environment or from a CLI profile.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

pub const SUPABASE_URL_ENV: &str = "SUPABASE_URL";
pub const SUPABASE_ANON_KEY_ENV: &str = "SUPABASE_ANON_KEY";
pub const SUMMARIZER_URL_ENV: &str = "REMEMBERLY_SUMMARIZER_URL";

/// Validated endpoints for the remote backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    #[serde(default)]
    pub summarizer_url: Option<String>,
}

impl ClientConfig {
    /// Build a config from raw values, trimming and validating them.
    pub fn from_parts(
        supabase_url: Option<String>,
        supabase_anon_key: Option<String>,
        summarizer_url: Option<String>,
    ) -> Result<Self> {
        let (Some(supabase_url), Some(supabase_anon_key)) = (
            normalize_text_option(supabase_url),
            normalize_text_option(supabase_anon_key),
        ) else {
            return Err(Error::Config(format!(
                "Missing Supabase configuration. Set {SUPABASE_URL_ENV} and {SUPABASE_ANON_KEY_ENV}."
            )));
        };

        let supabase_url = validate_http_url(&supabase_url).ok_or_else(|| {
            Error::Config(format!(
                "Invalid Supabase URL format: {supabase_url}. Expected https://<project>.supabase.co"
            ))
        })?;

        let summarizer_url = match normalize_text_option(summarizer_url) {
            Some(raw) => Some(validate_http_url(&raw).ok_or_else(|| {
                Error::Config(format!("Invalid summarizer URL format: {raw}"))
            })?),
            None => None,
        };

        Ok(Self {
            supabase_url,
            supabase_anon_key,
            summarizer_url,
        })
    }

    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_parts(
            std::env::var(SUPABASE_URL_ENV).ok(),
            std::env::var(SUPABASE_ANON_KEY_ENV).ok(),
            std::env::var(SUMMARIZER_URL_ENV).ok(),
        )
    }

    /// PostgREST base for table access.
    #[must_use]
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.supabase_url)
    }
}

/// Parse `raw` as an absolute http(s) URL, returned without a trailing slash.
fn validate_http_url(raw: &str) -> Option<String> {
    if !is_http_url(raw) {
        return None;
    }
    let parsed = Url::parse(raw).ok()?;
    parsed.host_str()?;
    Some(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values_are_reported() {
        let error = ClientConfig::from_parts(Some("https://a.supabase.co".into()), None, None)
            .unwrap_err();
        assert!(error.to_string().starts_with("Missing Supabase configuration"));

        let error =
            ClientConfig::from_parts(Some("  ".into()), Some("key".into()), None).unwrap_err();
        assert!(error.to_string().starts_with("Missing Supabase configuration"));
    }

    #[test]
    fn malformed_url_is_rejected() {
        let error = ClientConfig::from_parts(
            Some("project.supabase.co".into()),
            Some("key".into()),
            None,
        )
        .unwrap_err();
        assert!(error.to_string().starts_with("Invalid Supabase URL format"));

        let error =
            ClientConfig::from_parts(Some("https://".into()), Some("key".into()), None)
                .unwrap_err();
        assert!(error.to_string().starts_with("Invalid Supabase URL format"));
    }

    #[test]
    fn valid_config_normalizes_urls() {
        let config = ClientConfig::from_parts(
            Some(" https://demo.supabase.co/ ".into()),
            Some(" anon ".into()),
            Some("http://localhost:8787/summarize".into()),
        )
        .unwrap();
        assert_eq!(config.supabase_url, "https://demo.supabase.co");
        assert_eq!(config.supabase_anon_key, "anon");
        assert_eq!(config.rest_url(), "https://demo.supabase.co/rest/v1");
        assert_eq!(
            config.summarizer_url.as_deref(),
            Some("http://localhost:8787/summarize")
        );
    }

    #[test]
    fn malformed_summarizer_url_is_rejected() {
        let error = ClientConfig::from_parts(
            Some("https://demo.supabase.co".into()),
            Some("anon".into()),
            Some("summarizer".into()),
        )
        .unwrap_err();
        assert!(error.to_string().contains("summarizer URL"));
    }
}
