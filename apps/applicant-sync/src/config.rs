use anyhow::{Context, Result};

pub const DEFAULT_AIRTABLE_API_URL: &str = "https://api.airtable.com/v0";
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Process configuration loaded from environment variables.
/// Built once at startup and handed to every batch job through `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    pub airtable_api_key: String,
    pub airtable_base_id: String,
    pub airtable_api_url: String,
    /// Only the LLM evaluation job needs this, so it is not required up front.
    pub gemini_api_key: Option<String>,
    pub gemini_api_url: String,
    pub gemini_model: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            airtable_api_key: require_env("AIRTABLE_API_KEY")?,
            airtable_base_id: require_env("AIRTABLE_BASE_ID")?,
            airtable_api_url: optional_env("AIRTABLE_API_URL")
                .unwrap_or_else(|| DEFAULT_AIRTABLE_API_URL.to_string()),
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_api_url: optional_env("GEMINI_API_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string()),
            gemini_model: optional_env("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
        })
    }

    /// Returns the Gemini key or an error naming the missing variable.
    pub fn require_gemini_api_key(&self) -> Result<&str> {
        self.gemini_api_key
            .as_deref()
            .context("Required environment variable 'GEMINI_API_KEY' is not set")
    }
}

fn require_env(key: &str) -> Result<String> {
    optional_env(key)
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank variables are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_without_gemini() -> Config {
        Config {
            airtable_api_key: "key".to_string(),
            airtable_base_id: "app123".to_string(),
            airtable_api_url: DEFAULT_AIRTABLE_API_URL.to_string(),
            gemini_api_key: None,
            gemini_api_url: DEFAULT_GEMINI_API_URL.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
        }
    }

    #[test]
    fn test_missing_gemini_key_is_reported_by_name() {
        let err = config_without_gemini().require_gemini_api_key().unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_present_gemini_key_is_returned() {
        let config = Config {
            gemini_api_key: Some("g-key".to_string()),
            ..config_without_gemini()
        };
        assert_eq!(config.require_gemini_api_key().unwrap(), "g-key");
    }
}
