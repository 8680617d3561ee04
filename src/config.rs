//! Configuration helpers for groq-engineer

use crate::{Error, Result};
use std::env;

/// Environment variable holding the API credential (required)
pub const API_KEY_VAR: &str = "GROQ_API_KEY";

/// Environment variable overriding the endpoint URL
pub const BASE_URL_VAR: &str = "GROQ_BASE_URL";

/// Environment variable overriding the model name
pub const MODEL_VAR: &str = "GROQ_MODEL";

/// OpenAI-compatible endpoint of the hosted Groq API
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Model used when nothing else is configured
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";

/// Read the API key from the environment
///
/// Missing or blank keys are a startup failure; the binary exits before the
/// first turn when this returns an error.
pub fn get_api_key() -> Result<String> {
    match env::var(API_KEY_VAR) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(Error::config(format!(
            "{} not found in environment variables",
            API_KEY_VAR
        ))),
    }
}

/// Get the base URL from the command line, environment, or the Groq default
///
/// Priority:
/// 1. explicit value (command-line flag)
/// 2. GROQ_BASE_URL environment variable
/// 3. [`DEFAULT_BASE_URL`]
///
/// # Examples
///
/// ```rust,no_run
/// use groq_engineer::get_base_url;
///
/// let url = get_base_url(None);
/// let url = get_base_url(Some("http://localhost:1234/v1"));
/// ```
pub fn get_base_url(explicit: Option<&str>) -> String {
    if let Some(url) = explicit {
        return url.trim_end_matches('/').to_string();
    }

    if let Ok(url) = env::var(BASE_URL_VAR) {
        if !url.trim().is_empty() {
            return url.trim().trim_end_matches('/').to_string();
        }
    }

    DEFAULT_BASE_URL.to_string()
}

/// Get the model name from the command line, environment, or the default
///
/// Priority mirrors [`get_base_url`]: explicit value, then GROQ_MODEL, then
/// [`DEFAULT_MODEL`].
pub fn get_model(explicit: Option<&str>) -> String {
    if let Some(model) = explicit {
        return model.to_string();
    }

    match env::var(MODEL_VAR) {
        Ok(model) if !model.trim().is_empty() => model.trim().to_string(),
        _ => DEFAULT_MODEL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_base_url_wins() {
        let url = get_base_url(Some("http://custom:8080/v1/"));
        assert_eq!(url, "http://custom:8080/v1");
    }

    #[test]
    fn test_explicit_model_wins() {
        assert_eq!(get_model(Some("mixtral-8x7b-32768")), "mixtral-8x7b-32768");
    }

    #[test]
    fn test_defaults_point_at_groq() {
        assert!(DEFAULT_BASE_URL.starts_with("https://api.groq.com"));
        assert!(!DEFAULT_MODEL.is_empty());
    }
}
