use clap::Args;

use crate::error::{Result, VerifyError};

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model connection settings as accepted on the command line / environment.
#[derive(Args, Debug, Clone)]
pub struct GeminiArgs {
    /// API key for the Gemini API.
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model used for verification.
    #[arg(long, global = true, env = "VERIFACT_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the Gemini REST API.
    #[arg(long, global = true, env = "VERIFACT_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,
}

/// Validated settings injected into [`crate::gemini::GeminiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

impl TryFrom<GeminiArgs> for GeminiConfig {
    type Error = VerifyError;

    fn try_from(args: GeminiArgs) -> Result<Self> {
        let api_key = args
            .api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| VerifyError::Config {
                message: "no API key; set GEMINI_API_KEY or pass --api-key".to_string(),
            })?;

        let model = args.model.trim();
        if model.is_empty() {
            return Err(VerifyError::Config {
                message: "model name must not be empty".to_string(),
            });
        }
        if !(args.api_base.starts_with("http://") || args.api_base.starts_with("https://")) {
            return Err(VerifyError::Config {
                message: format!("api base must be an http(s) URL, got {:?}", args.api_base),
            });
        }

        Ok(Self {
            api_key,
            model: model.to_string(),
            api_base: args.api_base,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(api_key: Option<&str>) -> GeminiArgs {
        GeminiArgs {
            api_key: api_key.map(str::to_string),
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    #[test]
    fn test_missing_key_is_config_error() {
        for key in [None, Some(""), Some("   ")] {
            let err = GeminiConfig::try_from(args(key)).unwrap_err();
            assert!(matches!(err, VerifyError::Config { .. }));
            assert!(err.to_string().contains("GEMINI_API_KEY"));
        }
    }

    #[test]
    fn test_valid_args() {
        let config = GeminiConfig::try_from(args(Some(" secret "))).unwrap();
        assert_eq!(config, GeminiConfig::new("secret"));
    }

    #[test]
    fn test_rejects_non_http_base() {
        let mut bad = args(Some("k"));
        bad.api_base = "ftp://example.com".into();
        assert!(GeminiConfig::try_from(bad).is_err());
    }
}
