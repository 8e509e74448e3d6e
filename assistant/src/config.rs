use crate::error::{AssistantError, Result};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_SECRETS_PATH: &str = "secrets.toml";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GUIDE_URL: &str = "https://github.com/tjbeevor/chatterbox/blob/main/gemini_for_workspace_prompt_guide_october_2024_digital_final.pdf";
pub const DEFAULT_CONTEXT_LIMIT: usize = 10_000;

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Absent when neither the secrets file nor the environment carries one.
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    /// `None` hides the "load guide" action.
    pub guide_url: Option<String>,
    pub context_limit: usize,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub bind_addr: String,
    pub max_upload_mb: usize,
    /// Sessions idle longer than this are dropped.
    pub session_ttl_secs: u64,
}

impl AssistantConfig {
    /// Reads the secrets file and the process environment. `.env` is loaded by the binary.
    pub fn load() -> Result<Self> {
        let secrets_path =
            env::var("PDF_ASSISTANT_SECRETS").unwrap_or_else(|_| DEFAULT_SECRETS_PATH.to_string());
        let secrets = read_secrets(Path::new(&secrets_path))?;

        Self::from_sources(secrets.as_ref(), |key| env::var(key).ok())
    }

    /// Defaults for everything but the key.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            guide_url: Some(DEFAULT_GUIDE_URL.to_string()),
            context_limit: DEFAULT_CONTEXT_LIMIT,
            temperature: 0.3,
            max_output_tokens: 1000,
            bind_addr: "0.0.0.0:3000".to_string(),
            max_upload_mb: 200,
            session_ttl_secs: 3600,
        }
    }

    /// Secrets take precedence over the environment for the keys they define.
    pub fn from_sources<F>(secrets: Option<&toml::Table>, env_lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = |key: &str| {
            secrets
                .and_then(|table| table.get(key))
                .and_then(|value| value.as_str())
                .map(str::to_string)
        };
        let lookup = |key: &str| secret(key).or_else(|| env_lookup(key));

        let api_key = secret("GOOGLE_API_KEY")
            .or_else(|| env_lookup("GOOGLE_API_KEY"))
            .or_else(|| env_lookup("GEMINI_API_KEY"))
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let mut config = Self::with_api_key(String::new());
        config.api_key = api_key;

        if let Some(model) = lookup("GEMINI_MODEL").filter(|m| !m.trim().is_empty()) {
            config.model = model.trim().to_string();
        }
        if let Some(base) = env_lookup("GEMINI_API_BASE") {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(url) = lookup("GUIDE_URL") {
            let url = url.trim().to_string();
            config.guide_url = if url.is_empty() { None } else { Some(url) };
        }
        if let Some(addr) = env_lookup("BIND_ADDR") {
            config.bind_addr = addr;
        }

        config.context_limit = parse_or(&env_lookup, "PDF_CONTEXT_LIMIT", config.context_limit)?;
        config.temperature = parse_or(&env_lookup, "GEMINI_TEMPERATURE", config.temperature)?;
        config.max_output_tokens =
            parse_or(&env_lookup, "GEMINI_MAX_OUTPUT_TOKENS", config.max_output_tokens)?;
        config.max_upload_mb = parse_or(&env_lookup, "MAX_UPLOAD_MB", config.max_upload_mb)?;
        config.session_ttl_secs =
            parse_or(&env_lookup, "SESSION_TTL_SECS", config.session_ttl_secs)?;

        Ok(config)
    }

    /// Request body limit in bytes; saturates instead of overflowing.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or(AssistantError::MissingApiKey)
    }
}

fn read_secrets(path: &Path) -> Result<Option<toml::Table>> {
    if !path.exists() {
        log::debug!("No secrets file at {}", path.display());
        return Ok(None);
    }

    let raw = fs::read_to_string(path)?;
    let table = raw
        .parse::<toml::Table>()
        .map_err(|e| AssistantError::Config(format!("{}: {}", path.display(), e)))?;
    Ok(Some(table))
}

fn parse_or<T, F>(env_lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match env_lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AssistantError::Config(format!("{key}={raw}: {e}"))),
        None => Ok(default),
    }
}
