//! Server configuration read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use runaway_llm::elevenlabs::DEFAULT_VOICE_ID;
use runaway_llm::mistral::{DEFAULT_DIALOGUE_MODEL, DEFAULT_MISTRAL_BASE_URL, DEFAULT_SCORING_MODEL};

use crate::error::AppError;

/// Everything the server needs to start.
#[derive(Clone)]
pub struct AppConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Root of the wagon dataset.
    pub data_dir: PathBuf,
    /// Inactivity threshold after which a session is expired.
    pub session_max_age: Duration,
    /// Period of the expiry sweep.
    pub sweep_interval: Duration,
    /// Mistral API key.
    pub mistral_api_key: String,
    /// Mistral base URL.
    pub mistral_base_url: String,
    /// Model for dialogue and guessing.
    pub dialogue_model: String,
    /// Model for similarity scoring.
    pub scoring_model: String,
    /// ElevenLabs API key; speech is silent without it.
    pub eleven_labs_api_key: Option<String>,
    /// ElevenLabs voice.
    pub eleven_labs_voice_id: String,
    /// Retries at the collaborator boundary.
    pub llm_max_retries: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("data_dir", &self.data_dir)
            .field("session_max_age", &self.session_max_age)
            .field("sweep_interval", &self.sweep_interval)
            .field("mistral_base_url", &self.mistral_base_url)
            .field("dialogue_model", &self.dialogue_model)
            .field("scoring_model", &self.scoring_model)
            .field("speech_enabled", &self.eleven_labs_api_key.is_some())
            .field("llm_max_retries", &self.llm_max_retries)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_owned())
        };

        let mistral_api_key = lookup("MISTRAL_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config("MISTRAL_API_KEY environment variable must be set".into())
            })?;

        Ok(Self {
            host: var("HOST", "0.0.0.0"),
            port: parse("PORT", &var("PORT", "3000"))?,
            data_dir: PathBuf::from(var("DATA_DIR", "data")),
            session_max_age: Duration::from_secs(parse(
                "SESSION_MAX_AGE_SECS",
                &var("SESSION_MAX_AGE_SECS", "86400"),
            )?),
            sweep_interval: Duration::from_secs(parse(
                "SESSION_SWEEP_INTERVAL_SECS",
                &var("SESSION_SWEEP_INTERVAL_SECS", "3600"),
            )?),
            mistral_api_key,
            mistral_base_url: var("MISTRAL_BASE_URL", DEFAULT_MISTRAL_BASE_URL),
            dialogue_model: var("MISTRAL_DIALOGUE_MODEL", DEFAULT_DIALOGUE_MODEL),
            scoring_model: var("MISTRAL_SCORING_MODEL", DEFAULT_SCORING_MODEL),
            eleven_labs_api_key: lookup("ELEVEN_LABS_API_KEY").filter(|v| !v.trim().is_empty()),
            eleven_labs_voice_id: var("ELEVEN_LABS_VOICE_ID", DEFAULT_VOICE_ID),
            llm_max_retries: parse("LLM_MAX_RETRIES", &var("LLM_MAX_RETRIES", "2"))?,
        })
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("{key} must be a valid number: {e}")))
}
