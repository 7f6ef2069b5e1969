//! Text to speech.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use runaway_core::collaborator::{CollaboratorError, SpeechSynthesizer};
use serde::Serialize;
use tracing::debug;

/// Default ElevenLabs base URL.
pub const DEFAULT_ELEVEN_LABS_BASE_URL: &str = "https://api.elevenlabs.io";

/// Voice used when none is configured.
pub const DEFAULT_VOICE_ID: &str = "JBFqnCBsd6RMkjVDRZzb";

const MODEL_ID: &str = "eleven_multilingual_v2";
const OUTPUT_FORMAT: &str = "mp3_44100_128";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client for the ElevenLabs text-to-speech endpoint. Returns mp3 bytes.
#[derive(Clone)]
pub struct ElevenLabsClient {
    client: Client,
    api_key: String,
    base_url: String,
    voice_id: String,
}

impl std::fmt::Debug for ElevenLabsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevenLabsClient")
            .field("base_url", &self.base_url)
            .field("voice_id", &self.voice_id)
            .finish_non_exhaustive()
    }
}

impl ElevenLabsClient {
    /// Creates a client speaking with `voice_id`.
    #[must_use]
    pub fn new(api_key: &str, base_url: &str, voice_id: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key: api_key.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            voice_id: voice_id.to_owned(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/text-to-speech/{}?output_format={OUTPUT_FORMAT}",
            self.base_url, self.voice_id
        )
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, CollaboratorError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("xi-api-key", &self.api_key)
            .json(&SpeechRequest {
                text,
                model_id: MODEL_ID,
            })
            .send()
            .await
            .map_err(|e| CollaboratorError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::RequestFailed(format!("status {status}: {body}")));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| CollaboratorError::InvalidResponse(e.to_string()))?;
        debug!(audio_bytes = audio.len(), "speech synthesized");
        Ok(audio.to_vec())
    }
}

/// Speech synthesizer used when no provider is configured. Always returns
/// empty audio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSpeech;

#[async_trait]
impl SpeechSynthesizer for SilentSpeech {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, CollaboratorError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_includes_voice_and_format() {
        let client = ElevenLabsClient::new("key", "https://api.elevenlabs.io/", "voice-1");

        assert_eq!(
            client.endpoint(),
            "https://api.elevenlabs.io/v1/text-to-speech/voice-1?output_format=mp3_44100_128"
        );
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = ElevenLabsClient::new("secret-key", DEFAULT_ELEVEN_LABS_BASE_URL, DEFAULT_VOICE_ID);

        assert!(!format!("{client:?}").contains("secret-key"));
    }

    #[tokio::test]
    async fn test_silent_speech_returns_empty_audio() {
        let audio = SilentSpeech.synthesize("Hello").await.unwrap();

        assert!(audio.is_empty());
    }
}
