//! Runaway: clients for the external collaborators.
//!
//! Mistral chat completions back passenger dialogue, the detective's guesses
//! and similarity scoring. ElevenLabs backs speech. Every client can be
//! wrapped in [`resilient::Resilient`] for bounded retries.

pub mod elevenlabs;
pub mod mistral;
pub mod prompts;
pub mod resilient;
