//! Shared test doubles and fixtures for the Runaway train game backend.

mod catalog;
mod clock;
mod collaborators;

pub use catalog::{FailingWagonCatalog, StaticWagonCatalog, sample_profile, sample_wagons};
pub use clock::{FixedClock, ManualClock};
pub use collaborators::{
    FailingDialogueGenerator, FailingGuessGenerator, FailingScorer, FailingSpeech,
    FixedScorer, RecordingGuessGenerator, StubDialogueGenerator, StubSpeech,
};
