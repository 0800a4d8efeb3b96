//! Playback settings validation.
//!
//! Violations are fatal and reported before any port is opened or loop
//! started.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Tempo must be a positive number of BPM, got {0}")]
    TempoNotPositive(f64),

    #[error("Note sequence is empty (no sounding notes found)")]
    EmptySequence,
}

/// Convert a tempo to the fixed inter-event delay (60/BPM seconds).
pub fn beat_delay(bpm: f64) -> Result<Duration, ConfigError> {
    if !bpm.is_finite() || bpm <= 0.0 {
        return Err(ConfigError::TempoNotPositive(bpm));
    }
    Ok(Duration::from_secs_f64(60.0 / bpm))
}
