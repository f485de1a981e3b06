// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types for the session layer.

use thiserror::Error;

use crate::song::SongId;

/// Convenient result alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors raised by the session manager and change aggregators.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The song has no view group (it was never opened, or already closed).
    #[error("song {song} is not open")]
    NotOpen {
        /// Identity of the song the caller referred to.
        song: SongId,
    },
    /// A quiescence delay below zero was supplied.
    #[error("quiescence delay must not be negative (got {delay_ms} ms)")]
    NegativeDelay {
        /// The rejected delay in milliseconds.
        delay_ms: i64,
    },
    /// A timed aggregator was constructed outside of a tokio runtime.
    #[error("a tokio runtime is required for a non-zero quiescence delay")]
    NoRuntime,
    /// The session task is no longer running.
    #[error("session manager has stopped")]
    Stopped,
    /// Device binding failure.
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Failures reported by a device-binding collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeviceError {
    /// The output device cannot be used right now.
    #[error("device unavailable: {0}")]
    Unavailable(String),
    /// No routing configuration could be found or created for the song.
    #[error("no routing configuration for song {0}")]
    NoRoutingConfig(SongId),
    /// The song cannot become active for a collaborator-specific reason.
    #[error("song {song} cannot be activated: {reason}")]
    NotActivatable {
        /// The song that was refused.
        song: SongId,
        /// Human-readable explanation.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SessionError::NegativeDelay { delay_ms: -5 };
        assert_eq!(
            err.to_string(),
            "quiescence delay must not be negative (got -5 ms)"
        );

        let err: SessionError = DeviceError::Unavailable("no output".to_string()).into();
        assert_eq!(err.to_string(), "device unavailable: no output");
    }
}
