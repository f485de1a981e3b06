// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Device routing and playback configuration sources.

use std::sync::{Arc, OnceLock};

use super::{Emitter, SongId};

/// Per-song routing of tracks to output channels.
///
/// Owned by the device-binding collaborator; the session layer only
/// listens to its music-impacting changes.
#[derive(Debug)]
pub struct RoutingConfig {
    song: SongId,
    music_changes: Emitter<String>,
}

impl RoutingConfig {
    pub fn new(song: SongId) -> Self {
        Self {
            song,
            music_changes: Emitter::new(),
        }
    }

    /// Song this configuration routes
    pub fn song(&self) -> SongId {
        self.song
    }

    pub fn notify_music_change(&self, token: &str) {
        self.music_changes.emit(&token.to_string());
    }

    pub fn music_changes(&self) -> &Emitter<String> {
        &self.music_changes
    }
}

/// Global playback configuration (click, count-in, groove, ...).
#[derive(Debug, Default)]
pub struct PlaybackSettings {
    music_changes: Emitter<String>,
}

impl PlaybackSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide instance, created on first use
    pub fn global() -> Arc<PlaybackSettings> {
        static GLOBAL: OnceLock<Arc<PlaybackSettings>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(PlaybackSettings::new())))
    }

    pub fn notify_music_change(&self, token: &str) {
        self.music_changes.emit(&token.to_string());
    }

    pub fn music_changes(&self) -> &Emitter<String> {
        &self.music_changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_is_shared() {
        let a = PlaybackSettings::global();
        let b = PlaybackSettings::global();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
