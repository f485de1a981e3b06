// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Session lifecycle events.

use crate::song::Song;

/// Lifecycle event published by the session manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The song's views were created and registered
    Opened(Song),
    /// The song's views were closed and it left the registry
    Closed(Song),
    /// The song was saved to its backing file
    Saved(Song),
}

impl SessionEvent {
    pub fn song(&self) -> &Song {
        match self {
            SessionEvent::Opened(song) | SessionEvent::Closed(song) | SessionEvent::Saved(song) => {
                song
            }
        }
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::Opened(_) => "SongOpened",
            SessionEvent::Closed(_) => "SongClosed",
            SessionEvent::Saved(_) => "SongSaved",
        }
    }
}
