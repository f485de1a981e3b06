// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song documents and the change sources attached to them.
//!
//! This module provides:
//! - `Song`: an identity-bearing handle to an edited document
//! - `RoutingConfig`: the per-song device/routing configuration
//! - `PlaybackSettings`: the process-wide playback configuration
//! - `Emitter`: the listener registry all of them notify through

pub mod emitter;
pub mod routing;

pub use emitter::{Emitter, ListenerId};
pub use routing::{PlaybackSettings, RoutingConfig};

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Property identifier under which music-impacting change tokens are emitted
pub const PROP_MUSIC_GENERATION: &str = "MusicGeneration";

static NEXT_SONG_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a song
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SongId(u64);

impl SongId {
    fn next() -> Self {
        SongId(NEXT_SONG_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Transition of the save-needed flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveStateChange {
    pub old: bool,
    pub new: bool,
}

/// An edit reported by the song model for undo bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoableEdit {
    pub description: String,
}

impl UndoableEdit {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

struct SongInner {
    id: SongId,
    name: Mutex<String>,
    file: Mutex<Option<PathBuf>>,
    comments: Mutex<String>,
    save_needed: AtomicBool,
    music_changes: Emitter<String>,
    save_state: Emitter<SaveStateChange>,
    edits: Emitter<UndoableEdit>,
}

/// Handle to a song document.
///
/// Cloning yields another handle to the same song. Equality and hashing
/// use identity only, never content.
#[derive(Clone)]
pub struct Song {
    inner: Arc<SongInner>,
}

impl Song {
    /// Create a new, unsaved song
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(SongInner {
                id: SongId::next(),
                name: Mutex::new(name.into()),
                file: Mutex::new(None),
                comments: Mutex::new(String::new()),
                save_needed: AtomicBool::new(false),
                music_changes: Emitter::new(),
                save_state: Emitter::new(),
                edits: Emitter::new(),
            }),
        }
    }

    /// Create a song that is backed by a file
    pub fn with_file(name: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        let song = Self::new(name);
        song.set_file(Some(file.into()));
        song
    }

    pub fn id(&self) -> SongId {
        self.inner.id
    }

    pub fn name(&self) -> String {
        self.inner.name.lock().clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        *self.inner.name.lock() = name.into();
    }

    /// Backing file, if the song was loaded or saved
    pub fn file(&self) -> Option<PathBuf> {
        self.inner.file.lock().clone()
    }

    pub fn set_file(&self, file: Option<PathBuf>) {
        *self.inner.file.lock() = file;
    }

    /// Free-form memo text; may contain links
    pub fn comments(&self) -> String {
        self.inner.comments.lock().clone()
    }

    pub fn set_comments(&self, comments: impl Into<String>) {
        *self.inner.comments.lock() = comments.into();
    }

    pub fn save_needed(&self) -> bool {
        self.inner.save_needed.load(Ordering::SeqCst)
    }

    /// Set the save-needed flag, notifying `save_state()` listeners on change
    pub fn set_save_needed(&self, needed: bool) {
        let old = self.inner.save_needed.swap(needed, Ordering::SeqCst);
        if old != needed {
            self.inner.save_state.emit(&SaveStateChange { old, new: needed });
        }
    }

    /// Record a successful save to `path`
    pub fn mark_saved(&self, path: impl AsRef<Path>) {
        self.set_file(Some(path.as_ref().to_path_buf()));
        self.set_save_needed(false);
    }

    /// Report a music-impacting change identified by `token`.
    ///
    /// Also marks the song as needing a save.
    pub fn notify_music_change(&self, token: &str) {
        self.set_save_needed(true);
        self.inner.music_changes.emit(&token.to_string());
    }

    /// Report an undoable edit
    pub fn notify_edit(&self, edit: UndoableEdit) {
        self.inner.edits.emit(&edit);
    }

    /// Change tokens emitted under [`PROP_MUSIC_GENERATION`]
    pub fn music_changes(&self) -> &Emitter<String> {
        &self.inner.music_changes
    }

    pub fn save_state(&self) -> &Emitter<SaveStateChange> {
        &self.inner.save_state
    }

    pub fn edits(&self) -> &Emitter<UndoableEdit> {
        &self.inner.edits
    }
}

impl PartialEq for Song {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Song {}

impl Hash for Song {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Song")
            .field("id", &self.inner.id)
            .field("name", &self.name())
            .finish()
    }
}
