// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Undo-history bindings for open songs.
//!
//! Each open song gets one [`UndoHistory`], reachable from the song itself
//! and from its chord-sheet and structure scopes. The history records the
//! edits the song reports while it is open. Executing undo/redo is the job
//! of the editors and lives elsewhere.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use tracing::debug;

use crate::song::{ListenerId, Song, SongId, UndoableEdit};

/// Part of a song an undo history can be looked up for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UndoScope {
    Song(SongId),
    ChordSheet(SongId),
    Structure(SongId),
}

impl UndoScope {
    /// All scopes belonging to `song`
    pub fn all(song: SongId) -> [UndoScope; 3] {
        [
            UndoScope::Song(song),
            UndoScope::ChordSheet(song),
            UndoScope::Structure(song),
        ]
    }
}

/// Recorded edits of one song
#[derive(Debug, Default)]
pub struct UndoHistory {
    edits: Mutex<Vec<UndoableEdit>>,
}

impl UndoHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, edit: UndoableEdit) {
        self.edits.lock().push(edit);
    }

    pub fn len(&self) -> usize {
        self.edits.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Description of the most recent edit
    pub fn last_description(&self) -> Option<String> {
        self.edits
            .lock()
            .last()
            .map(|e| e.description.clone())
    }
}

struct Binding {
    history: Arc<UndoHistory>,
    listener: ListenerId,
}

/// Lookup of undo histories by scope
#[derive(Default)]
pub struct UndoRegistry {
    histories: HashMap<UndoScope, Arc<UndoHistory>>,
    bindings: HashMap<SongId, Binding>,
}

impl UndoRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh history for `song` and its substructures and start
    /// recording its edits. Replaces any previous binding.
    pub fn bind(&mut self, song: &Song) -> Arc<UndoHistory> {
        self.unbind(song);

        let history = Arc::new(UndoHistory::new());
        for scope in UndoScope::all(song.id()) {
            self.histories.insert(scope, Arc::clone(&history));
        }
        let recorder = Arc::clone(&history);
        let listener = song
            .edits()
            .subscribe(move |edit: &UndoableEdit| recorder.record(edit.clone()));
        self.bindings.insert(
            song.id(),
            Binding {
                history: Arc::clone(&history),
                listener,
            },
        );
        debug!(song = %song.id(), "undo history bound");
        history
    }

    /// Stop recording and forget every scope of `song`
    pub fn unbind(&mut self, song: &Song) -> Option<Arc<UndoHistory>> {
        let binding = self.bindings.remove(&song.id())?;
        song.edits().unsubscribe(binding.listener);
        for scope in UndoScope::all(song.id()) {
            self.histories.remove(&scope);
        }
        Some(binding.history)
    }

    pub fn get(&self, scope: UndoScope) -> Option<Arc<UndoHistory>> {
        self.histories.get(&scope).cloned()
    }

    /// Number of bound songs
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
