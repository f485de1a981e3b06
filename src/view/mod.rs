// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Views bound to an open song and the window system that hosts them.
//!
//! This module provides:
//! - `ViewRole` / `ViewRef`: the closed set of view kinds
//! - `View`: what the session layer needs from any view
//! - `Desktop`: the window system that creates, docks and selects views
//! - `ViewGroup`: the views owned for one open song

pub mod group;

pub use group::ViewGroup;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::song::Song;

/// Role a view plays within its group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewRole {
    /// Chord-sheet editor
    Primary,
    /// Song-structure editor, always paired with the primary view
    Secondary,
    /// Optional piano-roll editor
    Tertiary,
}

impl ViewRole {
    /// Fixed layout slot views of this role are docked into
    pub fn slot(&self) -> LayoutSlot {
        match self {
            ViewRole::Primary | ViewRole::Tertiary => LayoutSlot::Editor,
            ViewRole::Secondary => LayoutSlot::Structure,
        }
    }
}

/// Region of the desktop layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutSlot {
    /// Main tabbed editor area
    Editor,
    /// Area below the editor holding structure views
    Structure,
}

/// A view as reported by the window system, tagged with its owning song
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewRef {
    Primary(Song),
    Secondary(Song),
    Tertiary(Song),
}

impl ViewRef {
    pub fn new(role: ViewRole, song: Song) -> Self {
        match role {
            ViewRole::Primary => ViewRef::Primary(song),
            ViewRole::Secondary => ViewRef::Secondary(song),
            ViewRole::Tertiary => ViewRef::Tertiary(song),
        }
    }

    pub fn role(&self) -> ViewRole {
        match self {
            ViewRef::Primary(_) => ViewRole::Primary,
            ViewRef::Secondary(_) => ViewRole::Secondary,
            ViewRef::Tertiary(_) => ViewRole::Tertiary,
        }
    }

    pub fn song(&self) -> &Song {
        match self {
            ViewRef::Primary(song) | ViewRef::Secondary(song) | ViewRef::Tertiary(song) => song,
        }
    }
}

static NEXT_VIEW_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a view instance created by the session manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(u64);

impl ViewId {
    pub(crate) fn next() -> Self {
        ViewId(NEXT_VIEW_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view-{}", self.0)
    }
}

/// Contract of a primary, secondary or tertiary view.
///
/// All methods are called from the session task.
pub trait View: Send {
    /// Make the view part of the desktop
    fn open(&mut self);

    /// Normal close handshake.
    ///
    /// May ask the user to confirm (e.g. save changes).
    ///
    /// # Returns
    /// * `true` if the view closed
    /// * `false` if the user refused
    fn close(&mut self) -> bool;

    /// Close without any user interaction
    fn close_silent(&mut self);

    /// Give the view keyboard focus and bring it to the front
    fn request_foreground(&mut self);

    /// Make the view visible without taking focus
    fn request_visible(&mut self);

    fn is_opened(&self) -> bool;

    /// Whether the view is the front tab of its layout slot
    fn is_showing(&self) -> bool;

    /// Tell the view which view it is paired with
    fn set_paired(&mut self, sibling: ViewRef);

    /// Owning song
    fn song(&self) -> &Song;
}

/// The window system hosting the views.
pub trait Desktop: Send {
    /// Create a view of `role` bound to `song`. The view is not opened yet.
    fn create_view(&mut self, song: &Song, role: ViewRole) -> Box<dyn View>;

    /// Dock `view` into `slot`
    fn dock(&mut self, view: &mut dyn View, slot: LayoutSlot);

    /// Open `view` in the tab position right after `anchor`
    fn open_after(&mut self, view: &mut dyn View, anchor: &dyn View);

    /// View currently selected in the editor slot, if any
    fn selected_editor(&self) -> Option<ViewRef>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_slots() {
        assert_eq!(ViewRole::Primary.slot(), LayoutSlot::Editor);
        assert_eq!(ViewRole::Tertiary.slot(), LayoutSlot::Editor);
        assert_eq!(ViewRole::Secondary.slot(), LayoutSlot::Structure);
    }

    #[test]
    fn test_view_ref_carries_song() {
        let song = Song::new("Footprints");
        for role in [ViewRole::Primary, ViewRole::Secondary, ViewRole::Tertiary] {
            let view = ViewRef::new(role, song.clone());
            assert_eq!(view.role(), role);
            assert_eq!(view.song(), &song);
        }
    }
}
