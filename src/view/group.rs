// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The set of views bound to one open song.

use tracing::warn;

use super::{View, ViewId, ViewRef};
use crate::song::Song;

/// Snapshot of a group's view identities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupInfo {
    pub primary: ViewId,
    pub secondary: ViewId,
    pub tertiary: Option<ViewId>,
}

struct Slot {
    id: ViewId,
    view: Box<dyn View>,
}

impl Slot {
    fn new(view: Box<dyn View>) -> Self {
        Self {
            id: ViewId::next(),
            view,
        }
    }
}

/// Primary and secondary views (always present) plus an optional
/// tertiary view, owned for the lifetime of one open song.
pub struct ViewGroup {
    song: Song,
    primary: Slot,
    secondary: Slot,
    tertiary: Option<Slot>,
}

impl ViewGroup {
    /// Build a group and pair the primary and secondary views
    pub fn new(song: &Song, mut primary: Box<dyn View>, mut secondary: Box<dyn View>) -> Self {
        primary.set_paired(ViewRef::Secondary(song.clone()));
        secondary.set_paired(ViewRef::Primary(song.clone()));
        Self {
            song: song.clone(),
            primary: Slot::new(primary),
            secondary: Slot::new(secondary),
            tertiary: None,
        }
    }

    pub fn song(&self) -> &Song {
        &self.song
    }

    pub fn info(&self) -> GroupInfo {
        GroupInfo {
            primary: self.primary.id,
            secondary: self.secondary.id,
            tertiary: self.tertiary.as_ref().map(|s| s.id),
        }
    }

    pub fn primary_mut(&mut self) -> &mut dyn View {
        self.primary.view.as_mut()
    }

    pub fn secondary_mut(&mut self) -> &mut dyn View {
        self.secondary.view.as_mut()
    }

    pub fn tertiary_mut(&mut self) -> Option<&mut dyn View> {
        match self.tertiary.as_mut() {
            Some(slot) => Some(slot.view.as_mut()),
            None => None,
        }
    }

    pub fn primary(&self) -> &dyn View {
        self.primary.view.as_ref()
    }

    pub fn tertiary_id(&self) -> Option<ViewId> {
        self.tertiary.as_ref().map(|s| s.id)
    }

    /// Whether the tertiary view exists and is the front tab of its slot
    pub fn tertiary_showing(&self) -> bool {
        self.tertiary
            .as_ref()
            .map(|slot| slot.view.is_showing())
            .unwrap_or(false)
    }

    /// Attach a newly created tertiary view
    pub fn attach_tertiary(&mut self, view: Box<dyn View>) -> ViewId {
        let slot = Slot::new(view);
        let id = slot.id;
        self.tertiary = Some(slot);
        id
    }

    /// Forget the tertiary view without closing it (it is already closed)
    pub fn detach_tertiary(&mut self) -> Option<ViewId> {
        self.tertiary.take().map(|s| s.id)
    }

    /// Close every view of the group.
    ///
    /// With `enforce` the primary view is closed silently. Otherwise its
    /// normal handshake runs and a refusal aborts with nothing closed.
    ///
    /// # Returns
    /// * `true` if all views are closed
    /// * `false` if the user refused and the group is untouched
    pub fn close(&mut self, enforce: bool) -> bool {
        let primary = self.primary.view.as_mut();
        if primary.is_opened() {
            if enforce {
                primary.close_silent();
            } else if !primary.close() {
                return false;
            }
        }

        // Confirmation already happened on the primary view
        let secondary = self.secondary.view.as_mut();
        if secondary.is_opened() && !secondary.close() {
            warn!(song = %self.song.id(), "secondary view refused to close after primary, forcing");
            secondary.close_silent();
        }

        if let Some(slot) = self.tertiary.take() {
            let mut view = slot.view;
            if view.is_opened() {
                view.close_silent();
            }
        }

        true
    }
}
