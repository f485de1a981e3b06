// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Active-song arbitration.
//!
//! At most one open song drives the output device. The arbiter is the only
//! component that changes which one; it delegates the actual binding to a
//! [`DeviceBinding`] and treats failures there as non-fatal.

use tracing::{debug, info, warn};

use crate::device::DeviceBinding;
use crate::song::Song;
use crate::view::ViewRef;

/// Owner of the active-song binding
pub struct ActiveSongArbiter {
    device: Box<dyn DeviceBinding>,
    active: Option<Song>,
}

impl ActiveSongArbiter {
    pub fn new(device: Box<dyn DeviceBinding>) -> Self {
        Self {
            device,
            active: None,
        }
    }

    /// Song currently bound to the device
    pub fn active(&self) -> Option<&Song> {
        self.active.as_ref()
    }

    /// Re-evaluate which song should be active.
    ///
    /// # Arguments
    /// * `open` - Songs currently in the registry
    /// * `selected` - View selected in the editor slot, if any
    ///
    /// With one open song it is the candidate. With several, the candidate
    /// is the owner of the selected primary or tertiary view; if no such
    /// view is selected the current binding is left alone. With none, the
    /// binding is released.
    pub fn recompute(&mut self, open: &[Song], selected: Option<&ViewRef>) {
        match open {
            [] => self.clear(),
            [only] => {
                self.activate(only);
            }
            _ => match selected {
                Some(ViewRef::Primary(song)) | Some(ViewRef::Tertiary(song))
                    if open.contains(song) =>
                {
                    self.activate(song);
                }
                _ => debug!("no editor view of an open song selected, active song unchanged"),
            },
        }
    }

    /// Try to bind `song` to the device.
    ///
    /// # Returns
    /// * `true` if `song` is active afterwards
    pub fn activate(&mut self, song: &Song) -> bool {
        if self.active.as_ref() == Some(song) && self.device.active_song() == Some(song.id()) {
            return true;
        }

        if let Err(e) = self.device.check_activatable(song) {
            debug!(song = %song.id(), "song not activatable: {}", e);
            return false;
        }

        let routing = match self.device.find_routing_config(song) {
            Ok(routing) => routing,
            Err(e) => {
                warn!(song = %song.id(), "could not find routing configuration: {}", e);
                self.release();
                return false;
            }
        };

        match self.device.set_active(song, routing) {
            Ok(()) => {
                info!(song = %song.id(), name = %song.name(), "song activated");
                self.active = Some(song.clone());
                true
            }
            Err(e) => {
                warn!(song = %song.id(), "activation failed: {}", e);
                self.release();
                false
            }
        }
    }

    /// Forget `song` if it is the active one
    pub fn song_closed(&mut self, song: &Song) {
        let bound = self.device.active_song() == Some(song.id());
        if self.active.as_ref() == Some(song) || bound {
            debug!(song = %song.id(), "active song closed");
            self.release();
        }
    }

    /// Release any binding
    pub fn clear(&mut self) {
        if self.active.is_some() || self.device.active_song().is_some() {
            self.release();
        }
    }

    fn release(&mut self) {
        self.active = None;
        self.device.clear_active();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::mock::MockDevice;

    #[test]
    fn test_single_song_is_active() {
        let (device, log) = MockDevice::new();
        let mut arbiter = ActiveSongArbiter::new(Box::new(device));
        let song = Song::new("Alone");

        arbiter.recompute(std::slice::from_ref(&song), None);

        assert_eq!(arbiter.active(), Some(&song));
        assert_eq!(log.lock().unwrap().active, Some(song.id()));
    }

    #[test]
    fn test_empty_registry_clears() {
        let (device, log) = MockDevice::new();
        let mut arbiter = ActiveSongArbiter::new(Box::new(device));
        let song = Song::new("Gone");
        arbiter.activate(&song);

        arbiter.recompute(&[], None);

        assert!(arbiter.active().is_none());
        assert_eq!(log.lock().unwrap().active, None);
        assert_eq!(log.lock().unwrap().clears, 1);
    }

    #[test]
    fn test_several_songs_follow_selection() {
        let (device, _log) = MockDevice::new();
        let mut arbiter = ActiveSongArbiter::new(Box::new(device));
        let a = Song::new("A");
        let b = Song::new("B");
        let open = vec![a.clone(), b.clone()];

        arbiter.recompute(&open, Some(&ViewRef::Primary(b.clone())));
        assert_eq!(arbiter.active(), Some(&b));

        arbiter.recompute(&open, Some(&ViewRef::Tertiary(a.clone())));
        assert_eq!(arbiter.active(), Some(&a));

        // Structure view focus is not recognized: unchanged
        arbiter.recompute(&open, Some(&ViewRef::Secondary(b.clone())));
        assert_eq!(arbiter.active(), Some(&a));

        arbiter.recompute(&open, None);
        assert_eq!(arbiter.active(), Some(&a));

        // Selection of a song that is not open: unchanged
        let stranger = Song::new("Stranger");
        arbiter.recompute(&open, Some(&ViewRef::Primary(stranger)));
        assert_eq!(arbiter.active(), Some(&a));
    }

    #[test]
    fn test_unavailable_device_is_not_fatal() {
        let (device, log) = MockDevice::new();
        log.lock().unwrap().unavailable = true;
        let mut arbiter = ActiveSongArbiter::new(Box::new(device));
        let song = Song::new("Offline");

        assert!(!arbiter.activate(&song));
        assert!(arbiter.active().is_none());
        assert!(log.lock().unwrap().activations.is_empty());
    }

    #[test]
    fn test_failed_set_active_leaves_none() {
        let (device, log) = MockDevice::new();
        let mut arbiter = ActiveSongArbiter::new(Box::new(device));
        let first = Song::new("First");
        let second = Song::new("Second");
        assert!(arbiter.activate(&first));

        log.lock().unwrap().fail_set_active = true;
        assert!(!arbiter.activate(&second));

        assert!(arbiter.active().is_none());
        assert_eq!(log.lock().unwrap().active, None);
    }

    #[test]
    fn test_closing_active_song_releases() {
        let (device, log) = MockDevice::new();
        let mut arbiter = ActiveSongArbiter::new(Box::new(device));
        let a = Song::new("A");
        let b = Song::new("B");
        arbiter.activate(&a);

        arbiter.song_closed(&b);
        assert_eq!(arbiter.active(), Some(&a));

        arbiter.song_closed(&a);
        assert!(arbiter.active().is_none());
        assert_eq!(log.lock().unwrap().clears, 1);
    }
}
