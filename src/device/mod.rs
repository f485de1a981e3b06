// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Device binding abstraction.
//!
//! The device-binding collaborator connects exactly one song at a time to
//! the music output. The session layer decides *which* song; the binding
//! does the actual work and may fail when the device is unavailable.

use std::sync::Arc;

use crate::error::DeviceError;
use crate::song::{RoutingConfig, Song, SongId};

/// Trait for the collaborator that binds a song to the output device.
pub trait DeviceBinding: Send {
    /// Check whether `song` can become active right now.
    ///
    /// # Returns
    /// * `Ok(())` if the song can be activated
    /// * `Err` describing why not
    fn check_activatable(&self, song: &Song) -> Result<(), DeviceError>;

    /// Find (or create) the routing configuration of `song`
    fn find_routing_config(&mut self, song: &Song) -> Result<Arc<RoutingConfig>, DeviceError>;

    /// Bind `song` to the output using `routing`
    fn set_active(&mut self, song: &Song, routing: Arc<RoutingConfig>) -> Result<(), DeviceError>;

    /// Release the current binding, if any
    fn clear_active(&mut self);

    /// Song currently bound
    fn active_song(&self) -> Option<SongId>;
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Shared record of what the mock device was asked to do
    #[derive(Debug, Default)]
    pub struct DeviceLog {
        pub active: Option<SongId>,
        pub activations: Vec<SongId>,
        pub clears: usize,
        pub unavailable: bool,
        pub fail_set_active: bool,
    }

    /// In-memory device binding for tests
    pub struct MockDevice {
        pub log: Arc<Mutex<DeviceLog>>,
        routings: HashMap<SongId, Arc<RoutingConfig>>,
    }

    impl MockDevice {
        pub fn new() -> (Self, Arc<Mutex<DeviceLog>>) {
            let log = Arc::new(Mutex::new(DeviceLog::default()));
            (
                Self {
                    log: Arc::clone(&log),
                    routings: HashMap::new(),
                },
                log,
            )
        }
    }

    impl DeviceBinding for MockDevice {
        fn check_activatable(&self, _song: &Song) -> Result<(), DeviceError> {
            if self.log.lock().unwrap().unavailable {
                Err(DeviceError::Unavailable("mock output offline".to_string()))
            } else {
                Ok(())
            }
        }

        fn find_routing_config(&mut self, song: &Song) -> Result<Arc<RoutingConfig>, DeviceError> {
            Ok(Arc::clone(
                self.routings
                    .entry(song.id())
                    .or_insert_with(|| Arc::new(RoutingConfig::new(song.id()))),
            ))
        }

        fn set_active(&mut self, song: &Song, _routing: Arc<RoutingConfig>) -> Result<(), DeviceError> {
            let mut log = self.log.lock().unwrap();
            if log.fail_set_active {
                return Err(DeviceError::Unavailable("mock set_active failure".to_string()));
            }
            log.active = Some(song.id());
            log.activations.push(song.id());
            Ok(())
        }

        fn clear_active(&mut self) {
            let mut log = self.log.lock().unwrap();
            log.active = None;
            log.clears += 1;
        }

        fn active_song(&self) -> Option<SongId> {
            self.log.lock().unwrap().active
        }
    }
}
