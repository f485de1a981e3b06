// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Coalescing of music-impacting change notifications.
//!
//! A [`ChangeAggregator`] listens to the change tokens of one song, its
//! routing configuration and the playback settings. Tokens on the
//! blacklist are dropped. The rest are collapsed into a single
//! payload-free notification:
//!
//! - with a zero delay, every accepted token notifies immediately;
//! - otherwise the first accepted token opens a fixed window of `delay`,
//!   tokens arriving while the window is open are absorbed, and one
//!   notification is delivered when the window closes.
//!
//! The window is never extended by later activity.

use std::collections::HashSet;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::error::{Result, SessionError};
use crate::song::{Emitter, ListenerId, PlaybackSettings, RoutingConfig, Song};

/// State of the quiescence window
enum Window {
    Idle,
    Pending(JoinHandle<()>),
    Detached,
}

struct Shared {
    delay: Duration,
    blacklist: Mutex<Option<HashSet<String>>>,
    window: Mutex<Window>,
    changes: Emitter<()>,
    runtime: Option<Handle>,
}

impl Shared {
    fn on_source_event(self: &Arc<Self>, token: &str) {
        if let Some(blacklist) = self.blacklist.lock().as_ref() {
            if blacklist.contains(token) {
                trace!(token, "blacklisted change token ignored");
                return;
            }
        }

        if self.delay.is_zero() {
            if matches!(*self.lock_window(), Window::Detached) {
                return;
            }
            self.changes.emit(&());
            return;
        }

        let mut window = self.lock_window();
        if !matches!(*window, Window::Idle) {
            // Absorbed by the window already in flight
            return;
        }
        let Some(runtime) = self.runtime.as_ref() else {
            return;
        };

        let deadline = Instant::now() + self.delay;
        let weak: Weak<Shared> = Arc::downgrade(self);
        trace!(token, delay_ms = self.delay.as_millis() as u64, "quiescence window opened");
        *window = Window::Pending(runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(shared) = weak.upgrade() {
                shared.window_elapsed();
            }
        }));
    }

    fn window_elapsed(&self) {
        {
            let mut window = self.lock_window();
            if !matches!(*window, Window::Pending(_)) {
                return;
            }
            // Tokens arriving during delivery open the next window
            *window = Window::Idle;
        }

        debug!("quiescence window closed");
        self.changes.emit(&());
    }

    fn detach(&self) {
        let mut window = self.lock_window();
        if let Window::Pending(timer) = std::mem::replace(&mut *window, Window::Detached) {
            timer.abort();
            debug!("pending quiescence window cancelled");
        }
    }

    fn lock_window(&self) -> MutexGuard<'_, Window> {
        self.window.lock()
    }
}

/// Debounced, filtered funnel of music-impacting changes for one song.
///
/// Created with [`ChangeAggregator::observe`] and released with
/// [`ChangeAggregator::cleanup`]. Dropping the aggregator detaches it the
/// same way.
pub struct ChangeAggregator {
    song: Song,
    routing: Arc<RoutingConfig>,
    settings: Arc<PlaybackSettings>,
    shared: Arc<Shared>,
    song_listener: ListenerId,
    routing_listener: ListenerId,
    settings_listener: ListenerId,
    detached: bool,
}

impl ChangeAggregator {
    /// Observe `song`, its routing configuration and the global playback
    /// settings.
    ///
    /// # Arguments
    /// * `delay_ms` - Quiescence window in milliseconds, 0 to notify on
    ///   every accepted token
    ///
    /// # Errors
    /// * `NegativeDelay` if `delay_ms < 0`
    /// * `NoRuntime` if `delay_ms > 0` and no tokio runtime is current
    pub fn observe(song: &Song, routing: &Arc<RoutingConfig>, delay_ms: i64) -> Result<Self> {
        Self::observe_with(song, routing, &PlaybackSettings::global(), delay_ms)
    }

    /// Like [`observe`](Self::observe) with explicit playback settings
    pub fn observe_with(
        song: &Song,
        routing: &Arc<RoutingConfig>,
        settings: &Arc<PlaybackSettings>,
        delay_ms: i64,
    ) -> Result<Self> {
        if delay_ms < 0 {
            return Err(SessionError::NegativeDelay { delay_ms });
        }
        let delay = Duration::from_millis(delay_ms as u64);
        let runtime = if delay.is_zero() {
            None
        } else {
            Some(Handle::try_current().map_err(|_| SessionError::NoRuntime)?)
        };

        let shared = Arc::new(Shared {
            delay,
            blacklist: Mutex::new(None),
            window: Mutex::new(Window::Idle),
            changes: Emitter::new(),
            runtime,
        });

        let song_listener = song.music_changes().subscribe(forward(&shared));
        let routing_listener = routing.music_changes().subscribe(forward(&shared));
        let settings_listener = settings.music_changes().subscribe(forward(&shared));

        debug!(song = %song.id(), delay_ms, "change aggregator attached");

        Ok(Self {
            song: song.clone(),
            routing: Arc::clone(routing),
            settings: Arc::clone(settings),
            shared,
            song_listener,
            routing_listener,
            settings_listener,
            detached: false,
        })
    }

    pub fn song(&self) -> &Song {
        &self.song
    }

    pub fn routing(&self) -> &Arc<RoutingConfig> {
        &self.routing
    }

    /// Quiescence window length
    pub fn delay(&self) -> Duration {
        self.shared.delay
    }

    /// Handle a change token from any of the observed sources
    pub fn on_source_event(&self, token: &str) {
        self.shared.on_source_event(token);
    }

    /// Replace the set of ignored tokens (`None` disables filtering).
    ///
    /// Applies to tokens received after the call; an open window is not
    /// affected.
    pub fn set_blacklist(&self, blacklist: Option<HashSet<String>>) {
        *self.shared.blacklist.lock() = blacklist;
    }

    pub fn blacklist(&self) -> Option<HashSet<String>> {
        self.shared.blacklist.lock().clone()
    }

    /// Whether a quiescence window is currently open
    pub fn is_pending(&self) -> bool {
        matches!(*self.shared.lock_window(), Window::Pending(_))
    }

    /// Register a listener for the coalesced "relevant change" notification
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.shared.changes.subscribe(move |_: &()| listener())
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.shared.changes.unsubscribe(id)
    }

    /// Detach from all sources and cancel any open window
    pub fn cleanup(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if self.detached {
            return;
        }
        self.detached = true;
        self.song.music_changes().unsubscribe(self.song_listener);
        self.routing.music_changes().unsubscribe(self.routing_listener);
        self.settings.music_changes().unsubscribe(self.settings_listener);
        self.shared.detach();
        debug!(song = %self.song.id(), "change aggregator detached");
    }
}

impl Drop for ChangeAggregator {
    fn drop(&mut self) {
        self.detach();
    }
}

fn forward(shared: &Arc<Shared>) -> impl Fn(&String) + Send + Sync + 'static {
    let weak = Arc::downgrade(shared);
    move |token: &String| {
        if let Some(shared) = weak.upgrade() {
            shared.on_source_event(token);
        }
    }
}
