// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Session coordination for a multi-view song editor.
//!
//! Each open song is shown through a group of synchronized views. This
//! crate provides:
//! - `SessionManager`: the registry of open songs, their view groups and
//!   the open/close/activate sequencing
//! - `ActiveSongArbiter`: the choice of the single song bound to the
//!   output device
//! - `ChangeAggregator`: a filtered, fixed-window coalescer of
//!   music-impacting change notifications
//!
//! Rendering, playback, file I/O and undo execution are external
//! collaborators reached through the `View`, `Desktop`, `DeviceBinding`
//! and `LinkOpener` traits.

pub mod aggregator;
pub mod config;
pub mod device;
pub mod error;
pub mod session;
pub mod song;
pub mod undo;
pub mod view;

pub use aggregator::ChangeAggregator;
pub use config::SessionConfig;
pub use device::DeviceBinding;
pub use error::{DeviceError, Result, SessionError};
pub use session::{
    ActiveSongArbiter, LinkOpener, LogLinkOpener, MemoLink, SessionEvent, SessionManager,
};
pub use song::{PlaybackSettings, RoutingConfig, Song, SongId, PROP_MUSIC_GENERATION};
pub use view::{Desktop, LayoutSlot, View, ViewGroup, ViewId, ViewRef, ViewRole};
