// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Session manager: the registry of open songs and their views.
//!
//! All registry, view-group and active-song mutations happen on a single
//! session task. [`SessionManager`] is a cheap, cloneable handle that posts
//! commands to that task from any thread; commands are handled in the
//! order they were posted.
//!
//! Some steps have to wait until work already queued has been handled
//! (activating a song after its editor took focus, clearing the
//! save-needed flag after the editors initialized, recomputing the active
//! song once the window system settled after a close). Those steps are
//! posted back onto the same queue. [`SessionManager::settle`] resolves
//! once all of them have run.

pub mod arbiter;
pub mod events;
pub mod links;

pub use arbiter::ActiveSongArbiter;
pub use events::SessionEvent;
pub use links::{extract_links, LinkOpener, LogLinkOpener, MemoLink};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use crate::config::SessionConfig;
use crate::device::DeviceBinding;
use crate::error::{Result, SessionError};
use crate::song::{ListenerId, SaveStateChange, Song, SongId};
use crate::undo::UndoRegistry;
use crate::view::group::GroupInfo;
use crate::view::{Desktop, ViewGroup, ViewId, ViewRef, ViewRole};

/// Work posted back onto the session queue
#[derive(Debug)]
enum FollowUp {
    Activate(Song),
    ClearSaveNeeded(Song),
    RecomputeActive,
}

enum Command {
    Open {
        song: Song,
        make_active: bool,
        savable: bool,
    },
    Close {
        song: Song,
        enforce: bool,
        reply: oneshot::Sender<Result<bool>>,
    },
    ShowTertiary {
        song: Song,
        reply: oneshot::Sender<Result<ViewId>>,
    },
    ViewActivated(ViewRef),
    ViewClosed(ViewRef),
    SaveStateChanged {
        song: Song,
        change: SaveStateChange,
    },
    OpenedSongs(oneshot::Sender<Vec<Song>>),
    ActiveSong(oneshot::Sender<Option<Song>>),
    GroupInfo {
        song: Song,
        reply: oneshot::Sender<Option<GroupInfo>>,
    },
    SongForFile {
        path: PathBuf,
        reply: oneshot::Sender<Option<Song>>,
    },
    ShowFile {
        path: PathBuf,
        make_active: bool,
        reply: oneshot::Sender<Option<Song>>,
    },
    Settle(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
    FollowUp(FollowUp),
}

/// Handle to the session task
#[derive(Clone)]
pub struct SessionManager {
    commands: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    /// Start the session task on the current tokio runtime.
    ///
    /// # Arguments
    /// * `config` - Session settings
    /// * `desktop` - Window system creating and hosting views
    /// * `device` - Collaborator binding the active song to the output
    /// * `opener` - Opens memo links of newly activated songs
    pub fn spawn(
        config: &SessionConfig,
        desktop: Box<dyn Desktop>,
        device: Box<dyn DeviceBinding>,
        opener: Arc<dyn LinkOpener>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(config.event_capacity.max(1));

        let task = SessionTask {
            registry: HashMap::new(),
            desktop,
            arbiter: ActiveSongArbiter::new(device),
            undo: UndoRegistry::new(),
            events: events.clone(),
            queue: tx.downgrade(),
            follow_ups: 0,
            settle_waiters: Vec::new(),
            open_memo_links: config.open_memo_links,
            opener,
        };
        let handle = tokio::spawn(task.run(rx));

        (Self { commands: tx, events }, handle)
    }

    /// Show `song`, creating its views if it is not open yet.
    ///
    /// Already open songs only get their primary view brought to the front.
    ///
    /// # Arguments
    /// * `make_active` - Try to make the song the active song
    /// * `savable` - If false, the save-needed flag is cleared once the views
    ///   have initialized
    pub fn open(&self, song: Song, make_active: bool, savable: bool) -> Result<()> {
        self.post(Command::Open {
            song,
            make_active,
            savable,
        })
    }

    /// Close every view of `song`.
    ///
    /// # Arguments
    /// * `enforce` - Close without asking the user about unsaved changes
    ///
    /// # Returns
    /// * `Ok(true)` if the song was closed
    /// * `Ok(false)` if the user refused; nothing changed
    /// * `Err(NotOpen)` if the song is not open
    pub async fn close(&self, song: &Song, enforce: bool) -> Result<bool> {
        self.request(|reply| Command::Close {
            song: song.clone(),
            enforce,
            reply,
        })
        .await?
    }

    /// Show the tertiary view of an open song, creating it next to the
    /// primary view if needed.
    pub async fn show_tertiary(&self, song: &Song) -> Result<ViewId> {
        self.request(|reply| Command::ShowTertiary {
            song: song.clone(),
            reply,
        })
        .await?
    }

    /// Report that the window system gave focus to `view`
    pub fn view_activated(&self, view: ViewRef) -> Result<()> {
        self.post(Command::ViewActivated(view))
    }

    /// Report that the user closed `view` through the window system
    pub fn view_closed(&self, view: ViewRef) -> Result<()> {
        self.post(Command::ViewClosed(view))
    }

    pub async fn opened_songs(&self) -> Result<Vec<Song>> {
        self.request(Command::OpenedSongs).await
    }

    pub async fn is_open(&self, song: &Song) -> Result<bool> {
        Ok(self.group_info(song).await?.is_some())
    }

    pub async fn active_song(&self) -> Result<Option<Song>> {
        self.request(Command::ActiveSong).await
    }

    /// View identities of an open song
    pub async fn group_info(&self, song: &Song) -> Result<Option<GroupInfo>> {
        self.request(|reply| Command::GroupInfo {
            song: song.clone(),
            reply,
        })
        .await
    }

    /// Open song backed by `path`, if any
    pub async fn song_for_file(&self, path: impl AsRef<Path>) -> Result<Option<Song>> {
        let path = path.as_ref().to_path_buf();
        self.request(|reply| Command::SongForFile { path, reply }).await
    }

    /// Bring the open song backed by `path` to the front.
    ///
    /// With `make_active` the song is also made the active song. Loading
    /// songs that are not open is left to the caller, which then calls
    /// [`open`](Self::open).
    ///
    /// # Returns
    /// * `Ok(Some(song))` if a song backed by `path` is open
    /// * `Ok(None)` otherwise
    pub async fn show_file(
        &self,
        path: impl AsRef<Path>,
        make_active: bool,
    ) -> Result<Option<Song>> {
        let path = path.as_ref().to_path_buf();
        self.request(|reply| Command::ShowFile {
            path,
            make_active,
            reply,
        })
        .await
    }

    /// Wait until every request posted so far, and every follow-up step
    /// they caused, has been handled
    pub async fn settle(&self) -> Result<()> {
        self.request(Command::Settle).await
    }

    /// Close all songs without prompting and stop the session task
    pub async fn shutdown(&self) -> Result<()> {
        self.request(Command::Shutdown).await
    }

    /// Receive lifecycle events published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn post(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| SessionError::Stopped)
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.post(make(tx))?;
        rx.await.map_err(|_| SessionError::Stopped)
    }
}

struct Entry {
    song: Song,
    group: ViewGroup,
    save_listener: ListenerId,
    pending_resets: usize,
}

struct SessionTask {
    registry: HashMap<SongId, Entry>,
    desktop: Box<dyn Desktop>,
    arbiter: ActiveSongArbiter,
    undo: UndoRegistry,
    events: broadcast::Sender<SessionEvent>,
    queue: mpsc::WeakUnboundedSender<Command>,
    follow_ups: usize,
    settle_waiters: Vec<oneshot::Sender<()>>,
    open_memo_links: bool,
    opener: Arc<dyn LinkOpener>,
}

impl SessionTask {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        debug!("session task started");
        while let Some(command) = rx.recv().await {
            let keep_running = self.handle(command);
            if self.follow_ups == 0 {
                for waiter in self.settle_waiters.drain(..) {
                    let _ = waiter.send(());
                }
            }
            if !keep_running {
                break;
            }
        }
        debug!(open = self.registry.len(), "session task stopped");
    }

    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Open {
                song,
                make_active,
                savable,
            } => self.open(song, make_active, savable),
            Command::Close {
                song,
                enforce,
                reply,
            } => {
                let _ = reply.send(self.close(&song, enforce));
            }
            Command::ShowTertiary { song, reply } => {
                let _ = reply.send(self.show_tertiary(&song));
            }
            Command::ViewActivated(view) => self.view_activated(view),
            Command::ViewClosed(view) => self.view_closed(view),
            Command::SaveStateChanged { song, change } => self.save_state_changed(&song, change),
            Command::OpenedSongs(reply) => {
                let _ = reply.send(self.open_songs());
            }
            Command::ActiveSong(reply) => {
                let _ = reply.send(self.arbiter.active().cloned());
            }
            Command::GroupInfo { song, reply } => {
                let _ = reply.send(self.registry.get(&song.id()).map(|e| e.group.info()));
            }
            Command::SongForFile { path, reply } => {
                let _ = reply.send(self.song_for_file(&path));
            }
            Command::ShowFile {
                path,
                make_active,
                reply,
            } => {
                let found = self.song_for_file(&path);
                if let Some(song) = &found {
                    self.open(song.clone(), make_active, true);
                }
                let _ = reply.send(found);
            }
            Command::Settle(reply) => self.settle_waiters.push(reply),
            Command::Shutdown(reply) => {
                let songs = self.open_songs();
                for song in &songs {
                    let _ = self.close(song, true);
                }
                info!(closed = songs.len(), "session shut down");
                let _ = reply.send(());
                return false;
            }
            Command::FollowUp(step) => {
                self.follow_ups = self.follow_ups.saturating_sub(1);
                self.follow_up(step);
            }
        }
        true
    }

    fn open(&mut self, song: Song, make_active: bool, savable: bool) {
        if let Some(entry) = self.registry.get_mut(&song.id()) {
            debug!(song = %song.id(), "song already open, bringing its editor to front");
            entry.group.primary_mut().request_foreground();
            self.post_follow_up(if make_active {
                FollowUp::Activate(song)
            } else {
                FollowUp::RecomputeActive
            });
            return;
        }

        self.undo.bind(&song);

        let mut primary = self.desktop.create_view(&song, ViewRole::Primary);
        self.desktop.dock(primary.as_mut(), ViewRole::Primary.slot());
        primary.open();

        let mut secondary = self.desktop.create_view(&song, ViewRole::Secondary);
        self.desktop.dock(secondary.as_mut(), ViewRole::Secondary.slot());
        secondary.open();

        let mut group = ViewGroup::new(&song, primary, secondary);
        group.primary_mut().request_foreground();

        let save_listener = self.watch_save_state(&song);
        self.registry.insert(
            song.id(),
            Entry {
                song: song.clone(),
                group,
                save_listener,
                pending_resets: 0,
            },
        );
        info!(song = %song.id(), name = %song.name(), open = self.registry.len(), "song opened");
        self.publish(SessionEvent::Opened(song.clone()));

        // Queued so the arbiter runs after the editor took focus
        if make_active {
            self.post_follow_up(FollowUp::Activate(song.clone()));
        } else {
            self.post_follow_up(FollowUp::RecomputeActive);
        }
        if !savable {
            self.post_follow_up(FollowUp::ClearSaveNeeded(song.clone()));
        }
        if make_active && self.open_memo_links {
            self.spawn_memo_links(&song);
        }
    }

    fn close(&mut self, song: &Song, enforce: bool) -> Result<bool> {
        let not_open = SessionError::NotOpen { song: song.id() };
        let entry = self.registry.get_mut(&song.id()).ok_or(not_open)?;

        if !entry.group.close(enforce) {
            info!(song = %song.id(), "close refused, song stays open");
            return Ok(false);
        }

        let entry = self
            .registry
            .remove(&song.id())
            .ok_or(SessionError::NotOpen { song: song.id() })?;
        entry.song.save_state().unsubscribe(entry.save_listener);
        self.undo.unbind(&entry.song);

        info!(song = %song.id(), enforce, open = self.registry.len(), "song closed");
        self.publish(SessionEvent::Closed(entry.song.clone()));

        self.arbiter.song_closed(&entry.song);
        self.post_follow_up(FollowUp::RecomputeActive);
        Ok(true)
    }

    fn show_tertiary(&mut self, song: &Song) -> Result<ViewId> {
        let entry = self
            .registry
            .get_mut(&song.id())
            .ok_or(SessionError::NotOpen { song: song.id() })?;

        if let Some(id) = entry.group.tertiary_id() {
            if let Some(view) = entry.group.tertiary_mut() {
                view.request_foreground();
            }
            return Ok(id);
        }

        let mut view = self.desktop.create_view(song, ViewRole::Tertiary);
        self.desktop.open_after(view.as_mut(), entry.group.primary());
        let id = entry.group.attach_tertiary(view);
        debug!(song = %song.id(), view = %id, "tertiary view created");
        Ok(id)
    }

    fn view_activated(&mut self, view: ViewRef) {
        let Some(entry) = self.registry.get_mut(&view.song().id()) else {
            trace!(?view, "activation of a view with no open song");
            return;
        };

        let group = &mut entry.group;
        match view {
            ViewRef::Primary(_) => {
                if !group.tertiary_showing() {
                    group.secondary_mut().request_visible();
                }
            }
            ViewRef::Secondary(_) => {
                if !group.tertiary_showing() {
                    group.primary_mut().request_visible();
                }
            }
            ViewRef::Tertiary(_) => group.secondary_mut().request_visible(),
        }

        self.post_follow_up(FollowUp::RecomputeActive);
    }

    fn view_closed(&mut self, view: ViewRef) {
        match view {
            ViewRef::Primary(song) | ViewRef::Secondary(song) => {
                if self.registry.contains_key(&song.id()) {
                    debug!(song = %song.id(), "editor closed by user, closing song");
                    let _ = self.close(&song, true);
                }
            }
            ViewRef::Tertiary(song) => {
                if let Some(entry) = self.registry.get_mut(&song.id()) {
                    entry.group.detach_tertiary();
                    debug!(song = %song.id(), "tertiary view closed by user");
                }
            }
        }
    }

    fn save_state_changed(&mut self, song: &Song, change: SaveStateChange) {
        let Some(entry) = self.registry.get_mut(&song.id()) else {
            return;
        };
        if !(change.old && !change.new) {
            return;
        }
        if entry.pending_resets > 0 {
            entry.pending_resets -= 1;
            return;
        }
        if song.file().is_some() {
            self.publish(SessionEvent::Saved(song.clone()));
        }
    }

    fn follow_up(&mut self, step: FollowUp) {
        trace!(?step, "follow-up");
        match step {
            FollowUp::Activate(song) => {
                if self.registry.contains_key(&song.id()) {
                    self.arbiter.activate(&song);
                }
            }
            FollowUp::ClearSaveNeeded(song) => {
                if let Some(entry) = self.registry.get_mut(&song.id()) {
                    if song.save_needed() {
                        entry.pending_resets += 1;
                        song.set_save_needed(false);
                    }
                }
            }
            FollowUp::RecomputeActive => {
                let open = self.open_songs();
                let selected = self.desktop.selected_editor();
                self.arbiter.recompute(&open, selected.as_ref());
            }
        }
    }

    fn song_for_file(&self, path: &Path) -> Option<Song> {
        self.registry
            .values()
            .find(|e| e.song.file().as_deref() == Some(path))
            .map(|e| e.song.clone())
    }

    fn open_songs(&self) -> Vec<Song> {
        self.registry.values().map(|e| e.song.clone()).collect()
    }

    fn watch_save_state(&self, song: &Song) -> ListenerId {
        let queue = self.queue.clone();
        let owner = song.clone();
        song.save_state().subscribe(move |change: &SaveStateChange| {
            if let Some(tx) = queue.upgrade() {
                let _ = tx.send(Command::SaveStateChanged {
                    song: owner.clone(),
                    change: *change,
                });
            }
        })
    }

    fn post_follow_up(&mut self, step: FollowUp) {
        if let Some(tx) = self.queue.upgrade() {
            if tx.send(Command::FollowUp(step)).is_ok() {
                self.follow_ups += 1;
            }
        }
    }

    fn spawn_memo_links(&self, song: &Song) {
        let comments = song.comments();
        if comments.is_empty() {
            return;
        }
        let name = song.name();
        let opener = Arc::clone(&self.opener);
        tokio::task::spawn_blocking(move || {
            links::open_memo_links(&name, &comments, opener.as_ref());
        });
    }

    fn publish(&self, event: SessionEvent) {
        debug!(event = event.name(), song = %event.song().id(), "session event");
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
