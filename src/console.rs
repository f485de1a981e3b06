// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Headless desktop and device used by the command-line demo.
//!
//! Views print what they are asked to do instead of drawing anything.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use songdesk::song::{RoutingConfig, Song, SongId};
use songdesk::view::{Desktop, LayoutSlot, View, ViewRef, ViewRole};
use songdesk::{DeviceBinding, DeviceError};

/// View selected in each layout slot
#[derive(Debug, Default)]
struct Selection {
    editor: Option<ViewRef>,
    structure: Option<ViewRef>,
}

type SharedSelection = Arc<Mutex<Selection>>;

fn select(selection: &SharedSelection, view: ViewRef) {
    let mut selection = selection.lock();
    match view.role().slot() {
        LayoutSlot::Editor => selection.editor = Some(view),
        LayoutSlot::Structure => selection.structure = Some(view),
    }
}

fn deselect(selection: &SharedSelection, view: &ViewRef) {
    let mut selection = selection.lock();
    let slot = match view.role().slot() {
        LayoutSlot::Editor => &mut selection.editor,
        LayoutSlot::Structure => &mut selection.structure,
    };
    if slot.as_ref() == Some(view) {
        *slot = None;
    }
}

/// A view that logs its lifecycle to stdout
pub struct ConsoleView {
    song: Song,
    role: ViewRole,
    opened: bool,
    selection: SharedSelection,
}

impl ConsoleView {
    fn me(&self) -> ViewRef {
        ViewRef::new(self.role, self.song.clone())
    }

    fn label(&self) -> String {
        format!("{:?} view of \"{}\"", self.role, self.song.name())
    }
}

impl View for ConsoleView {
    fn open(&mut self) {
        self.opened = true;
        println!("  open      {}", self.label());
    }

    fn close(&mut self) -> bool {
        if self.role == ViewRole::Primary && self.song.save_needed() {
            println!("  close     {} (discarding unsaved changes)", self.label());
        } else {
            println!("  close     {}", self.label());
        }
        self.close_silent();
        true
    }

    fn close_silent(&mut self) {
        self.opened = false;
        deselect(&self.selection, &self.me());
    }

    fn request_foreground(&mut self) {
        println!("  focus     {}", self.label());
        select(&self.selection, self.me());
    }

    fn request_visible(&mut self) {
        println!("  reveal    {}", self.label());
    }

    fn is_opened(&self) -> bool {
        self.opened
    }

    fn is_showing(&self) -> bool {
        let selection = self.selection.lock();
        let me = Some(self.me());
        match self.role.slot() {
            LayoutSlot::Editor => selection.editor == me,
            LayoutSlot::Structure => selection.structure == me,
        }
    }

    fn set_paired(&mut self, sibling: ViewRef) {
        println!("  pair      {} with {:?}", self.label(), sibling.role());
    }

    fn song(&self) -> &Song {
        &self.song
    }
}

/// Desktop whose views print to stdout
#[derive(Default)]
pub struct ConsoleDesktop {
    selection: SharedSelection,
}

impl ConsoleDesktop {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Desktop for ConsoleDesktop {
    fn create_view(&mut self, song: &Song, role: ViewRole) -> Box<dyn View> {
        Box::new(ConsoleView {
            song: song.clone(),
            role,
            opened: false,
            selection: Arc::clone(&self.selection),
        })
    }

    fn dock(&mut self, view: &mut dyn View, slot: LayoutSlot) {
        println!("  dock      \"{}\" into {:?}", view.song().name(), slot);
    }

    fn open_after(&mut self, view: &mut dyn View, anchor: &dyn View) {
        println!(
            "  place     new view of \"{}\" after \"{}\"",
            view.song().name(),
            anchor.song().name()
        );
        view.open();
    }

    fn selected_editor(&self) -> Option<ViewRef> {
        self.selection.lock().editor.clone()
    }
}

/// Device binding that always succeeds and reports to stdout
#[derive(Default)]
pub struct ConsoleDevice {
    routings: HashMap<SongId, Arc<RoutingConfig>>,
    active: Option<SongId>,
}

impl ConsoleDevice {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeviceBinding for ConsoleDevice {
    fn check_activatable(&self, _song: &Song) -> Result<(), DeviceError> {
        Ok(())
    }

    fn find_routing_config(&mut self, song: &Song) -> Result<Arc<RoutingConfig>, DeviceError> {
        Ok(Arc::clone(
            self.routings
                .entry(song.id())
                .or_insert_with(|| Arc::new(RoutingConfig::new(song.id()))),
        ))
    }

    fn set_active(&mut self, song: &Song, _routing: Arc<RoutingConfig>) -> Result<(), DeviceError> {
        println!("  device    bound to \"{}\"", song.name());
        self.active = Some(song.id());
        Ok(())
    }

    fn clear_active(&mut self) {
        println!("  device    released");
        self.active = None;
    }

    fn active_song(&self) -> Option<SongId> {
        self.active
    }
}
