//! Application model types: `App`, `Section` and pointer routing.
//!
//! Every listing on the page becomes a `Section` that owns its own
//! transport (and therefore its own playback unit). The units coordinate
//! through the shared bus, so the model never has to stop one section
//! when another starts.

use std::cell::Cell;
use std::rc::Rc;

use ratatui::layout::Rect;

use crate::library::{Page, Track};
use crate::playback::{
    BarBounds, LifecycleState, MediaPipeline, Navigation, PlaybackBus, PlaybackUnit,
    PlaylistTransport, PointerCapture, ScrubGesture, UnitSignal,
};

/// Hands pointer moves and releases to whichever section started a drag,
/// no matter where on screen the pointer ends up.
#[derive(Clone)]
pub struct PointerRoute {
    owner: Rc<Cell<Option<usize>>>,
    section: usize,
}

pub struct RouteGuard {
    owner: Rc<Cell<Option<usize>>>,
    section: usize,
}

impl Drop for RouteGuard {
    fn drop(&mut self) {
        if self.owner.get() == Some(self.section) {
            self.owner.set(None);
        }
    }
}

impl PointerCapture for PointerRoute {
    type Guard = RouteGuard;

    fn capture(&self) -> RouteGuard {
        self.owner.set(Some(self.section));
        RouteGuard {
            owner: self.owner.clone(),
            section: self.section,
        }
    }
}

/// One listing on the page with its own transport.
pub struct Section<P: MediaPipeline> {
    pub title: String,
    pub transport: PlaylistTransport<P>,
    /// Cursor in the track list; independent from the active track.
    pub selected: usize,
    gesture: ScrubGesture<PointerRoute>,
}

impl<P: MediaPipeline> Section<P> {
    pub fn tracks(&self) -> &[Track] {
        self.transport.tracks()
    }

    pub fn unit(&self) -> &PlaybackUnit<P> {
        self.transport.unit()
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.is_dragging()
    }

    fn follow_active(&mut self, nav: Navigation) {
        if let Navigation::Loaded(i) = nav {
            self.selected = i;
            self.cancel_drag();
        }
    }

    /// Drop the gesture and its overlay without seeking.
    fn cancel_drag(&mut self) {
        self.gesture.cancel();
        self.transport.unit_mut().cancel_scrub();
    }
}

/// The main application model.
pub struct App<P: MediaPipeline> {
    pub title: Option<String>,
    sections: Vec<Section<P>>,
    focus: usize,
    bars: Vec<Option<Rect>>,
    pointer_owner: Rc<Cell<Option<usize>>>,
    pub metadata_window: bool,
    /// Last playback failure, shown until the next successful start.
    pub status: Option<String>,
}

impl<P: MediaPipeline> App<P> {
    /// Build one section per listing, each with a fresh pipeline from `pipeline`.
    pub fn new(page: Page, bus: &PlaybackBus, mut pipeline: impl FnMut() -> P) -> Self {
        let pointer_owner = Rc::new(Cell::new(None));
        let sections = page
            .listings
            .into_iter()
            .enumerate()
            .map(|(i, listing)| {
                let unit = PlaybackUnit::new(pipeline(), bus);
                log::debug!("app: section {i} {:?} on {}", listing.title, unit.id());
                Section {
                    title: listing.title,
                    transport: PlaylistTransport::new(unit, listing.tracks),
                    selected: 0,
                    gesture: ScrubGesture::new(PointerRoute {
                        owner: pointer_owner.clone(),
                        section: i,
                    }),
                }
            })
            .collect();

        Self {
            title: page.title,
            sections,
            focus: 0,
            bars: Vec::new(),
            pointer_owner,
            metadata_window: false,
            status: None,
        }
    }

    pub fn sections(&self) -> &[Section<P>] {
        &self.sections
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn focused(&self) -> Option<&Section<P>> {
        self.sections.get(self.focus)
    }

    fn focused_mut(&mut self) -> Option<&mut Section<P>> {
        self.sections.get_mut(self.focus)
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    pub fn focus_next(&mut self) {
        if !self.sections.is_empty() {
            self.focus = (self.focus + 1) % self.sections.len();
        }
    }

    pub fn focus_prev(&mut self) {
        let len = self.sections.len();
        if len > 0 {
            self.focus = (self.focus + len - 1) % len;
        }
    }

    /// Move the cursor down the focused list, wrapping at the end.
    pub fn select_next(&mut self) {
        if let Some(s) = self.focused_mut() {
            let len = s.tracks().len();
            if len > 0 {
                s.selected = (s.selected + 1) % len;
            }
        }
    }

    pub fn select_prev(&mut self) {
        if let Some(s) = self.focused_mut() {
            let len = s.tracks().len();
            if len > 0 {
                s.selected = (s.selected + len - 1) % len;
            }
        }
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.focused().and_then(|s| s.tracks().get(s.selected))
    }

    /// Play the track under the cursor. Re-selecting the active track resumes it.
    pub fn play_selected(&mut self) {
        let Some(s) = self.focused_mut() else {
            return;
        };
        if s.transport.active() == Some(s.selected) {
            s.transport.unit_mut().play();
        } else {
            let selected = s.selected;
            let nav = s.transport.load_at(selected, true);
            s.follow_active(nav);
        }
    }

    pub fn toggle_play(&mut self) {
        if let Some(s) = self.focused_mut() {
            s.transport.toggle_play();
        }
    }

    pub fn next_track(&mut self) {
        if let Some(s) = self.focused_mut() {
            let nav = s.transport.next();
            s.follow_active(nav);
        }
    }

    pub fn prev_track(&mut self) {
        if let Some(s) = self.focused_mut() {
            let nav = s.transport.prev();
            s.follow_active(nav);
        }
    }

    /// Jump `delta` seconds from the current playhead of the focused section.
    pub fn seek_by(&mut self, delta: f64) -> bool {
        let Some(s) = self.focused_mut() else {
            return false;
        };
        let session = s.unit().session();
        if !(session.duration > 0.0) {
            return false;
        }
        let ratio = (session.position + delta) / session.duration;
        s.transport.seek(ratio)
    }

    /// Seek the focused section to `tenths` / 10 of its length.
    pub fn seek_to_tenths(&mut self, tenths: u8) -> bool {
        match self.focused_mut() {
            Some(s) => s.transport.seek(f64::from(tenths.min(10)) / 10.0),
            None => false,
        }
    }

    /// The section currently producing sound, if any.
    pub fn audible(&self) -> Option<usize> {
        self.sections
            .iter()
            .position(|s| s.unit().state() == LifecycleState::Playing)
    }

    /// Section that media keys act on: the audible one, else the focused one.
    pub fn control_target(&self) -> usize {
        self.audible().unwrap_or(self.focus)
    }

    pub fn play_target(&mut self) {
        let target = self.control_target();
        if let Some(s) = self.sections.get_mut(target) {
            s.transport.unit_mut().play();
        }
    }

    pub fn pause_target(&mut self) {
        let target = self.control_target();
        if let Some(s) = self.sections.get_mut(target) {
            s.transport.unit_mut().pause();
        }
    }

    pub fn toggle_target(&mut self) {
        let target = self.control_target();
        if let Some(s) = self.sections.get_mut(target) {
            s.transport.toggle_play();
        }
    }

    pub fn next_target(&mut self) {
        let target = self.control_target();
        if let Some(s) = self.sections.get_mut(target) {
            let nav = s.transport.next();
            s.follow_active(nav);
        }
    }

    pub fn prev_target(&mut self) {
        let target = self.control_target();
        if let Some(s) = self.sections.get_mut(target) {
            let nav = s.transport.prev();
            s.follow_active(nav);
        }
    }

    /// Pause every section.
    pub fn pause_all(&mut self) {
        for s in &mut self.sections {
            s.transport.unit_mut().pause();
        }
    }

    /// Record where each section's progress bar was drawn.
    pub fn set_bar_areas(&mut self, bars: Vec<Option<Rect>>) {
        self.bars = bars;
    }

    fn bar_at(&self, column: u16, row: u16) -> Option<(usize, BarBounds)> {
        self.bars.iter().enumerate().find_map(|(i, bar)| {
            let area = (*bar)?;
            let inside = column >= area.x
                && column < area.x.saturating_add(area.width)
                && row >= area.y
                && row < area.y.saturating_add(area.height);
            inside.then(|| (i, bar_bounds(area)))
        })
    }

    /// Section currently holding the pointer, if a drag is in progress.
    pub fn pointer_owner(&self) -> Option<usize> {
        self.pointer_owner.get()
    }

    /// Button pressed. Starts a drag when it lands on a progress bar.
    pub fn pointer_down(&mut self, column: u16, row: u16) -> bool {
        let Some((i, bar)) = self.bar_at(column, row) else {
            return false;
        };
        if let Some(owner) = self.pointer_owner.get().filter(|&o| o != i) {
            self.cancel_drag_of(owner);
        }
        self.focus = i;
        let s = &mut self.sections[i];
        let signal = s.gesture.press(bar, f64::from(column));
        s.transport.apply_scrub(signal);
        true
    }

    /// Pointer moved with the button held; routed to the drag owner.
    pub fn pointer_drag(&mut self, column: u16) {
        let Some(owner) = self.pointer_owner.get() else {
            return;
        };
        let s = &mut self.sections[owner];
        if let Some(signal) = s.gesture.drag_to(f64::from(column)) {
            s.transport.apply_scrub(signal);
        }
    }

    /// Button released; commits the drag owner's scrub.
    pub fn pointer_up(&mut self, column: Option<u16>) {
        let Some(owner) = self.pointer_owner.get() else {
            return;
        };
        let s = &mut self.sections[owner];
        if let Some(signal) = s.gesture.release(column.map(f64::from)) {
            s.transport.apply_scrub(signal);
        }
    }

    /// One-shot seek when a bar is clicked without dragging.
    pub fn click(&mut self, column: u16, row: u16) -> bool {
        let Some((i, bar)) = self.bar_at(column, row) else {
            return false;
        };
        self.focus = i;
        let s = &mut self.sections[i];
        let signal = s.gesture.click(bar, f64::from(column));
        s.transport.apply_scrub(signal);
        true
    }

    /// Abandon any drag in progress; the bar snaps back to the playhead.
    pub fn cancel_drag(&mut self) {
        if let Some(owner) = self.pointer_owner.get() {
            self.cancel_drag_of(owner);
        }
    }

    fn cancel_drag_of(&mut self, i: usize) {
        if let Some(s) = self.sections.get_mut(i) {
            s.cancel_drag();
        }
    }

    /// Run event turns until no section starts playing, so every section has
    /// reacted to the latest start before anything is drawn.
    pub fn poll(&mut self) -> Vec<(usize, UnitSignal)> {
        let mut out = Vec::new();
        // Each extra pass can only be caused by a start; one per section at most.
        for _ in 0..=self.sections.len() {
            if !self.poll_pass(&mut out) {
                break;
            }
        }
        out
    }

    /// Poll every section once. Returns whether any of them started playing.
    fn poll_pass(&mut self, out: &mut Vec<(usize, UnitSignal)>) -> bool {
        let mut started = false;
        for (i, s) in self.sections.iter_mut().enumerate() {
            let before = s.transport.active();
            let mut rebound = false;
            for signal in s.transport.poll() {
                match &signal {
                    UnitSignal::Rejected(e) => {
                        self.status = Some(format!("{}: {e}", s.title));
                    }
                    UnitSignal::Started => {
                        self.status = None;
                        started = true;
                    }
                    UnitSignal::AdvanceRequested => {
                        rebound = true;
                        if s.selected == before.unwrap_or(0) {
                            if let Some(active) = s.transport.active() {
                                s.selected = active;
                            }
                        }
                    }
                    _ => {}
                }
                out.push((i, signal));
            }
            if rebound || s.transport.active() != before {
                s.cancel_drag();
            }
        }
        started
    }
}

/// Map a drawn bar to pointer bounds so its first and last cells hit 0 and 1.
fn bar_bounds(area: Rect) -> BarBounds {
    BarBounds::new(
        f64::from(area.x),
        f64::from(area.width.saturating_sub(1).max(1)),
    )
}
