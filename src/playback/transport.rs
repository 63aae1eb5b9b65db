//! Sequencing of an ordered track list on top of one playback unit.

use crate::library::Track;

use super::error::PlaybackError;
use super::gesture::ScrubSignal;
use super::pipeline::MediaPipeline;
use super::unit::{PlaybackUnit, UnitSignal};

/// Outcome of a navigation request. Navigation is advisory, so an
/// impossible request is reported rather than treated as an error.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Navigation {
    Loaded(usize),
    Ignored,
}

pub struct PlaylistTransport<P: MediaPipeline> {
    unit: PlaybackUnit<P>,
    tracks: Vec<Track>,
    active: Option<usize>,
}

impl<P: MediaPipeline> PlaylistTransport<P> {
    /// Take ownership of `unit` and cue the first track, without playing it.
    pub fn new(mut unit: PlaybackUnit<P>, tracks: Vec<Track>) -> Self {
        unit.set_auto_advance(true);
        let mut transport = Self {
            unit,
            tracks: Vec::new(),
            active: None,
        };
        transport.set_tracks(tracks);
        transport
    }

    /// Replace the playlist. Resets the active index and cues index 0.
    pub fn set_tracks(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
        self.active = None;
        self.load_at(0, false);
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn active_track(&self) -> Option<&Track> {
        self.active.and_then(|i| self.tracks.get(i))
    }

    pub fn unit(&self) -> &PlaybackUnit<P> {
        &self.unit
    }

    pub fn unit_mut(&mut self) -> &mut PlaybackUnit<P> {
        &mut self.unit
    }

    /// Bind the track at `index` and make it active; play once bound if asked.
    pub fn load_at(&mut self, index: usize, autoplay: bool) -> Navigation {
        let index = match self.checked_index(index) {
            Ok(i) => i,
            Err(e) => {
                log::trace!("transport: {e}");
                return Navigation::Ignored;
            }
        };
        self.active = Some(index);
        self.unit.bind_source(self.tracks[index].clone());
        if autoplay {
            self.unit.play();
        }
        Navigation::Loaded(index)
    }

    pub fn next(&mut self) -> Navigation {
        match self.active {
            Some(i) if !self.tracks.is_empty() => self.load_at((i + 1) % self.tracks.len(), true),
            _ => self.load_at(0, true),
        }
    }

    pub fn prev(&mut self) -> Navigation {
        let len = self.tracks.len();
        match self.active {
            Some(i) if len > 0 => self.load_at((i + len - 1) % len, true),
            _ => self.load_at(len.saturating_sub(1), true),
        }
    }

    pub fn toggle_play(&mut self) {
        self.unit.toggle_play();
    }

    pub fn seek(&mut self, ratio: f64) -> bool {
        self.unit.seek(ratio)
    }

    pub fn apply_scrub(&mut self, signal: ScrubSignal) {
        self.unit.apply_scrub(signal);
    }

    /// Run the unit's event turn and advance when its track ends.
    pub fn poll(&mut self) -> Vec<UnitSignal> {
        let signals = self.unit.poll();
        if signals.contains(&UnitSignal::AdvanceRequested) {
            self.next();
        }
        signals
    }

    fn checked_index(&self, index: usize) -> Result<usize, PlaybackError> {
        if index < self.tracks.len() {
            Ok(index)
        } else {
            Err(PlaybackError::InvalidNavigation {
                index,
                len: self.tracks.len(),
            })
        }
    }
}
