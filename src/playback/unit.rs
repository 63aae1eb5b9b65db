//! One audio-playing widget: a media pipeline plus its session state.
//!
//! The unit never assumes a request succeeded. `play` and `pause` are
//! requests to the pipeline; the lifecycle state only moves when the
//! pipeline reports back through [`PlaybackUnit::poll`]. Idempotence is
//! judged against the pipeline's live paused flag, not against what the
//! unit last asked for.

use crate::library::Track;

use super::bus::{BusEvent, PlaybackBus, Subscription, UnitId};
use super::error::PlaybackError;
use super::gesture::ScrubSignal;
use super::pipeline::{MediaPipeline, PipelineEvent};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// Nothing bound, or bound and waiting for metadata.
    #[default]
    Idle,
    Ready,
    Playing,
    Paused,
    /// Reached the end; left right away by auto-advance or a reset to 0.
    Ended,
}

/// Mutable runtime state of the bound track.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    /// Real playhead in seconds, as last reported or optimistically set.
    pub position: f64,
    /// Length in seconds. Seeded from the track's nominal duration.
    pub duration: f64,
    /// Whether the pipeline has confirmed `duration`.
    pub duration_confirmed: bool,
    /// Display-authoritative ratio while a scrub drag is in progress.
    pub overlay: Option<f64>,
}

impl Session {
    fn for_track(track: &Track) -> Self {
        Self {
            duration: track.duration.filter(|d| d.is_finite() && *d > 0.0).unwrap_or(0.0),
            ..Self::default()
        }
    }

    pub fn display_ratio(&self) -> f64 {
        if let Some(overlay) = self.overlay {
            return overlay;
        }
        if self.duration > 0.0 {
            (self.position / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Seconds to show next to the bar; follows the overlay while scrubbing.
    pub fn display_position(&self) -> f64 {
        match self.overlay {
            Some(overlay) => overlay * self.duration,
            None if self.duration > 0.0 => self.position.clamp(0.0, self.duration),
            None => self.position.max(0.0),
        }
    }

    fn set_position(&mut self, seconds: f64) {
        self.position = if self.duration_confirmed && self.duration > 0.0 {
            seconds.clamp(0.0, self.duration)
        } else {
            seconds
        };
    }
}

/// A play request the pipeline has not confirmed yet.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum PendingPlay {
    /// Waiting for metadata before asking the pipeline.
    Deferred,
    /// Asked; waiting for `Started` or `Failed`.
    Issued,
}

/// What a poll turn observed that the owner may care about.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitSignal {
    Started,
    Paused,
    /// Track ended and an owner is bound; the owner should advance.
    AdvanceRequested,
    /// Track ended with no owner; the unit rewound to 0.
    Rewound,
    Rejected(PlaybackError),
}

pub struct PlaybackUnit<P: MediaPipeline> {
    id: UnitId,
    pipeline: P,
    bus: PlaybackBus,
    subscription: Subscription,
    track: Option<Track>,
    state: LifecycleState,
    session: Session,
    pending: Option<PendingPlay>,
    auto_advance: bool,
    last_error: Option<PlaybackError>,
}

impl<P: MediaPipeline> PlaybackUnit<P> {
    /// Mount a unit on `bus`. It stays subscribed until dropped.
    pub fn new(pipeline: P, bus: &PlaybackBus) -> Self {
        let id = UnitId::next();
        Self {
            id,
            pipeline,
            bus: bus.clone(),
            subscription: bus.subscribe(id),
            track: None,
            state: LifecycleState::Idle,
            session: Session::default(),
            pending: None,
            auto_advance: false,
            last_error: None,
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn track(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub fn is_scrubbing(&self) -> bool {
        self.session.overlay.is_some()
    }

    pub fn display_ratio(&self) -> f64 {
        self.session.display_ratio()
    }

    pub fn last_error(&self) -> Option<&PlaybackError> {
        self.last_error.as_ref()
    }

    /// Whether `Ended` should hand control to an owner instead of rewinding.
    pub fn set_auto_advance(&mut self, enabled: bool) {
        self.auto_advance = enabled;
    }

    /// Bind `track`, discarding the previous session. Never starts playback.
    pub fn bind_source(&mut self, track: Track) {
        log::debug!("{}: bind {:?} ({})", self.id, track.id, track.src);
        self.session = Session::for_track(&track);
        self.state = LifecycleState::Idle;
        self.pending = None;
        self.last_error = None;
        self.pipeline.bind(&track.src);
        self.track = Some(track);
    }

    pub fn play(&mut self) {
        self.sync_bus();
        if self.track.is_none() {
            log::trace!("{}: play ignored, nothing bound", self.id);
            return;
        }
        if self.pending.is_some() || !self.pipeline.is_paused() {
            log::trace!("{}: play ignored, already playing or requested", self.id);
            return;
        }
        match self.state {
            LifecycleState::Idle => {
                log::debug!("{}: play deferred until metadata is ready", self.id);
                self.pending = Some(PendingPlay::Deferred);
            }
            LifecycleState::Ready
            | LifecycleState::Paused
            | LifecycleState::Ended
            | LifecycleState::Playing => self.issue_play(),
        }
    }

    pub fn pause(&mut self) {
        self.sync_bus();
        if self.pending == Some(PendingPlay::Deferred) {
            self.pending = None;
        }
        if self.pipeline.is_paused() {
            log::trace!("{}: pause ignored, pipeline already paused", self.id);
            return;
        }
        self.request_pause();
    }

    /// Play or pause depending on what the pipeline was doing when the user
    /// acted. A pending pause from the bus counts as the pause.
    pub fn toggle_play(&mut self) {
        let wants_pause = !self.pipeline.is_paused();
        if wants_pause {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Seek to `ratio` of the duration. Returns `false` when no duration is known.
    pub fn seek(&mut self, ratio: f64) -> bool {
        self.sync_bus();
        match self.try_seek(ratio) {
            Ok(()) => true,
            Err(e) => {
                log::trace!("{}: {e}", self.id);
                false
            }
        }
    }

    fn try_seek(&mut self, ratio: f64) -> Result<(), PlaybackError> {
        if !(self.session.duration > 0.0) {
            return Err(PlaybackError::SeekUnavailable);
        }
        let ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 };
        let seconds = ratio * self.session.duration;
        log::debug!("{}: seek to {seconds:.2}s", self.id);
        self.pipeline.seek(seconds);
        self.session.position = seconds;
        Ok(())
    }

    /// Feed a signal from the interaction handler into the scrub overlay.
    pub fn apply_scrub(&mut self, signal: ScrubSignal) {
        match signal {
            ScrubSignal::Provisional(ratio) => {
                self.session.overlay = Some(ratio.clamp(0.0, 1.0));
            }
            ScrubSignal::Committed(ratio) => {
                self.seek(ratio);
                self.session.overlay = None;
            }
        }
    }

    /// Drop the overlay without seeking, e.g. when a drag is torn down.
    pub fn cancel_scrub(&mut self) {
        self.session.overlay = None;
    }

    /// One event turn: react to foreign broadcasts, then to pipeline events.
    pub fn poll(&mut self) -> Vec<UnitSignal> {
        self.sync_bus();
        let mut signals = Vec::new();
        while let Some(event) = self.pipeline.poll_event() {
            if let Some(signal) = self.on_pipeline_event(event) {
                signals.push(signal);
            }
        }
        signals
    }

    fn sync_bus(&mut self) {
        for event in self.subscription.drain() {
            match event {
                BusEvent::PlaybackStarted(other) if other != self.id => {
                    if self.state == LifecycleState::Playing && !self.pipeline.is_paused() {
                        log::debug!("{}: pausing, {other} started playing", self.id);
                        self.request_pause();
                    }
                }
                BusEvent::PlaybackStarted(_) => {}
            }
        }
    }

    fn issue_play(&mut self) {
        log::debug!("{}: requesting playback", self.id);
        self.pending = Some(PendingPlay::Issued);
        self.pipeline.play();
    }

    fn request_pause(&mut self) {
        self.pending = None;
        self.pipeline.pause();
    }

    fn on_pipeline_event(&mut self, event: PipelineEvent) -> Option<UnitSignal> {
        match event {
            PipelineEvent::MetadataReady { duration } => {
                if duration.is_finite() && duration > 0.0 {
                    self.session.duration = duration;
                    self.session.duration_confirmed = true;
                    let position = self.session.position;
                    self.session.set_position(position);
                }
                if self.state == LifecycleState::Idle {
                    self.state = LifecycleState::Ready;
                }
                if self.pending == Some(PendingPlay::Deferred) {
                    self.issue_play();
                }
                None
            }
            PipelineEvent::PositionAdvanced(seconds) => {
                // The overlay, if present, keeps owning the display.
                self.session.set_position(seconds);
                None
            }
            PipelineEvent::Started => {
                self.pending = None;
                self.last_error = None;
                if self.pipeline.is_paused() {
                    log::trace!("{}: start superseded by a pause", self.id);
                    return None;
                }
                if self.state == LifecycleState::Playing {
                    return None;
                }
                self.state = LifecycleState::Playing;
                log::debug!("{}: playing", self.id);
                self.bus.publish(BusEvent::PlaybackStarted(self.id));
                Some(UnitSignal::Started)
            }
            PipelineEvent::Stopped => {
                self.pending = None;
                if self.state != LifecycleState::Playing {
                    return None;
                }
                self.state = LifecycleState::Paused;
                log::debug!("{}: paused", self.id);
                Some(UnitSignal::Paused)
            }
            PipelineEvent::Ended => {
                self.pending = None;
                self.state = LifecycleState::Ended;
                if self.auto_advance {
                    log::debug!("{}: ended, requesting advance", self.id);
                    return Some(UnitSignal::AdvanceRequested);
                }
                log::debug!("{}: ended, rewinding", self.id);
                self.session.position = 0.0;
                self.pipeline.seek(0.0);
                self.state = LifecycleState::Ready;
                Some(UnitSignal::Rewound)
            }
            PipelineEvent::Failed(reason) => {
                self.pending = None;
                if self.state == LifecycleState::Playing {
                    self.state = LifecycleState::Paused;
                }
                let error = PlaybackError::PlaybackRejected { reason };
                log::warn!("{}: {error}", self.id);
                self.last_error = Some(error.clone());
                Some(UnitSignal::Rejected(error))
            }
        }
    }
}
