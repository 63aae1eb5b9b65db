//! `MediaPipeline` on top of a `rodio::Sink`.
//!
//! Everything is synchronous: requests are applied to the sink immediately
//! and the matching acknowledgements are queued for the next `poll_event`.
//! End-of-track and position reports are derived from the sink while polling.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use rodio::Sink;
use rodio::mixer::Mixer;

use crate::playback::{MediaPipeline, PipelineEvent};

use super::sink::{create_sink_at, probe_duration};

pub struct RodioPipeline {
    mixer: Mixer,
    position_interval: Duration,
    source: Option<PathBuf>,
    sink: Option<Sink>,
    /// Where the current sink started inside the file.
    offset: Duration,
    paused: bool,
    events: VecDeque<PipelineEvent>,
    last_report: Option<Instant>,
}

impl RodioPipeline {
    pub fn new(mixer: Mixer, position_interval: Duration) -> Self {
        Self {
            mixer,
            position_interval,
            source: None,
            sink: None,
            offset: Duration::ZERO,
            paused: true,
            events: VecDeque::new(),
            last_report: None,
        }
    }

    fn position(&self) -> Duration {
        self.offset + self.sink.as_ref().map_or(Duration::ZERO, Sink::get_pos)
    }

    fn stop_sink(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }
}

impl MediaPipeline for RodioPipeline {
    fn bind(&mut self, source: &str) {
        self.stop_sink();
        self.events.clear();
        self.paused = true;
        self.offset = Duration::ZERO;
        self.last_report = None;

        let path = PathBuf::from(source);
        match create_sink_at(&self.mixer, &path, Duration::ZERO) {
            Ok((sink, decoded)) => {
                let duration = probe_duration(&path).or(decoded).unwrap_or(Duration::ZERO);
                log::debug!("audio: bound {} ({:.1}s)", path.display(), duration.as_secs_f64());
                self.sink = Some(sink);
                self.events.push_back(PipelineEvent::MetadataReady {
                    duration: duration.as_secs_f64(),
                });
            }
            Err(e) => {
                log::warn!("audio: {e}");
                self.events.push_back(PipelineEvent::Failed(e.to_string()));
            }
        }
        self.source = Some(path);
    }

    fn play(&mut self) {
        match &self.sink {
            Some(sink) => {
                sink.play();
                self.paused = false;
                self.last_report = None;
                self.events.push_back(PipelineEvent::Started);
            }
            None => {
                let reason = match &self.source {
                    Some(path) => format!("{} could not be opened", path.display()),
                    None => "no source bound".to_string(),
                };
                self.events.push_back(PipelineEvent::Failed(reason));
            }
        }
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
        self.paused = true;
        self.events.push_back(PipelineEvent::Stopped);
    }

    fn seek(&mut self, seconds: f64) {
        let Some(path) = self.source.clone() else {
            return;
        };
        let target = if seconds.is_finite() && seconds > 0.0 {
            Duration::from_secs_f64(seconds)
        } else {
            Duration::ZERO
        };

        // Rebuild the sink and skip into the file. This also revives a sink
        // that already drained at the end of the track.
        self.stop_sink();
        match create_sink_at(&self.mixer, &path, target) {
            Ok((sink, _)) => {
                if !self.paused {
                    sink.play();
                }
                self.sink = Some(sink);
                self.offset = target;
                self.last_report = None;
            }
            Err(e) => {
                log::warn!("audio: seek failed: {e}");
                self.paused = true;
                self.events.push_back(PipelineEvent::Failed(e.to_string()));
            }
        }
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn poll_event(&mut self) -> Option<PipelineEvent> {
        if let Some(event) = self.events.pop_front() {
            return Some(event);
        }
        if self.paused {
            return None;
        }
        let sink = self.sink.as_ref()?;
        if sink.empty() {
            self.paused = true;
            return Some(PipelineEvent::Ended);
        }
        let due = self
            .last_report
            .is_none_or(|at| at.elapsed() >= self.position_interval);
        if !due {
            return None;
        }
        self.last_report = Some(Instant::now());
        Some(PipelineEvent::PositionAdvanced(self.position().as_secs_f64()))
    }
}
