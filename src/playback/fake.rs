//! Scriptable pipeline for exercising units without an audio device.
//!
//! Clones share state, so a test keeps one clone to inspect requests and
//! inject lifecycle events while the unit owns the other.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use super::pipeline::{MediaPipeline, PipelineEvent};

#[derive(Default)]
pub struct FakeState {
    pub durations: HashMap<String, f64>,
    pub reject_play: Option<String>,
    pub bound: Vec<String>,
    pub play_requests: usize,
    pub pause_requests: usize,
    pub seeks: Vec<f64>,
    pub paused: bool,
    queue: VecDeque<PipelineEvent>,
}

#[derive(Clone)]
pub struct FakePipeline {
    state: Rc<RefCell<FakeState>>,
}

impl FakePipeline {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(FakeState {
                paused: true,
                ..FakeState::default()
            })),
        }
    }

    /// Sources listed here report metadata as soon as they are bound.
    pub fn with_duration(self, src: &str, seconds: f64) -> Self {
        self.state.borrow_mut().durations.insert(src.to_string(), seconds);
        self
    }

    pub fn reject_next_play(&self, reason: &str) {
        self.state.borrow_mut().reject_play = Some(reason.to_string());
    }

    pub fn push(&self, event: PipelineEvent) {
        self.state.borrow_mut().queue.push_back(event);
    }

    /// Simulate the source playing to its end.
    pub fn finish(&self) {
        self.push(PipelineEvent::Ended);
    }

    pub fn state(&self) -> std::cell::Ref<'_, FakeState> {
        self.state.borrow()
    }
}

impl MediaPipeline for FakePipeline {
    fn bind(&mut self, source: &str) {
        let mut s = self.state.borrow_mut();
        s.bound.push(source.to_string());
        s.paused = true;
        s.queue.clear();
        if let Some(&duration) = s.durations.get(source) {
            s.queue.push_back(PipelineEvent::MetadataReady { duration });
        }
    }

    fn play(&mut self) {
        let mut s = self.state.borrow_mut();
        s.play_requests += 1;
        s.paused = false;
        let outcome = match s.reject_play.take() {
            Some(reason) => PipelineEvent::Failed(reason),
            None => PipelineEvent::Started,
        };
        s.queue.push_back(outcome);
    }

    fn pause(&mut self) {
        let mut s = self.state.borrow_mut();
        s.pause_requests += 1;
        s.paused = true;
        s.queue.push_back(PipelineEvent::Stopped);
    }

    fn seek(&mut self, seconds: f64) {
        self.state.borrow_mut().seeks.push(seconds);
    }

    fn is_paused(&self) -> bool {
        self.state.borrow().paused
    }

    fn poll_event(&mut self) -> Option<PipelineEvent> {
        let mut s = self.state.borrow_mut();
        let event = s.queue.pop_front()?;
        if matches!(event, PipelineEvent::Ended | PipelineEvent::Failed(_)) {
            s.paused = true;
        }
        Some(event)
    }
}
