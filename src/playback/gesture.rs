//! Pointer-to-ratio interaction handling for horizontal progress bars.
//!
//! A [`ScrubGesture`] turns click, drag and touch sequences into
//! [`ScrubSignal`]s. It never touches playback state itself: provisional
//! ratios are meant for the display overlay, committed ratios for a seek.

/// Horizontal extent of a bar in whatever coordinate space the input uses.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BarBounds {
    pub left: f64,
    pub width: f64,
}

impl BarBounds {
    pub fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }

    /// `(x - left) / width`, clamped to `[0, 1]`. Degenerate bars map to 0.
    pub fn ratio_at(&self, x: f64) -> f64 {
        if !(self.width > 0.0) || !x.is_finite() {
            return 0.0;
        }
        ((x - self.left) / self.width).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ScrubSignal {
    /// Display-only value while the pointer is held.
    Provisional(f64),
    /// Final value; the owner should seek to it.
    Committed(f64),
}

/// Installs whatever global move/release listeners a drag needs.
///
/// The returned guard must uninstall them when dropped.
pub trait PointerCapture {
    type Guard;

    fn capture(&self) -> Self::Guard;
}

/// Capture for surfaces that deliver move/release events without any setup.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoCapture;

impl PointerCapture for NoCapture {
    type Guard = ();

    fn capture(&self) -> Self::Guard {}
}

enum Phase<G> {
    Idle,
    Dragging {
        bar: BarBounds,
        last: f64,
        _guard: G,
    },
}

/// Three-phase (start / update / commit) scrub state machine.
pub struct ScrubGesture<C: PointerCapture> {
    capture: C,
    phase: Phase<C::Guard>,
}

impl<C: PointerCapture> ScrubGesture<C> {
    pub fn new(capture: C) -> Self {
        Self {
            capture,
            phase: Phase::Idle,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging { .. })
    }

    /// Single click: commit immediately. An in-flight drag is abandoned.
    pub fn click(&mut self, bar: BarBounds, x: f64) -> ScrubSignal {
        self.phase = Phase::Idle;
        ScrubSignal::Committed(bar.ratio_at(x))
    }

    /// Pointer pressed on the bar: start scrubbing.
    pub fn press(&mut self, bar: BarBounds, x: f64) -> ScrubSignal {
        let ratio = bar.ratio_at(x);
        // Replace first so a stale guard is released before the new capture.
        self.phase = Phase::Idle;
        self.phase = Phase::Dragging {
            bar,
            last: ratio,
            _guard: self.capture.capture(),
        };
        ScrubSignal::Provisional(ratio)
    }

    /// Pointer moved while held. `None` when no drag is in progress.
    pub fn drag_to(&mut self, x: f64) -> Option<ScrubSignal> {
        match &mut self.phase {
            Phase::Dragging { bar, last, .. } => {
                *last = bar.ratio_at(x);
                Some(ScrubSignal::Provisional(*last))
            }
            Phase::Idle => None,
        }
    }

    /// Pointer released. Without a coordinate the last known ratio is committed.
    pub fn release(&mut self, x: Option<f64>) -> Option<ScrubSignal> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Dragging { bar, last, .. } => {
                let ratio = x.map(|x| bar.ratio_at(x)).unwrap_or(last);
                Some(ScrubSignal::Committed(ratio))
            }
            Phase::Idle => None,
        }
    }

    /// Touch began; the first touch point drives the gesture.
    pub fn touch_start(&mut self, bar: BarBounds, touches: &[f64]) -> Option<ScrubSignal> {
        touches.first().map(|&x| self.press(bar, x))
    }

    /// Touch moved. Losing every touch point counts as a release.
    pub fn touch_move(&mut self, touches: &[f64]) -> Option<ScrubSignal> {
        match touches.first() {
            Some(&x) => self.drag_to(x),
            None => self.release(None),
        }
    }

    pub fn touch_end(&mut self) -> Option<ScrubSignal> {
        self.release(None)
    }

    /// Abandon a drag without committing. Returns whether one was in progress.
    pub fn cancel(&mut self) -> bool {
        matches!(
            std::mem::replace(&mut self.phase, Phase::Idle),
            Phase::Dragging { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Counts live captures so tests can assert nothing leaks.
    #[derive(Clone, Default)]
    struct CountingCapture {
        live: Rc<Cell<usize>>,
    }

    struct CountingGuard(Rc<Cell<usize>>);

    impl Drop for CountingGuard {
        fn drop(&mut self) {
            self.0.set(self.0.get() - 1);
        }
    }

    impl PointerCapture for CountingCapture {
        type Guard = CountingGuard;

        fn capture(&self) -> CountingGuard {
            self.live.set(self.live.get() + 1);
            CountingGuard(self.live.clone())
        }
    }

    fn bar() -> BarBounds {
        BarBounds::new(10.0, 100.0)
    }

    #[test]
    fn ratio_is_clamped_to_unit_interval() {
        assert_eq!(bar().ratio_at(10.0), 0.0);
        assert_eq!(bar().ratio_at(60.0), 0.5);
        assert_eq!(bar().ratio_at(110.0), 1.0);
        assert_eq!(bar().ratio_at(-50.0), 0.0);
        assert_eq!(bar().ratio_at(500.0), 1.0);
        assert_eq!(BarBounds::new(0.0, 0.0).ratio_at(3.0), 0.0);
        assert_eq!(bar().ratio_at(f64::NAN), 0.0);
    }

    #[test]
    fn click_commits_without_capturing() {
        let capture = CountingCapture::default();
        let mut g = ScrubGesture::new(capture.clone());
        assert_eq!(g.click(bar(), 35.0), ScrubSignal::Committed(0.25));
        assert!(!g.is_dragging());
        assert_eq!(capture.live.get(), 0);
    }

    #[test]
    fn drag_emits_provisional_then_single_commit() {
        let capture = CountingCapture::default();
        let mut g = ScrubGesture::new(capture.clone());

        assert_eq!(g.press(bar(), 40.0), ScrubSignal::Provisional(0.3));
        assert_eq!(capture.live.get(), 1);
        assert_eq!(g.drag_to(60.0), Some(ScrubSignal::Provisional(0.5)));
        assert_eq!(g.drag_to(80.0), Some(ScrubSignal::Provisional(0.7)));
        assert_eq!(g.release(Some(80.0)), Some(ScrubSignal::Committed(0.7)));

        assert_eq!(capture.live.get(), 0);
        assert_eq!(g.release(Some(80.0)), None);
        assert_eq!(g.drag_to(20.0), None);
    }

    #[test]
    fn release_without_coordinate_commits_last_ratio() {
        let mut g = ScrubGesture::new(NoCapture);
        g.press(bar(), 20.0);
        g.drag_to(90.0);
        assert_eq!(g.release(None), Some(ScrubSignal::Committed(0.8)));
    }

    #[test]
    fn drag_keeps_bounds_captured_at_press() {
        let mut g = ScrubGesture::new(NoCapture);
        g.press(bar(), 10.0);
        // Far outside the bar: still clamped against the original bounds.
        assert_eq!(g.drag_to(1000.0), Some(ScrubSignal::Provisional(1.0)));
    }

    #[test]
    fn touch_sequence_uses_first_point_and_releases_when_points_vanish() {
        let capture = CountingCapture::default();
        let mut g = ScrubGesture::new(capture.clone());

        assert_eq!(g.touch_start(bar(), &[]), None);
        assert_eq!(
            g.touch_start(bar(), &[30.0, 90.0]),
            Some(ScrubSignal::Provisional(0.2))
        );
        assert_eq!(
            g.touch_move(&[70.0, 5.0]),
            Some(ScrubSignal::Provisional(0.6))
        );
        assert_eq!(g.touch_move(&[]), Some(ScrubSignal::Committed(0.6)));
        assert_eq!(capture.live.get(), 0);
        assert_eq!(g.touch_end(), None);
    }

    #[test]
    fn cancel_and_drop_release_capture() {
        let capture = CountingCapture::default();
        let mut g = ScrubGesture::new(capture.clone());
        g.press(bar(), 50.0);
        assert!(g.cancel());
        assert!(!g.cancel());
        assert_eq!(capture.live.get(), 0);

        g.press(bar(), 50.0);
        assert_eq!(capture.live.get(), 1);
        drop(g);
        assert_eq!(capture.live.get(), 0);
    }

    #[test]
    fn pressing_twice_never_holds_two_captures() {
        let capture = CountingCapture::default();
        let mut g = ScrubGesture::new(capture.clone());
        g.press(bar(), 20.0);
        g.press(bar(), 30.0);
        assert_eq!(capture.live.get(), 1);
    }
}
