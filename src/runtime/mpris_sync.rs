use crate::app::App;
use crate::mpris::{MprisHandle, PlaybackStatus};
use crate::playback::MediaPipeline;

/// What was last published, so unchanged turns cost nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MprisSnapshot {
    section: usize,
    track: Option<usize>,
    status: PlaybackStatus,
}

pub fn snapshot<P: MediaPipeline>(app: &App<P>) -> Option<MprisSnapshot> {
    let section = app.control_target();
    let s = app.sections().get(section)?;
    Some(MprisSnapshot {
        section,
        track: s.transport.active(),
        status: s.unit().state().into(),
    })
}

/// Publish the control target's track and status if they changed.
pub fn update_mpris<P: MediaPipeline>(
    mpris: &MprisHandle,
    app: &App<P>,
    last: &mut Option<MprisSnapshot>,
) {
    let now = snapshot(app);
    if now == *last {
        return;
    }

    match &now {
        Some(snap) => {
            let s = &app.sections()[snap.section];
            let track = snap
                .track
                .and_then(|i| s.tracks().get(i).map(|t| (s.title.as_str(), snap.section, i, t)));
            mpris.set_now_playing(track);
            mpris.set_status(snap.status);
        }
        None => {
            mpris.set_now_playing(None);
            mpris.set_status(PlaybackStatus::Stopped);
        }
    }
    *last = now;
}
