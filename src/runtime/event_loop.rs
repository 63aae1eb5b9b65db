use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::config;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::playback::MediaPipeline;
use crate::runtime::mpris_sync::{MprisSnapshot, update_mpris};
use crate::ui;

/// Main terminal event loop. Each iteration is one event turn: every listing
/// is polled, MPRIS is synced, the page is drawn, then queued media-key
/// commands and at most one terminal event are handled.
/// Returns `Ok(())` when shutdown is requested.
pub fn run<P: MediaPipeline>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App<P>,
    mpris: &MprisHandle,
    control_rx: &mpsc::Receiver<ControlCmd>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut last_mpris: Option<MprisSnapshot> = None;

    loop {
        app.poll();

        // Keep MPRIS in sync even when playback changes come from media keys or auto-advance.
        update_mpris(mpris, app, &mut last_mpris);

        let mut bars = Vec::new();
        terminal.draw(|f| bars = ui::draw(f, app, &settings.ui, &settings.controls))?;
        app.set_bar_areas(bars);

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, app) {
                return Ok(());
            }
        }

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if handle_key_event(key, settings, app) {
                        break;
                    }
                }
                Event::Mouse(mouse) => handle_mouse_event(mouse, app),
                Event::Resize(..) => app.cancel_drag(),
                _ => {}
            }
        }
    }

    Ok(())
}

/// Media keys act on the audible listing, or the focused one when silent.
fn handle_control_cmd<P: MediaPipeline>(cmd: ControlCmd, app: &mut App<P>) -> bool {
    log::debug!("mpris: {cmd:?}");
    match cmd {
        ControlCmd::Quit => return true,
        ControlCmd::Play => app.play_target(),
        ControlCmd::Pause => app.pause_target(),
        ControlCmd::PlayPause => app.toggle_target(),
        ControlCmd::Stop => app.pause_all(),
        ControlCmd::Next => app.next_target(),
        ControlCmd::Prev => app.prev_target(),
    }
    false
}

fn handle_key_event<P: MediaPipeline>(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App<P>,
) -> bool {
    let scrub = settings.controls.scrub_seconds as f64;
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Tab => app.focus_next(),
        KeyCode::BackTab => app.focus_prev(),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev(),
        KeyCode::Enter => app.play_selected(),
        KeyCode::Char('p') | KeyCode::Char(' ') => app.toggle_play(),
        KeyCode::Char('l') => app.next_track(),
        KeyCode::Char('h') => app.prev_track(),
        KeyCode::Char('L') => {
            app.seek_by(scrub);
        }
        KeyCode::Char('H') => {
            app.seek_by(-scrub);
        }
        KeyCode::Char(c @ '0'..='9') => {
            if let Some(d) = c.to_digit(10) {
                app.seek_to_tenths(d as u8);
            }
        }
        KeyCode::Char('K') => app.toggle_metadata_window(),
        KeyCode::Esc => {
            app.cancel_drag();
            app.metadata_window = false;
        }
        _ => {}
    }
    false
}

/// Left button drives the drag sequence on a progress bar, right click seeks once.
fn handle_mouse_event<P: MediaPipeline>(mouse: MouseEvent, app: &mut App<P>) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            app.pointer_down(mouse.column, mouse.row);
        }
        MouseEventKind::Drag(MouseButton::Left) => app.pointer_drag(mouse.column),
        MouseEventKind::Up(MouseButton::Left) => app.pointer_up(Some(mouse.column)),
        MouseEventKind::Down(MouseButton::Right) => {
            app.click(mouse.column, mouse.row);
        }
        _ => {}
    }
}
