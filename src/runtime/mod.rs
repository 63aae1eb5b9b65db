use std::env;
use std::sync::mpsc;

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::audio::AudioOutput;
use crate::library::load_sources;
use crate::mpris::ControlCmd;
use crate::playback::PlaybackBus;

mod event_loop;
mod mpris_sync;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, warnings) = settings::load_settings();
    let log_file = startup::init_logging(&settings);
    for w in &warnings {
        log::warn!("config: {w}");
    }
    log::info!(
        "encore {} starting (log file: {:?})",
        env!("CARGO_PKG_VERSION"),
        log_file
    );

    let paths = startup::source_paths(env::args_os().skip(1))?;
    let page = load_sources(&paths, &settings.library)?;
    log::info!(
        "loaded {} listing(s), {} track(s)",
        page.listings.len(),
        page.listings.iter().map(|l| l.tracks.len()).sum::<usize>()
    );

    // Must outlive every pipeline mixing into it.
    let output = AudioOutput::open_default()?;
    let mut app = App::new(page, PlaybackBus::global(), || {
        output.pipeline(&settings.audio)
    });

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = event_loop::run(&mut terminal, &settings, &mut app, &mpris, &control_rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = &run_result {
        log::error!("event loop failed: {e}");
    }
    log::info!("encore exiting");
    run_result
}
