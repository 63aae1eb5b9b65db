//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};
use std::time::Duration;

use crate::app::{App, Section};
use crate::config::{ControlsSettings, TimeField, UiSettings};
use crate::library::Track;
use crate::playback::{LifecycleState, MediaPipeline, Session};

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    [
        "[tab] next listing".to_string(),
        "[j/k] up/down".to_string(),
        "[enter] play selected".to_string(),
        "[space/p] play/pause".to_string(),
        "[h/l] prev/next".to_string(),
        format!("[H/L] seek -/+{scrub_seconds}s"),
        "[0-9] seek to tenths".to_string(),
        "[K] details".to_string(),
        "[q] quit".to_string(),
        "mouse: drag bar to scrub, right click to jump".to_string(),
    ]
    .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn seconds(s: f64) -> Duration {
    if s.is_finite() && s > 0.0 {
        Duration::from_secs_f64(s)
    } else {
        Duration::ZERO
    }
}

/// Build the time text (elapsed/total/remaining) under a progress bar.
fn time_text(session: &Session, ui: &UiSettings) -> Option<String> {
    if ui.now_playing_time_fields.is_empty() {
        return None;
    }

    let elapsed = seconds(session.display_position());
    let total = (session.duration > 0.0).then(|| seconds(session.duration));

    let mut parts: Vec<String> = Vec::new();
    for f in &ui.now_playing_time_fields {
        match f {
            TimeField::Elapsed => parts.push(format_mmss(elapsed)),
            TimeField::Total => {
                if let Some(t) = total {
                    parts.push(format_mmss(t));
                }
            }
            TimeField::Remaining => {
                if let Some(t) = total {
                    let rem = t.saturating_sub(elapsed);
                    parts.push(format!("-{}", format_mmss(rem)));
                }
            }
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.now_playing_time_separator))
    }
}

fn state_label(state: LifecycleState, scrubbing: bool) -> &'static str {
    if scrubbing {
        return "scrubbing";
    }
    match state {
        LifecycleState::Idle => "loading",
        LifecycleState::Ready => "ready",
        LifecycleState::Playing => "playing",
        LifecycleState::Paused => "paused",
        LifecycleState::Ended => "ended",
    }
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller and avoid covering the entire UI.
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Format an optional duration, rounding up partial seconds, showing total seconds.
fn format_duration_mmss_ceil(d: Option<Duration>) -> String {
    let Some(d) = d else {
        return "-".to_string();
    };

    let mut total_secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        total_secs = total_secs.saturating_add(1);
    }

    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{}:{:02} ({}s)", minutes, seconds, total_secs)
}

fn details_text(track: &Track) -> String {
    let credits = if track.credits.is_empty() {
        "-".to_string()
    } else {
        track.credits.join(", ")
    };
    format!(
        "Title: {}\nArtist: {}\nDuration: {}\nCover: {}\nCredits: {}\nSource: {}",
        track.title,
        track.artist.as_deref().unwrap_or("-"),
        format_duration_mmss_ceil(track.duration.map(seconds)),
        track.cover.as_deref().unwrap_or("-"),
        credits,
        track.src
    )
}

/// Draw one listing and return where its progress bar ended up.
fn draw_section<P: MediaPipeline>(
    frame: &mut Frame,
    area: Rect,
    section: &Section<P>,
    focused: bool,
    ui: &UiSettings,
) -> Option<Rect> {
    let unit = section.unit();
    let session = unit.session();
    let marker = if focused { "▸ " } else { "" };
    let title = format!(
        " {marker}{} · {} ",
        section.title,
        state_label(unit.state(), unit.is_scrubbing())
    );

    let mut block = Block::default().borders(Borders::ALL).title(title);
    if focused {
        block = block.border_style(Style::default().add_modifier(Modifier::BOLD));
    }
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height < 3 || inner.width < 2 {
        return None;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let active = section.transport.active();
    let items: Vec<ListItem> = section
        .tracks()
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let label = match t.position {
                Some(n) => format!("{n:>2}. {}", t.display),
                None => t.display.clone(),
            };
            if Some(i) == active {
                ListItem::new(format!("♪ {label}"))
                    .style(Style::default().add_modifier(Modifier::BOLD))
            } else {
                ListItem::new(format!("  {label}"))
            }
        })
        .collect();

    let mut list = List::new(items);
    if focused {
        list = list
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
    }
    let mut state = ListState::default();
    if !section.tracks().is_empty() {
        state.select(Some(section.selected));
    }
    frame.render_stateful_widget(list, rows[0], &mut state);

    let gauge = Gauge::default()
        .ratio(unit.display_ratio().clamp(0.0, 1.0))
        .label("");
    frame.render_widget(gauge, rows[1]);

    if let Some(time) = time_text(session, ui) {
        frame.render_widget(Paragraph::new(time).alignment(Alignment::Right), rows[2]);
    }

    Some(rows[1])
}

/// Render the entire page and return each section's progress bar area.
pub fn draw<P: MediaPipeline>(
    frame: &mut Frame,
    app: &App<P>,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) -> Vec<Option<Rect>> {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header_text = app.title.as_deref().unwrap_or(&ui_settings.header_text);
    let header = Paragraph::new(header_text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" encore ")
            .title_alignment(Alignment::Center),
    );
    frame.render_widget(header, chunks[0]);

    // Listings, stacked.
    let sections = app.sections();
    let mut bars = Vec::with_capacity(sections.len());
    if sections.is_empty() {
        frame.render_widget(
            Paragraph::new("Nothing to play.").block(Block::bordered()),
            chunks[1],
        );
    } else {
        let areas = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![Constraint::Fill(1); sections.len()])
            .split(chunks[1]);
        for (i, (section, area)) in sections.iter().zip(areas.iter()).enumerate() {
            bars.push(draw_section(
                frame,
                *area,
                section,
                i == app.focus(),
                ui_settings,
            ));
        }
    }

    // Status line
    let status = match (&app.status, app.audible()) {
        (Some(err), _) => err.clone(),
        (None, Some(i)) => {
            let s = &sections[i];
            let now = s
                .transport
                .active_track()
                .map(|t| t.display.as_str())
                .unwrap_or("-");
            format!("Now playing: {now} ({})", s.title)
        }
        (None, None) => "Stopped".to_string(),
    };
    let status_par = Paragraph::new(status)
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(" status "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[2]);

    // Overlay details popup (keeps the listings visible under it)
    if app.metadata_window {
        let popup_area = centered_rect_sized(72, 10, chunks[1]);
        frame.render_widget(Clear, popup_area);

        let text = match app.selected_track() {
            Some(track) => details_text(track),
            None => "No track selected".to_string(),
        };
        let details = Paragraph::new(text)
            .block(
                Block::default()
                    .padding(Padding {
                        left: 1,
                        right: 0,
                        top: 0,
                        bottom: 0,
                    })
                    .borders(Borders::ALL)
                    .title(" details (K closes) "),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(details, popup_area);
    }

    let footer = Paragraph::new(controls_text(controls_settings.scrub_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[3]);

    bars
}
