use std::path::Path;

use lofty::prelude::{Accessor, AudioFile, TaggedFileExt};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::display::display_from_fields;
use super::model::Track;

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Read title, artist and length from the file's tags, if it has any.
fn read_tags(path: &Path) -> (Option<String>, Option<String>, Option<f64>) {
    let Ok(tagged) = lofty::read_from_path(path) else {
        log::debug!("scan: no readable tags in {}", path.display());
        return (None, None, None);
    };

    let seconds = tagged.properties().duration().as_secs_f64();
    let duration = (seconds > 0.0).then_some(seconds);

    let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
        return (None, None, duration);
    };
    let non_empty = |v: Option<std::borrow::Cow<'_, str>>| {
        v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
    };
    (non_empty(tag.title()), non_empty(tag.artist()), duration)
}

/// Collect the audio files under `dir` as one ordered list of tracks.
///
/// Tracks are sorted by display string (case-insensitive) and numbered from 1.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<Track> {
    let mut tracks: Vec<Track> = Vec::new();

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !(path.is_file()
            && (settings.include_hidden || !is_hidden(path))
            && is_audio_file(path, settings))
        {
            continue;
        }

        let (title, artist, duration) = read_tags(path);
        let title = title.unwrap_or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("UNKNOWN")
                .to_string()
        });
        let display = display_from_fields(
            path,
            &title,
            artist.as_deref(),
            &settings.display_fields,
            &settings.display_separator,
        );
        let src = path.to_string_lossy().into_owned();

        tracks.push(Track {
            position: None,
            id: src.clone(),
            title,
            src,
            duration,
            artist,
            cover: None,
            credits: Vec::new(),
            display,
        });
    }

    tracks.sort_by(|a, b| a.display.to_lowercase().cmp(&b.display.to_lowercase()));
    for (i, track) in tracks.iter_mut().enumerate() {
        track.position = u32::try_from(i + 1).ok();
    }
    log::info!("scan: {} track(s) under {}", tracks.len(), dir.display());
    tracks
}
