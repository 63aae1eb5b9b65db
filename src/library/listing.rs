//! Loading listings from page files and directories.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::config::LibrarySettings;

use super::display::display_from_fields;
use super::model::{Listing, Page, Track};
use super::scan::scan;

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("no playable listings found")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct PageFile {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    listing: Vec<ListingFile>,
}

#[derive(Debug, Deserialize)]
struct ListingFile {
    title: String,
    #[serde(default)]
    tracks: Vec<Track>,
}

/// Build the page from command-line paths: page files and/or directories.
///
/// Listings without tracks are skipped; an entirely empty page is an error.
pub fn load_sources(paths: &[PathBuf], settings: &LibrarySettings) -> Result<Page, ListingError> {
    let mut page = Page::default();

    for path in paths {
        if path.is_dir() {
            page.listings.push(Listing {
                title: dir_title(path),
                tracks: scan(path, settings),
            });
        } else {
            let loaded = load_page(path, settings)?;
            if page.title.is_none() {
                page.title = loaded.title;
            }
            page.listings.extend(loaded.listings);
        }
    }

    page.listings.retain(|l| {
        if l.tracks.is_empty() {
            log::warn!("listing {:?} has no tracks, skipping", l.title);
        }
        !l.tracks.is_empty()
    });
    if page.listings.is_empty() {
        return Err(ListingError::Empty);
    }
    Ok(page)
}

/// Parse one TOML page file. Relative `src`/`cover` resolve against its directory.
pub fn load_page(path: &Path, settings: &LibrarySettings) -> Result<Page, ListingError> {
    let text = std::fs::read_to_string(path).map_err(|source| ListingError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    parse_page(&text, base, settings).map_err(|source| ListingError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_page(text: &str, base: &Path, settings: &LibrarySettings) -> Result<Page, toml::de::Error> {
    let file: PageFile = toml::from_str(text)?;
    let listings = file
        .listing
        .into_iter()
        .map(|l| Listing {
            title: l.title,
            tracks: l
                .tracks
                .into_iter()
                .map(|t| prepare_track(t, base, settings))
                .collect(),
        })
        .collect();
    Ok(Page {
        title: file.title,
        listings,
    })
}

fn prepare_track(mut track: Track, base: &Path, settings: &LibrarySettings) -> Track {
    track.src = resolve(base, &track.src);
    track.cover = track.cover.map(|c| resolve(base, &c));
    track.duration = track.duration.filter(|d| d.is_finite() && *d > 0.0);
    if track.display.trim().is_empty() {
        track.display = display_from_fields(
            Path::new(&track.src),
            &track.title,
            track.artist.as_deref(),
            &settings.display_fields,
            &settings.display_separator,
        );
    }
    track
}

fn resolve(base: &Path, locator: &str) -> String {
    let p = Path::new(locator);
    if p.is_relative() && !locator.contains("://") {
        base.join(p).to_string_lossy().into_owned()
    } else {
        locator.to_string()
    }
}

fn dir_title(dir: &Path) -> String {
    dir.file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| dir.display().to_string())
}
