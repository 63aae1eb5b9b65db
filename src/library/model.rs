use serde::Deserialize;

/// One entry of a listing. Read-only to the playback core.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Track {
    /// Ordinal position within its listing, when the source declares one.
    #[serde(default)]
    pub position: Option<u32>,
    pub id: String,
    pub title: String,
    /// Media locator handed to the pipeline.
    pub src: String,
    /// Nominal length in seconds; superseded once the pipeline reports one.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub credits: Vec<String>,
    /// Precomputed list label. Filled in by the loaders when left empty.
    #[serde(default)]
    pub display: String,
}

impl Track {
    pub fn new(id: impl Into<String>, title: impl Into<String>, src: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            position: None,
            id: id.into(),
            display: title.clone(),
            title,
            src: src.into(),
            duration: None,
            artist: None,
            cover: None,
            credits: Vec::new(),
        }
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }
}

/// A titled, ordered group of tracks rendered as one playlist on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub title: String,
    pub tracks: Vec<Track>,
}

/// Everything the page shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub title: Option<String>,
    pub listings: Vec<Listing>,
}
