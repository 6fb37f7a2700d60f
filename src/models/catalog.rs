//! Wire shapes for the upstream movie catalog (TMDB).
//!
//! Search/list payloads and detail payloads differ in available fields
//! (genre identifiers vs. genre names, no runtime on list entries), so each
//! call site gets its own shape rather than one struct covering both.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// A single entry in a search/list response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    /// Numeric genre identifiers; list payloads never carry genre names
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: i64,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub adult: bool,
    #[serde(default)]
    pub popularity: f64,
}

/// A paged catalog response, shared by search and every list endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieListPage {
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u64,
    pub results: Vec<MovieSummary>,
}

/// Genre id/name pair from the catalog's genre list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenreEntry {
    pub id: i64,
    pub name: String,
}

/// An attached video on a detail response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoList {
    #[serde(default)]
    pub results: Vec<Video>,
}

/// Full detail response for a single movie, including resolved genre names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDetails {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub genres: Vec<GenreEntry>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: i64,
    #[serde(default)]
    pub runtime: Option<i32>,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub adult: bool,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub videos: Option<VideoList>,
}

impl MovieDetails {
    /// First attached video that is a YouTube trailer, if any
    pub fn trailer_key(&self) -> Option<&str> {
        self.videos.as_ref().and_then(|videos| {
            videos
                .results
                .iter()
                .find(|video| video.kind == "Trailer" && video.site == "YouTube")
                .map(|video| video.key.as_str())
        })
    }
}

/// Trending window accepted by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    Day,
    Week,
}

impl TimeWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
        }
    }

    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "day" => Ok(TimeWindow::Day),
            "week" => Ok(TimeWindow::Week),
            other => Err(AppError::Validation(format!(
                "Time window must be 'day' or 'week', got '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
