use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::catalog::{MovieDetails, MovieSummary};

/// A streaming platform where a movie is available
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamingPlatform {
    pub name: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

/// Canonical cached movie record, keyed by the upstream catalog id.
///
/// Rows are created lazily on first resolution and never refreshed: stale
/// descriptive fields are acceptable, a second catalog id for the same movie
/// is not.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: Uuid,
    pub tmdb_id: i64,
    pub title: String,
    pub overview: String,
    pub release_date: Option<NaiveDate>,
    pub genres: Vec<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: f64,
    pub vote_count: i64,
    pub runtime: i32,
    pub original_language: String,
    pub streaming_platforms: Vec<StreamingPlatform>,
    pub trailer_key: Option<String>,
    pub adult: bool,
    pub popularity: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field set for a movie record about to enter the cache
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovie {
    pub tmdb_id: i64,
    pub title: String,
    pub overview: String,
    pub release_date: Option<NaiveDate>,
    pub genres: Vec<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: f64,
    pub vote_count: i64,
    pub runtime: i32,
    pub original_language: String,
    pub trailer_key: Option<String>,
    pub adult: bool,
    pub popularity: f64,
}

const DEFAULT_OVERVIEW: &str = "No overview available";

fn parse_release_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.and_then(|value| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok())
}

impl NewMovie {
    /// Builds a record from a search/list payload.
    ///
    /// List payloads carry numeric genre identifiers rather than names, so
    /// genres are stored as opaque labels here. The detail path stores
    /// resolved names; records created from either path are never reconciled.
    pub fn from_summary(summary: &MovieSummary) -> Self {
        Self {
            tmdb_id: summary.id,
            title: summary.title.clone(),
            overview: summary
                .overview
                .clone()
                .unwrap_or_else(|| DEFAULT_OVERVIEW.to_string()),
            release_date: parse_release_date(summary.release_date.as_deref()),
            genres: summary.genre_ids.iter().map(|id| id.to_string()).collect(),
            poster_path: summary.poster_path.clone(),
            backdrop_path: summary.backdrop_path.clone(),
            vote_average: summary.vote_average,
            vote_count: summary.vote_count,
            runtime: 0,
            original_language: summary
                .original_language
                .clone()
                .unwrap_or_else(|| "en".to_string()),
            trailer_key: None,
            adult: summary.adult,
            popularity: summary.popularity,
        }
    }

    /// Builds a record from a detail payload, with resolved genre names,
    /// runtime, and the first YouTube trailer if one is attached.
    pub fn from_details(details: &MovieDetails) -> Self {
        Self {
            tmdb_id: details.id,
            title: details.title.clone(),
            overview: details
                .overview
                .clone()
                .unwrap_or_else(|| DEFAULT_OVERVIEW.to_string()),
            release_date: parse_release_date(details.release_date.as_deref()),
            genres: details.genres.iter().map(|g| g.name.clone()).collect(),
            poster_path: details.poster_path.clone(),
            backdrop_path: details.backdrop_path.clone(),
            vote_average: details.vote_average,
            vote_count: details.vote_count,
            runtime: details.runtime.unwrap_or(0),
            original_language: details
                .original_language
                .clone()
                .unwrap_or_else(|| "en".to_string()),
            trailer_key: details.trailer_key().map(|key| key.to_string()),
            adult: details.adult,
            popularity: details.popularity,
        }
    }
}

impl Movie {
    /// Stamps a fresh id and timestamps onto a new record
    pub fn new(new: NewMovie) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tmdb_id: new.tmdb_id,
            title: new.title,
            overview: new.overview,
            release_date: new.release_date,
            genres: new.genres,
            poster_path: new.poster_path,
            backdrop_path: new.backdrop_path,
            vote_average: new.vote_average,
            vote_count: new.vote_count,
            runtime: new.runtime,
            original_language: new.original_language,
            streaming_platforms: Vec::new(),
            trailer_key: new.trailer_key,
            adult: new.adult,
            popularity: new.popularity,
            created_at: now,
            updated_at: now,
        }
    }
}
