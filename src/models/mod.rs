pub mod catalog;
pub mod movie;
pub mod recommendation;
pub mod user;
pub mod watch_history;
pub mod watch_party;

pub use catalog::{GenreEntry, MovieDetails, MovieListPage, MovieSummary, TimeWindow};
pub use movie::{Movie, NewMovie, StreamingPlatform};
pub use recommendation::{Feedback, Recommendation, RecommendationView};
pub use user::{User, UserPreferences};
pub use watch_history::{
    GenreCount, StatusCounts, WatchHistoryEntry, WatchHistoryView, WatchStats, WatchStatus,
    WatchedStats,
};
pub use watch_party::{
    GroupRecommendation, GroupRecommendationView, PartyMember, PartyPreferences, PartyStatus,
    PreferenceSubmission, WatchParty, WatchPartyView,
};

use serde::Serialize;

/// Pagination metadata attached to list responses
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u32,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let pages = if limit == 0 {
            0
        } else {
            total.div_ceil(limit as u64) as u32
        };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }

    /// Row offset for the given page (pages are 1-based)
    pub fn offset(page: u32, limit: u32) -> i64 {
        (page.saturating_sub(1) as i64) * (limit as i64)
    }
}

/// A page of items plus pagination metadata
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}
