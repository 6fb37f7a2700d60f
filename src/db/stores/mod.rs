//! Persistence traits and their PostgreSQL implementations.
//!
//! Services depend on the traits so the pipeline can run against mocks in
//! tests; the `Pg*` types are the production implementations.

pub mod movies;
pub mod recommendations;
pub mod users;
pub mod watch_history;
pub mod watch_parties;

pub use movies::{MovieStore, PgMovieStore};
pub use recommendations::{PgRecommendationStore, RecommendationStore};
pub use users::{PgUserStore, UserStore};
pub use watch_history::{PgWatchHistoryStore, WatchHistoryStore};
pub use watch_parties::{PgWatchPartyStore, WatchPartyStore};
