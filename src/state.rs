use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::{
    config::Config,
    db::stores::{
        MovieStore, PgMovieStore, PgRecommendationStore, PgUserStore, PgWatchHistoryStore,
        PgWatchPartyStore, UserStore,
    },
    db::Cache,
    services::{
        providers::{CatalogClient, GroqClient, TmdbClient},
        MovieResolver, RecommendationService, WatchHistoryService, WatchPartyService,
    },
};

/// Shared application state: configuration, stores, upstream clients, and
/// the services wired from them.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UserStore>,
    pub movies: Arc<dyn MovieStore>,
    pub catalog: Arc<dyn CatalogClient>,
    pub resolver: MovieResolver,
    pub recommendations: Arc<RecommendationService>,
    pub watch_parties: Arc<WatchPartyService>,
    pub watch_history: Arc<WatchHistoryService>,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool, cache: Cache) -> anyhow::Result<Self> {
        let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool.clone()));
        let movies: Arc<dyn MovieStore> = Arc::new(PgMovieStore::new(pool.clone()));
        let recommendation_store = Arc::new(PgRecommendationStore::new(pool.clone()));
        let watch_party_store = Arc::new(PgWatchPartyStore::new(pool.clone()));
        let watch_history_store = Arc::new(PgWatchHistoryStore::new(pool));

        let catalog: Arc<dyn CatalogClient> = Arc::new(TmdbClient::new(
            cache,
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
            Duration::from_secs(config.catalog_timeout_secs),
        )?);

        let llm = Arc::new(GroqClient::new(
            config.groq_api_key.clone(),
            config.groq_api_url.clone(),
            config.groq_model.clone(),
            Duration::from_secs(config.llm_timeout_secs),
        )?);

        let resolver = MovieResolver::new(catalog.clone(), movies.clone());

        let recommendations = Arc::new(RecommendationService::new(
            llm.clone(),
            resolver.clone(),
            recommendation_store,
            movies.clone(),
        ));

        let watch_parties = Arc::new(WatchPartyService::new(
            watch_party_store,
            llm,
            resolver.clone(),
            movies.clone(),
        ));

        let watch_history = Arc::new(WatchHistoryService::new(
            watch_history_store,
            resolver.clone(),
            movies.clone(),
        ));

        Ok(Self {
            config,
            users,
            movies,
            catalog,
            resolver,
            recommendations,
            watch_parties,
            watch_history,
        })
    }
}
