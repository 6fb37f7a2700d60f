//! Resolution of free-text titles and catalog ids into cached movie records.

use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    db::stores::MovieStore,
    error::AppResult,
    models::{Movie, NewMovie},
    services::providers::CatalogClient,
};

/// Read-through resolver over the movie cache.
///
/// Both paths are insert-if-absent: a record already in the cache is
/// returned as-is, without refreshing its fields against the catalog.
#[derive(Clone)]
pub struct MovieResolver {
    catalog: Arc<dyn CatalogClient>,
    movies: Arc<dyn MovieStore>,
}

impl MovieResolver {
    pub fn new(catalog: Arc<dyn CatalogClient>, movies: Arc<dyn MovieStore>) -> Self {
        Self { catalog, movies }
    }

    /// Resolves a free-text title through catalog search.
    ///
    /// The first search candidate is trusted; the catalog's own relevance
    /// ranking is not second-guessed. `Ok(None)` means the catalog had no
    /// match, which is distinct from a transport/upstream error. Records
    /// created here carry opaque genre identifiers, since search payloads
    /// have no genre names.
    pub async fn resolve_title(&self, title: &str) -> AppResult<Option<Movie>> {
        let results = self.catalog.search_movies(title, 1).await?;

        let Some(candidate) = results.results.first() else {
            return Ok(None);
        };

        if let Some(existing) = self.movies.find_by_tmdb_id(candidate.id).await? {
            return Ok(Some(existing));
        }

        let movie = self
            .movies
            .insert_if_absent(NewMovie::from_summary(candidate))
            .await?;

        Ok(Some(movie))
    }

    /// Resolves a known catalog id through the detail endpoint.
    ///
    /// Detail payloads carry resolved genre names, runtime, and attached
    /// videos, so records created here are richer than the search path's.
    pub async fn resolve_tmdb_id(&self, tmdb_id: i64) -> AppResult<Movie> {
        if let Some(existing) = self.movies.find_by_tmdb_id(tmdb_id).await? {
            return Ok(existing);
        }

        let details = self.catalog.movie_details(tmdb_id).await?;

        self.movies
            .insert_if_absent(NewMovie::from_details(&details))
            .await
    }

    /// Resolves a batch of parsed titles concurrently.
    ///
    /// One task per title; results are collected in the original title
    /// order, not completion order. A title that fails to resolve (no match
    /// or upstream error) is logged and dropped without aborting the batch.
    /// The output is deduplicated by resolved record id, keeping the first
    /// occurrence, so two phrasings of the same movie yield one reference.
    pub async fn resolve_titles(&self, titles: &[String]) -> Vec<Movie> {
        let mut tasks = Vec::with_capacity(titles.len());

        for title in titles {
            let resolver = self.clone();
            let title = title.clone();
            tasks.push(tokio::spawn(
                async move { resolver.resolve_title(&title).await },
            ));
        }

        let mut seen = HashSet::new();
        let mut resolved = Vec::new();

        for (task, title) in tasks.into_iter().zip(titles) {
            match task.await {
                Ok(Ok(Some(movie))) => {
                    if seen.insert(movie.id) {
                        resolved.push(movie);
                    }
                }
                Ok(Ok(None)) => {
                    tracing::debug!(title = %title, "No catalog match for parsed title");
                }
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, title = %title, "Dropping unresolvable title");
                }
                Err(e) => {
                    tracing::error!(error = %e, title = %title, "Resolution task panicked");
                }
            }
        }

        resolved
    }
}
