//! End-to-end pipeline tests over in-process fakes: scripted upstream
//! clients and in-memory stores, no network or database.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use cinemood_api::db::stores::{MovieStore, RecommendationStore, WatchPartyStore};
use cinemood_api::error::{AppError, AppResult};
use cinemood_api::models::{
    GenreEntry, Movie, MovieDetails, MovieListPage, MovieSummary, NewMovie, PartyStatus,
    PreferenceSubmission, Recommendation, TimeWindow, User, WatchParty,
};
use cinemood_api::services::providers::{CatalogClient, ChatPrompt, CompletionClient};
use cinemood_api::services::{MovieResolver, RecommendationService, WatchPartyService};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Completion client that replays a canned response and records its calls
struct ScriptedLlm {
    response: String,
    calls: AtomicUsize,
    last_user_message: Mutex<Option<String>>,
}

impl ScriptedLlm {
    fn new(response: &str) -> Arc<Self> {
        Arc::new(Self {
            response: response.to_string(),
            calls: AtomicUsize::new(0),
            last_user_message: Mutex::new(None),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_user_message(&self) -> Option<String> {
        self.last_user_message.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedLlm {
    async fn complete(&self, prompt: &ChatPrompt) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_user_message.lock().unwrap() = Some(prompt.user.clone());
        Ok(self.response.clone())
    }

    fn model_id(&self) -> &str {
        "llama-3.3-70b-versatile"
    }
}

/// Catalog that serves search hits from a fixed table and fails on demand
struct ScriptedCatalog {
    by_title: HashMap<String, MovieSummary>,
    failing_titles: Vec<String>,
}

impl ScriptedCatalog {
    fn new(titles: &[(&str, i64)], failing: &[&str]) -> Arc<Self> {
        let by_title = titles
            .iter()
            .map(|(title, tmdb_id)| {
                (
                    title.to_string(),
                    MovieSummary {
                        id: *tmdb_id,
                        title: title.to_string(),
                        overview: Some("overview".to_string()),
                        release_date: Some("2010-01-01".to_string()),
                        genre_ids: vec![28],
                        poster_path: None,
                        backdrop_path: None,
                        vote_average: 7.0,
                        vote_count: 100,
                        original_language: Some("en".to_string()),
                        adult: false,
                        popularity: 10.0,
                    },
                )
            })
            .collect();

        Arc::new(Self {
            by_title,
            failing_titles: failing.iter().map(|title| title.to_string()).collect(),
        })
    }

    fn empty_page() -> MovieListPage {
        MovieListPage {
            page: 1,
            total_pages: 1,
            total_results: 0,
            results: vec![],
        }
    }
}

#[async_trait]
impl CatalogClient for ScriptedCatalog {
    async fn search_movies(&self, query: &str, _page: u32) -> AppResult<MovieListPage> {
        if self.failing_titles.iter().any(|title| title == query) {
            return Err(AppError::Upstream("catalog unavailable".to_string()));
        }

        let results = self
            .by_title
            .get(query)
            .map(|summary| vec![summary.clone()])
            .unwrap_or_default();

        Ok(MovieListPage {
            page: 1,
            total_pages: 1,
            total_results: results.len() as u64,
            results,
        })
    }

    async fn movie_details(&self, _tmdb_id: i64) -> AppResult<MovieDetails> {
        Err(AppError::Upstream("not scripted".to_string()))
    }

    async fn trending(&self, _window: TimeWindow) -> AppResult<MovieListPage> {
        Ok(Self::empty_page())
    }

    async fn popular(&self, _page: u32) -> AppResult<MovieListPage> {
        Ok(Self::empty_page())
    }

    async fn top_rated(&self, _page: u32) -> AppResult<MovieListPage> {
        Ok(Self::empty_page())
    }

    async fn by_genre(&self, _genre_id: i64, _page: u32) -> AppResult<MovieListPage> {
        Ok(Self::empty_page())
    }

    async fn similar(&self, _tmdb_id: i64, _page: u32) -> AppResult<MovieListPage> {
        Ok(Self::empty_page())
    }

    async fn recommended_for(&self, _tmdb_id: i64, _page: u32) -> AppResult<MovieListPage> {
        Ok(Self::empty_page())
    }

    async fn genre_list(&self) -> AppResult<Vec<GenreEntry>> {
        Ok(vec![])
    }
}

#[derive(Default)]
struct InMemoryMovieStore {
    movies: Mutex<Vec<Movie>>,
}

impl InMemoryMovieStore {
    fn record_count(&self) -> usize {
        self.movies.lock().unwrap().len()
    }
}

#[async_trait]
impl MovieStore for InMemoryMovieStore {
    async fn find_by_tmdb_id(&self, tmdb_id: i64) -> AppResult<Option<Movie>> {
        Ok(self
            .movies
            .lock()
            .unwrap()
            .iter()
            .find(|movie| movie.tmdb_id == tmdb_id)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Movie>> {
        Ok(self
            .movies
            .lock()
            .unwrap()
            .iter()
            .filter(|movie| ids.contains(&movie.id))
            .cloned()
            .collect())
    }

    async fn insert_if_absent(&self, new: NewMovie) -> AppResult<Movie> {
        let mut movies = self.movies.lock().unwrap();
        if let Some(existing) = movies.iter().find(|movie| movie.tmdb_id == new.tmdb_id) {
            return Ok(existing.clone());
        }
        let movie = Movie::new(new);
        movies.push(movie.clone());
        Ok(movie)
    }
}

#[derive(Default)]
struct InMemoryRecommendationStore {
    recommendations: Mutex<Vec<Recommendation>>,
}

impl InMemoryRecommendationStore {
    fn stored(&self) -> Vec<Recommendation> {
        self.recommendations.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecommendationStore for InMemoryRecommendationStore {
    async fn create(&self, recommendation: &Recommendation) -> AppResult<()> {
        self.recommendations
            .lock()
            .unwrap()
            .push(recommendation.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Recommendation>> {
        Ok(self
            .recommendations
            .lock()
            .unwrap()
            .iter()
            .find(|rec| rec.id == id)
            .cloned())
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Recommendation>> {
        let mut own: Vec<Recommendation> = self
            .recommendations
            .lock()
            .unwrap()
            .iter()
            .filter(|rec| rec.user_id == user_id)
            .cloned()
            .collect();
        own.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(own
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_by_user(&self, user_id: Uuid) -> AppResult<i64> {
        Ok(self
            .recommendations
            .lock()
            .unwrap()
            .iter()
            .filter(|rec| rec.user_id == user_id)
            .count() as i64)
    }

    async fn update_feedback(&self, recommendation: &Recommendation) -> AppResult<()> {
        let mut recommendations = self.recommendations.lock().unwrap();
        if let Some(stored) = recommendations
            .iter_mut()
            .find(|rec| rec.id == recommendation.id)
        {
            *stored = recommendation.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.recommendations.lock().unwrap().retain(|rec| rec.id != id);
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryWatchPartyStore {
    parties: Mutex<Vec<WatchParty>>,
}

impl InMemoryWatchPartyStore {
    fn stored(&self, id: Uuid) -> Option<WatchParty> {
        self.parties
            .lock()
            .unwrap()
            .iter()
            .find(|party| party.id == id)
            .cloned()
    }
}

#[async_trait]
impl WatchPartyStore for InMemoryWatchPartyStore {
    async fn create(&self, party: &WatchParty) -> AppResult<()> {
        self.parties.lock().unwrap().push(party.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<WatchParty>> {
        Ok(self.stored(id))
    }

    async fn find_active_by_invite_code(&self, invite_code: &str) -> AppResult<Option<WatchParty>> {
        Ok(self
            .parties
            .lock()
            .unwrap()
            .iter()
            .find(|party| party.invite_code == invite_code && party.status == PartyStatus::Active)
            .cloned())
    }

    async fn invite_code_exists(&self, invite_code: &str) -> AppResult<bool> {
        Ok(self
            .parties
            .lock()
            .unwrap()
            .iter()
            .any(|party| party.invite_code == invite_code))
    }

    async fn list_for_member(
        &self,
        user_id: Uuid,
        status: Option<PartyStatus>,
    ) -> AppResult<Vec<WatchParty>> {
        Ok(self
            .parties
            .lock()
            .unwrap()
            .iter()
            .filter(|party| party.is_member(user_id))
            .filter(|party| status.is_none() || status == Some(party.status))
            .cloned()
            .collect())
    }

    async fn update(&self, party: &WatchParty) -> AppResult<()> {
        let mut parties = self.parties.lock().unwrap();
        if let Some(stored) = parties.iter_mut().find(|stored| stored.id == party.id) {
            *stored = party.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.parties.lock().unwrap().retain(|party| party.id != id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

fn test_user() -> User {
    User::new(
        "Ada".to_string(),
        "ada@example.com".to_string(),
        "$2b$04$hash".to_string(),
    )
}

fn recommendation_service(
    llm: Arc<ScriptedLlm>,
    catalog: Arc<ScriptedCatalog>,
) -> (
    RecommendationService,
    Arc<InMemoryMovieStore>,
    Arc<InMemoryRecommendationStore>,
) {
    let movies = Arc::new(InMemoryMovieStore::default());
    let store = Arc::new(InMemoryRecommendationStore::default());
    let service = RecommendationService::new(
        llm,
        MovieResolver::new(catalog, movies.clone()),
        store.clone(),
        movies.clone(),
    );
    (service, movies, store)
}

fn watch_party_service(
    llm: Arc<ScriptedLlm>,
    catalog: Arc<ScriptedCatalog>,
) -> (WatchPartyService, Arc<InMemoryWatchPartyStore>) {
    let movies = Arc::new(InMemoryMovieStore::default());
    let store = Arc::new(InMemoryWatchPartyStore::default());
    let service = WatchPartyService::new(
        store.clone(),
        llm,
        MovieResolver::new(catalog, movies.clone()),
        movies,
    );
    (service, store)
}

const FIVE_TITLE_RESPONSE: &str = "\
1. **Inception (2010)** - Vibe Match: 9/10
   A mind-bending thriller.

2. **The Prestige (2006)** - Vibe Match: 8/10
   Dark and full of twists.

3. **Memento (2000)** - Vibe Match: 8/10
   Told backwards, stays tense.

4. **Shutter Island (2010)** - Vibe Match: 7/10
   A psychological puzzle.

5. **Tenet (2020)** - Vibe Match: 7/10
   Time runs both ways.";

// ---------------------------------------------------------------------------
// Recommendation pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pipeline_drops_failed_titles_but_keeps_full_text() {
    let llm = ScriptedLlm::new(FIVE_TITLE_RESPONSE);
    // Two of five titles fail: one upstream error, one with no catalog match
    let catalog = ScriptedCatalog::new(
        &[("Inception", 1), ("Memento", 3), ("Tenet", 5)],
        &["The Prestige"],
    );

    let (service, movies, store) = recommendation_service(llm.clone(), catalog);

    let view = service
        .generate(&test_user(), "something mind-bending")
        .await
        .unwrap();

    assert_eq!(view.movies.len(), 3);
    assert_eq!(view.ai_response, FIVE_TITLE_RESPONSE);

    let titles: Vec<&str> = view.movies.iter().map(|movie| movie.title.as_str()).collect();
    assert_eq!(titles, vec!["Inception", "Memento", "Tenet"]);

    let stored = store.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].recommended_movies.len(), 3);
    assert_eq!(stored[0].ai_response, FIVE_TITLE_RESPONSE);
    assert_eq!(stored[0].ai_model, "llama-3.3-70b-versatile");

    assert_eq!(movies.record_count(), 3);
}

#[tokio::test]
async fn pipeline_reuses_cached_movies_on_repeat_runs() {
    let llm = ScriptedLlm::new(FIVE_TITLE_RESPONSE);
    let catalog = ScriptedCatalog::new(
        &[
            ("Inception", 1),
            ("The Prestige", 2),
            ("Memento", 3),
            ("Shutter Island", 4),
            ("Tenet", 5),
        ],
        &[],
    );

    let (service, movies, store) = recommendation_service(llm.clone(), catalog);
    let user = test_user();

    let first = service.generate(&user, "something mind-bending").await.unwrap();
    let second = service.generate(&user, "more of the same").await.unwrap();

    // Same five records both times; the cache never mints duplicates
    assert_eq!(movies.record_count(), 5);
    let first_ids: Vec<Uuid> = first.movies.iter().map(|movie| movie.id).collect();
    let second_ids: Vec<Uuid> = second.movies.iter().map(|movie| movie.id).collect();
    assert_eq!(first_ids, second_ids);

    assert_eq!(store.stored().len(), 2);
    assert_eq!(llm.call_count(), 2);
}

#[tokio::test]
async fn prompt_length_boundary_gates_the_upstream_call() {
    let llm = ScriptedLlm::new("No titles in this response.");
    let catalog = ScriptedCatalog::new(&[], &[]);
    let (service, _movies, store) = recommendation_service(llm.clone(), catalog);
    let user = test_user();

    let at_limit = "a".repeat(500);
    let view = service.generate(&user, &at_limit).await.unwrap();
    assert!(view.movies.is_empty());
    assert_eq!(llm.call_count(), 1);
    assert_eq!(store.stored().len(), 1);

    let over_limit = "a".repeat(501);
    let result = service.generate(&user, &over_limit).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    // The oversized prompt never reached the model and persisted nothing
    assert_eq!(llm.call_count(), 1);
    assert_eq!(store.stored().len(), 1);
}

#[tokio::test]
async fn empty_resolution_is_not_an_error() {
    let llm = ScriptedLlm::new(FIVE_TITLE_RESPONSE);
    // No title resolves: every search comes back empty
    let catalog = ScriptedCatalog::new(&[], &[]);
    let (service, _movies, store) = recommendation_service(llm, catalog);

    let view = service.generate(&test_user(), "obscure picks").await.unwrap();
    assert!(view.movies.is_empty());
    assert_eq!(view.ai_response, FIVE_TITLE_RESPONSE);
    assert_eq!(store.stored()[0].recommended_movies.len(), 0);
}

// ---------------------------------------------------------------------------
// Watch party pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn group_generation_requires_every_member_to_respond() {
    let llm = ScriptedLlm::new(FIVE_TITLE_RESPONSE);
    let catalog = ScriptedCatalog::new(&[], &[]);
    let (service, _store) = watch_party_service(llm.clone(), catalog);

    let creator = test_user();
    let party = service.create(&creator, "Friday night", None).await.unwrap();

    // Two guests join; only one of the three members ever responds
    let guest_one = test_user();
    let guest_two = test_user();
    service
        .join(&guest_one, &party.invite_code, None)
        .await
        .unwrap();
    service
        .join(&guest_two, &party.invite_code, None)
        .await
        .unwrap();
    service
        .submit_preferences(
            creator.id,
            party.id,
            &PreferenceSubmission {
                genres: vec!["Action".to_string()],
                moods: vec!["fun".to_string()],
                avoid: vec![],
            },
        )
        .await
        .unwrap();
    service
        .submit_preferences(
            guest_one.id,
            party.id,
            &PreferenceSubmission {
                genres: vec!["Comedy".to_string()],
                moods: vec![],
                avoid: vec![],
            },
        )
        .await
        .unwrap();

    let result = service.generate_recommendation(creator.id, party.id).await;
    assert!(matches!(result, Err(AppError::Precondition(_))));
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn group_generation_pools_preferences_and_overwrites_wholesale() {
    let llm = ScriptedLlm::new("1. **Heat (1995)** - everyone wins");
    let catalog = ScriptedCatalog::new(&[("Heat", 949)], &[]);
    let (service, store) = watch_party_service(llm.clone(), catalog);

    let creator = test_user();
    let guest = test_user();
    let party = service.create(&creator, "Heist night", None).await.unwrap();
    service.join(&guest, &party.invite_code, None).await.unwrap();

    service
        .submit_preferences(
            creator.id,
            party.id,
            &PreferenceSubmission {
                genres: vec!["Action".to_string(), "Crime".to_string()],
                moods: vec!["tense".to_string()],
                avoid: vec![],
            },
        )
        .await
        .unwrap();
    service
        .submit_preferences(
            guest.id,
            party.id,
            &PreferenceSubmission {
                genres: vec!["Crime".to_string(), "Drama".to_string()],
                moods: vec!["tense".to_string(), "smart".to_string()],
                avoid: vec!["horror".to_string()],
            },
        )
        .await
        .unwrap();

    let view = service
        .generate_recommendation(creator.id, party.id)
        .await
        .unwrap();

    // Top labels come from the deduplicated union pools, in first-seen order
    let message = llm.last_user_message().unwrap();
    assert!(message.contains("Popular genres: Action, Crime, Drama"));
    assert!(message.contains("Popular moods/vibes: tense, smart"));
    assert!(message.contains("Number of people: 2"));

    let rec = view.group_recommendation.unwrap();
    assert_eq!(rec.movies.len(), 1);
    assert_eq!(rec.movies[0].title, "Heat");

    // Regenerating overwrites the recommendation but resets nothing else
    service
        .generate_recommendation(guest.id, party.id)
        .await
        .unwrap();
    let stored = store.stored(party.id).unwrap();
    assert!(stored.members.iter().all(|member| member.has_responded));
    assert_eq!(
        stored.preferences.genres,
        vec![
            "Action".to_string(),
            "Crime".to_string(),
            "Drama".to_string()
        ]
    );
    assert!(stored.group_recommendation.is_some());
    assert_eq!(llm.call_count(), 2);
}

#[tokio::test]
async fn invite_codes_stay_unique_across_a_thousand_parties() {
    let llm = ScriptedLlm::new("unused");
    let catalog = ScriptedCatalog::new(&[], &[]);
    let (service, _store) = watch_party_service(llm, catalog);

    let mut codes = HashSet::new();
    for i in 0..1000 {
        let party = service
            .create(&test_user(), &format!("party {}", i), None)
            .await
            .unwrap();
        assert!(
            codes.insert(party.invite_code.clone()),
            "duplicate invite code {}",
            party.invite_code
        );
    }
    assert_eq!(codes.len(), 1000);
}

#[tokio::test]
async fn joining_with_a_stale_code_fails_once_party_is_inactive() {
    let llm = ScriptedLlm::new("unused");
    let catalog = ScriptedCatalog::new(&[], &[]);
    let (service, _store) = watch_party_service(llm, catalog);

    let creator = test_user();
    let party = service.create(&creator, "One night only", None).await.unwrap();
    service
        .update_status(creator.id, party.id, PartyStatus::Completed)
        .await
        .unwrap();

    let late_guest = test_user();
    let result = service.join(&late_guest, &party.invite_code, None).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}
