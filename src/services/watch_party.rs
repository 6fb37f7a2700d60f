//! Watch party lifecycle and the group preference aggregator.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::{
    db::stores::{MovieStore, WatchPartyStore},
    error::{AppError, AppResult},
    models::{
        GroupRecommendation, PartyMember, PartyStatus, PreferenceSubmission, User, WatchParty,
        WatchPartyView,
    },
    services::{
        parser::extract_movie_titles,
        prompt::{
            build_group_user_message, GROUP_SYSTEM_PROMPT, GROUP_TEMPERATURE,
            MAX_COMPLETION_TOKENS,
        },
        providers::{ChatPrompt, CompletionClient},
        resolver::MovieResolver,
    },
};

const MAX_PARTY_NAME_CHARS: usize = 100;
const INVITE_CODE_LEN: usize = 6;
const INVITE_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
/// Collision re-draws before giving up; the keyspace is 36^6 so hitting this
/// means something other than bad luck
const INVITE_CODE_MAX_ATTEMPTS: usize = 16;

/// How many pooled labels of each kind feed the group prompt
const TOP_LABELS: usize = 3;

pub struct WatchPartyService {
    store: Arc<dyn WatchPartyStore>,
    llm: Arc<dyn CompletionClient>,
    resolver: MovieResolver,
    movies: Arc<dyn MovieStore>,
}

impl WatchPartyService {
    pub fn new(
        store: Arc<dyn WatchPartyStore>,
        llm: Arc<dyn CompletionClient>,
        resolver: MovieResolver,
        movies: Arc<dyn MovieStore>,
    ) -> Self {
        Self {
            store,
            llm,
            resolver,
            movies,
        }
    }

    pub async fn create(
        &self,
        user: &User,
        name: &str,
        scheduled_for: Option<DateTime<Utc>>,
    ) -> AppResult<WatchParty> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation(
                "Please provide a party name".to_string(),
            ));
        }
        if name.chars().count() > MAX_PARTY_NAME_CHARS {
            return Err(AppError::Validation(format!(
                "Name cannot exceed {} characters",
                MAX_PARTY_NAME_CHARS
            )));
        }

        let invite_code = self.unique_invite_code().await?;
        let party = WatchParty::new(name.to_string(), user.id, scheduled_for, invite_code);
        self.store.create(&party).await?;

        tracing::info!(party_id = %party.id, creator = %user.id, "Watch party created");

        Ok(party)
    }

    /// Party details with group recommendation movies populated; members only
    pub async fn get(&self, user_id: Uuid, id: Uuid) -> AppResult<WatchPartyView> {
        let party = self.found(id).await?;
        if !party.is_member(user_id) {
            return Err(AppError::Forbidden(
                "You are not a member of this party".to_string(),
            ));
        }
        self.view(party).await
    }

    /// Redeems an invite code. Only active parties are joinable, and a user
    /// can hold at most one seat per party.
    pub async fn join(
        &self,
        user: &User,
        invite_code: &str,
        guest_name: Option<String>,
    ) -> AppResult<WatchParty> {
        let mut party = self
            .store
            .find_active_by_invite_code(invite_code)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("Invalid invite code or party no longer active".to_string())
            })?;

        if party.is_member(user.id) {
            return Err(AppError::Validation(
                "You are already a member of this party".to_string(),
            ));
        }

        party.members.push(PartyMember::registered(user.id, guest_name));
        party.updated_at = Utc::now();
        self.store.update(&party).await?;

        Ok(party)
    }

    /// Merges one member's submission into the aggregate pools and marks
    /// them as having responded. The pools keep only the deduplicated
    /// union; who contributed which label is not retained.
    pub async fn submit_preferences(
        &self,
        user_id: Uuid,
        id: Uuid,
        submission: &PreferenceSubmission,
    ) -> AppResult<WatchParty> {
        let mut party = self.found(id).await?;

        let member = party.member_mut(user_id).ok_or_else(|| {
            AppError::Forbidden("You are not a member of this party".to_string())
        })?;
        member.has_responded = true;

        party.preferences.merge(submission);
        party.updated_at = Utc::now();
        self.store.update(&party).await?;

        Ok(party)
    }

    /// Generates the pooled group recommendation.
    ///
    /// Requires every member to have responded; checked before any
    /// completion call is made. Each generation overwrites the previous
    /// recommendation wholesale and leaves responded flags and pools
    /// untouched, so the call is repeatable.
    pub async fn generate_recommendation(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> AppResult<WatchPartyView> {
        let mut party = self.found(id).await?;

        if !party.is_member(user_id) {
            return Err(AppError::Forbidden(
                "You are not a member of this party".to_string(),
            ));
        }

        if !party.all_responded() {
            return Err(AppError::Precondition(
                "Not all members have submitted their preferences yet".to_string(),
            ));
        }

        // The pools are already deduplicated unions, so this tally counts
        // each pooled label once and top-N selection reduces to first-seen
        // pool order. Kept over a true per-member majority vote, which would
        // require retaining individual submissions.
        let top_genres = top_labels(&party.preferences.genres, TOP_LABELS);
        let top_moods = top_labels(&party.preferences.moods, TOP_LABELS);

        let chat = ChatPrompt {
            system: GROUP_SYSTEM_PROMPT.to_string(),
            user: build_group_user_message(&top_genres, &top_moods, party.members.len()),
            temperature: GROUP_TEMPERATURE,
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        let ai_response = self.llm.complete(&chat).await?;

        let titles = extract_movie_titles(&ai_response);
        let movies = self.resolver.resolve_titles(&titles).await;

        tracing::info!(
            party_id = %party.id,
            parsed_titles = titles.len(),
            resolved = movies.len(),
            "Group recommendation generated"
        );

        party.group_recommendation = Some(GroupRecommendation {
            movies: movies.iter().map(|movie| movie.id).collect(),
            explanation: ai_response,
        });
        party.updated_at = Utc::now();
        self.store.update(&party).await?;

        Ok(WatchPartyView::new(party, movies))
    }

    /// Creator-only status change
    pub async fn update_status(
        &self,
        user_id: Uuid,
        id: Uuid,
        status: PartyStatus,
    ) -> AppResult<WatchParty> {
        let mut party = self.found(id).await?;

        if party.created_by != user_id {
            return Err(AppError::Forbidden(
                "Only the party creator can update status".to_string(),
            ));
        }

        party.status = status;
        party.updated_at = Utc::now();
        self.store.update(&party).await?;

        Ok(party)
    }

    pub async fn my_parties(
        &self,
        user_id: Uuid,
        status: Option<PartyStatus>,
    ) -> AppResult<Vec<WatchParty>> {
        self.store.list_for_member(user_id, status).await
    }

    /// Removes the caller's seat. The creator cannot leave; deleting the
    /// party is the only way out for them.
    pub async fn leave(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        let mut party = self.found(id).await?;

        if party.created_by == user_id {
            return Err(AppError::Validation(
                "Party creator cannot leave. Delete the party instead.".to_string(),
            ));
        }

        party.members.retain(|member| member.user_id != Some(user_id));
        party.updated_at = Utc::now();
        self.store.update(&party).await
    }

    /// Creator-only deletion
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        let party = self.found(id).await?;

        if party.created_by != user_id {
            return Err(AppError::Forbidden(
                "Only the party creator can delete the party".to_string(),
            ));
        }

        self.store.delete(party.id).await
    }

    async fn found(&self, id: Uuid) -> AppResult<WatchParty> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Watch party not found".to_string()))
    }

    async fn view(&self, party: WatchParty) -> AppResult<WatchPartyView> {
        let movies = match &party.group_recommendation {
            Some(rec) => {
                let fetched = self.movies.find_by_ids(&rec.movies).await?;
                rec.movies
                    .iter()
                    .filter_map(|id| fetched.iter().find(|movie| movie.id == *id).cloned())
                    .collect()
            }
            None => Vec::new(),
        };
        Ok(WatchPartyView::new(party, movies))
    }

    /// Draws invite codes until one is unused. Codes are immutable once a
    /// party is created, so an existing code blocks its value forever.
    async fn unique_invite_code(&self) -> AppResult<String> {
        for _ in 0..INVITE_CODE_MAX_ATTEMPTS {
            let code = generate_invite_code();
            if !self.store.invite_code_exists(&code).await? {
                return Ok(code);
            }
            tracing::debug!(code = %code, "Invite code collision, re-drawing");
        }

        Err(AppError::Internal(
            "Could not generate a unique invite code".to_string(),
        ))
    }
}

/// A 6-character uppercase alphanumeric code, short enough to read out loud
fn generate_invite_code() -> String {
    let mut rng = rand::thread_rng();
    (0..INVITE_CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..INVITE_CODE_CHARSET.len());
            INVITE_CODE_CHARSET[idx] as char
        })
        .collect()
}

/// Top-N labels by frequency of occurrence in the pool, descending; ties
/// keep first-seen order. The caller hands in an already-deduplicated pool,
/// so in practice every label counts once and first-seen order decides.
fn top_labels(pool: &[String], n: usize) -> Vec<String> {
    let mut tally: Vec<(&String, usize)> = Vec::new();
    for label in pool {
        match tally.iter_mut().find(|(seen, _)| *seen == label) {
            Some((_, count)) => *count += 1,
            None => tally.push((label, 1)),
        }
    }

    tally.sort_by(|a, b| b.1.cmp(&a.1));
    tally.into_iter().take(n).map(|(label, _)| label.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::stores::movies::MockMovieStore;
    use crate::db::stores::watch_parties::MockWatchPartyStore;
    use crate::services::providers::{MockCatalogClient, MockCompletionClient};
    use std::collections::HashSet;

    fn test_user() -> User {
        User::new(
            "Ada".to_string(),
            "ada@example.com".to_string(),
            "$2b$04$hash".to_string(),
        )
    }

    fn service(
        store: MockWatchPartyStore,
        llm: MockCompletionClient,
        catalog: MockCatalogClient,
        movies: MockMovieStore,
    ) -> WatchPartyService {
        let movies = Arc::new(movies);
        WatchPartyService::new(
            Arc::new(store),
            Arc::new(llm),
            MovieResolver::new(Arc::new(catalog), movies.clone()),
            movies,
        )
    }

    fn party_with_members(creator: Uuid, extra: usize, responded: bool) -> WatchParty {
        let mut party = WatchParty::new(
            "Friday night".to_string(),
            creator,
            None,
            "AB12CD".to_string(),
        );
        party.members[0].has_responded = responded;
        for _ in 0..extra {
            let mut member = PartyMember::registered(Uuid::new_v4(), None);
            member.has_responded = responded;
            party.members.push(member);
        }
        party
    }

    #[test]
    fn test_invite_codes_use_expected_alphabet() {
        for _ in 0..100 {
            let code = generate_invite_code();
            assert_eq!(code.len(), INVITE_CODE_LEN);
            assert!(code
                .bytes()
                .all(|b| INVITE_CODE_CHARSET.contains(&b)));
        }
    }

    #[test]
    fn test_invite_codes_are_practically_unique() {
        let codes: HashSet<String> = (0..1000).map(|_| generate_invite_code()).collect();
        // 36^6 values; a batch of 1000 collides with probability ~2e-4
        assert!(codes.len() >= 999);
    }

    #[test]
    fn test_top_labels_prefers_frequency_over_position() {
        let pool: Vec<String> = ["Action", "Comedy", "Action", "Horror", "Action", "Comedy"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            top_labels(&pool, 2),
            vec!["Action".to_string(), "Comedy".to_string()]
        );
    }

    #[test]
    fn test_top_labels_over_deduplicated_pool_is_first_seen_order() {
        // Aggregate pools are deduplicated unions, so every label counts
        // once and selection falls back to pool order.
        let pool: Vec<String> = ["Action", "Comedy", "Horror", "Drama"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            top_labels(&pool, 3),
            vec![
                "Action".to_string(),
                "Comedy".to_string(),
                "Horror".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name_without_store_call() {
        let mut store = MockWatchPartyStore::new();
        store.expect_create().times(0);
        store.expect_invite_code_exists().times(0);

        let service = service(
            store,
            MockCompletionClient::new(),
            MockCatalogClient::new(),
            MockMovieStore::new(),
        );

        let result = service.create(&test_user(), "   ", None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_redraws_invite_code_on_collision() {
        let mut store = MockWatchPartyStore::new();
        let mut calls = mockall::Sequence::new();
        store
            .expect_invite_code_exists()
            .times(1)
            .in_sequence(&mut calls)
            .returning(|_| Ok(true));
        store
            .expect_invite_code_exists()
            .times(1)
            .in_sequence(&mut calls)
            .returning(|_| Ok(false));
        store.expect_create().times(1).returning(|_| Ok(()));

        let service = service(
            store,
            MockCompletionClient::new(),
            MockCatalogClient::new(),
            MockMovieStore::new(),
        );

        let party = service
            .create(&test_user(), "Friday night", None)
            .await
            .unwrap();
        assert_eq!(party.invite_code.len(), INVITE_CODE_LEN);
    }

    #[tokio::test]
    async fn test_generate_requires_all_members_responded() {
        let user = test_user();
        let mut party = party_with_members(user.id, 2, true);
        party.members[2].has_responded = false;

        let mut store = MockWatchPartyStore::new();
        store
            .expect_find_by_id()
            .returning(move |_| Ok(Some(party.clone())));
        store.expect_update().times(0);

        let mut llm = MockCompletionClient::new();
        llm.expect_complete().times(0);

        let service = service(store, llm, MockCatalogClient::new(), MockMovieStore::new());

        let result = service.generate_recommendation(user.id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::Precondition(_))));
    }

    #[tokio::test]
    async fn test_generate_overwrites_previous_recommendation_wholesale() {
        let user = test_user();
        let mut party = party_with_members(user.id, 1, true);
        party.preferences.genres = vec!["Action".to_string(), "Comedy".to_string()];
        party.preferences.moods = vec!["fun".to_string()];
        party.group_recommendation = Some(GroupRecommendation {
            movies: vec![Uuid::new_v4()],
            explanation: "old explanation".to_string(),
        });

        let mut store = MockWatchPartyStore::new();
        store
            .expect_find_by_id()
            .returning(move |_| Ok(Some(party.clone())));
        store
            .expect_update()
            .withf(|updated| {
                let rec = updated.group_recommendation.as_ref().unwrap();
                rec.explanation.contains("Heat (1995)")
                    && updated.members.iter().all(|m| m.has_responded)
            })
            .times(1)
            .returning(|_| Ok(()));

        let mut llm = MockCompletionClient::new();
        llm.expect_complete()
            .withf(|chat| {
                chat.user.contains("Popular genres: Action, Comedy")
                    && chat.user.contains("Number of people: 2")
            })
            .times(1)
            .returning(|_| Ok("1. **Heat (1995)** - a crowd pleaser".to_string()));

        let mut catalog = MockCatalogClient::new();
        catalog.expect_search_movies().returning(|_, _| {
            Ok(crate::models::MovieListPage {
                page: 1,
                total_pages: 1,
                total_results: 0,
                results: vec![],
            })
        });

        let service = service(store, llm, catalog, MockMovieStore::new());

        let view = service
            .generate_recommendation(user.id, Uuid::new_v4())
            .await
            .unwrap();
        let rec = view.group_recommendation.unwrap();
        assert!(rec.explanation.contains("Heat (1995)"));
        assert!(rec.movies.is_empty());
    }

    #[tokio::test]
    async fn test_join_rejects_existing_member() {
        let user = test_user();
        let party = party_with_members(user.id, 0, false);

        let mut store = MockWatchPartyStore::new();
        store
            .expect_find_active_by_invite_code()
            .returning(move |_| Ok(Some(party.clone())));
        store.expect_update().times(0);

        let service = service(
            store,
            MockCompletionClient::new(),
            MockCatalogClient::new(),
            MockMovieStore::new(),
        );

        let result = service.join(&user, "AB12CD", None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_join_unknown_code_is_not_found() {
        let mut store = MockWatchPartyStore::new();
        store
            .expect_find_active_by_invite_code()
            .returning(|_| Ok(None));

        let service = service(
            store,
            MockCompletionClient::new(),
            MockCatalogClient::new(),
            MockMovieStore::new(),
        );

        let result = service.join(&test_user(), "ZZZZZZ", None).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_submit_preferences_marks_member_and_merges_pools() {
        let user = test_user();
        let mut party = party_with_members(user.id, 0, false);
        party.preferences.genres = vec!["Action".to_string()];

        let mut store = MockWatchPartyStore::new();
        store
            .expect_find_by_id()
            .returning(move |_| Ok(Some(party.clone())));
        store
            .expect_update()
            .withf(move |updated| {
                updated.members[0].has_responded
                    && updated.preferences.genres
                        == vec!["Action".to_string(), "Comedy".to_string()]
            })
            .times(1)
            .returning(|_| Ok(()));

        let service = service(
            store,
            MockCompletionClient::new(),
            MockCatalogClient::new(),
            MockMovieStore::new(),
        );

        let submission = PreferenceSubmission {
            genres: vec!["Action".to_string(), "Comedy".to_string()],
            moods: vec![],
            avoid: vec![],
        };
        service
            .submit_preferences(user.id, Uuid::new_v4(), &submission)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_creator_cannot_leave() {
        let user = test_user();
        let party = party_with_members(user.id, 1, false);

        let mut store = MockWatchPartyStore::new();
        store
            .expect_find_by_id()
            .returning(move |_| Ok(Some(party.clone())));
        store.expect_update().times(0);

        let service = service(
            store,
            MockCompletionClient::new(),
            MockCatalogClient::new(),
            MockMovieStore::new(),
        );

        let result = service.leave(user.id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_only_creator_deletes() {
        let creator = Uuid::new_v4();
        let outsider = test_user();
        let mut party = party_with_members(creator, 0, false);
        party
            .members
            .push(PartyMember::registered(outsider.id, None));

        let mut store = MockWatchPartyStore::new();
        store
            .expect_find_by_id()
            .returning(move |_| Ok(Some(party.clone())));
        store.expect_delete().times(0);

        let service = service(
            store,
            MockCompletionClient::new(),
            MockCatalogClient::new(),
            MockMovieStore::new(),
        );

        let result = service.delete(outsider.id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
