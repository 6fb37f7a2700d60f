use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{GroupRecommendation, PartyMember, PartyPreferences, PartyStatus, WatchParty};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WatchPartyStore: Send + Sync {
    async fn create(&self, party: &WatchParty) -> AppResult<()>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<WatchParty>>;

    /// Looks up an *active* party by its invite code; inactive parties are
    /// not joinable and resolve to `None`
    async fn find_active_by_invite_code(&self, invite_code: &str) -> AppResult<Option<WatchParty>>;

    /// Whether any party, regardless of status, holds this invite code
    async fn invite_code_exists(&self, invite_code: &str) -> AppResult<bool>;

    /// Parties the user belongs to, newest first, optionally filtered by status
    async fn list_for_member(
        &self,
        user_id: Uuid,
        status: Option<PartyStatus>,
    ) -> AppResult<Vec<WatchParty>>;

    /// Writes the party's mutable document state wholesale
    async fn update(&self, party: &WatchParty) -> AppResult<()>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

#[derive(sqlx::FromRow)]
struct WatchPartyRow {
    id: Uuid,
    name: String,
    created_by: Uuid,
    members: Json<Vec<PartyMember>>,
    preferences: Json<PartyPreferences>,
    group_recommendation: Option<Json<GroupRecommendation>>,
    scheduled_for: Option<DateTime<Utc>>,
    status: String,
    invite_code: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WatchPartyRow> for WatchParty {
    type Error = AppError;

    fn try_from(row: WatchPartyRow) -> Result<Self, Self::Error> {
        let status = PartyStatus::parse(&row.status)
            .map_err(|_| AppError::Internal(format!("Unknown party status '{}'", row.status)))?;
        Ok(WatchParty {
            id: row.id,
            name: row.name,
            created_by: row.created_by,
            members: row.members.0,
            preferences: row.preferences.0,
            group_recommendation: row.group_recommendation.map(|json| json.0),
            scheduled_for: row.scheduled_for,
            status,
            invite_code: row.invite_code,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct PgWatchPartyStore {
    pool: PgPool,
}

impl PgWatchPartyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WatchPartyStore for PgWatchPartyStore {
    async fn create(&self, party: &WatchParty) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO watch_parties (
                id, name, created_by, members, preferences, group_recommendation,
                scheduled_for, status, invite_code, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(party.id)
        .bind(&party.name)
        .bind(party.created_by)
        .bind(Json(&party.members))
        .bind(Json(&party.preferences))
        .bind(party.group_recommendation.as_ref().map(Json))
        .bind(party.scheduled_for)
        .bind(party.status.as_str())
        .bind(&party.invite_code)
        .bind(party.created_at)
        .bind(party.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<WatchParty>> {
        let row = sqlx::query_as::<_, WatchPartyRow>("SELECT * FROM watch_parties WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(WatchParty::try_from).transpose()
    }

    async fn find_active_by_invite_code(&self, invite_code: &str) -> AppResult<Option<WatchParty>> {
        let row = sqlx::query_as::<_, WatchPartyRow>(
            "SELECT * FROM watch_parties WHERE invite_code = $1 AND status = 'active'",
        )
        .bind(invite_code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(WatchParty::try_from).transpose()
    }

    async fn invite_code_exists(&self, invite_code: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM watch_parties WHERE invite_code = $1)")
                .bind(invite_code)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn list_for_member(
        &self,
        user_id: Uuid,
        status: Option<PartyStatus>,
    ) -> AppResult<Vec<WatchParty>> {
        let rows = sqlx::query_as::<_, WatchPartyRow>(
            r#"
            SELECT * FROM watch_parties
            WHERE EXISTS (
                SELECT 1 FROM jsonb_array_elements(members) AS member
                WHERE (member ->> 'user_id')::uuid = $1
            )
            AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(WatchParty::try_from).collect()
    }

    async fn update(&self, party: &WatchParty) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE watch_parties
            SET members = $2, preferences = $3, group_recommendation = $4,
                status = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(party.id)
        .bind(Json(&party.members))
        .bind(Json(&party.preferences))
        .bind(party.group_recommendation.as_ref().map(Json))
        .bind(party.status.as_str())
        .bind(party.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM watch_parties WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
