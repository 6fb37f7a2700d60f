use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::movie::Movie;
use crate::error::{AppError, AppResult};

/// Watch party lifecycle state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PartyStatus {
    Active,
    Completed,
    Cancelled,
}

impl PartyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartyStatus::Active => "active",
            PartyStatus::Completed => "completed",
            PartyStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "active" => Ok(PartyStatus::Active),
            "completed" => Ok(PartyStatus::Completed),
            "cancelled" => Ok(PartyStatus::Cancelled),
            other => Err(AppError::Validation(format!(
                "Status must be: active, completed, or cancelled, got '{}'",
                other
            ))),
        }
    }
}

/// One member of a watch party: a registered account or a named guest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartyMember {
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub guest_name: Option<String>,
    pub has_responded: bool,
    pub joined_at: DateTime<Utc>,
}

impl PartyMember {
    pub fn registered(user_id: Uuid, guest_name: Option<String>) -> Self {
        Self {
            user_id: Some(user_id),
            guest_name,
            has_responded: false,
            joined_at: Utc::now(),
        }
    }
}

/// A member's preference submission
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferenceSubmission {
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub moods: Vec<String>,
    #[serde(default)]
    pub avoid: Vec<String>,
}

/// Aggregate preference pools for a party.
///
/// Each pool is the deduplicated union of every member's submission;
/// per-member attribution is discarded at merge time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PartyPreferences {
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub moods: Vec<String>,
    #[serde(default)]
    pub avoid: Vec<String>,
}

fn merge_pool(pool: &mut Vec<String>, additions: &[String]) {
    for label in additions {
        if !pool.contains(label) {
            pool.push(label.clone());
        }
    }
}

impl PartyPreferences {
    /// Unions a submission into the pools, preserving first-seen order
    pub fn merge(&mut self, submission: &PreferenceSubmission) {
        merge_pool(&mut self.genres, &submission.genres);
        merge_pool(&mut self.moods, &submission.moods);
        merge_pool(&mut self.avoid, &submission.avoid);
    }
}

/// The party's pooled AI pick, overwritten wholesale on each generation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupRecommendation {
    pub movies: Vec<Uuid>,
    pub explanation: String,
}

/// A group watch session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchParty {
    pub id: Uuid,
    pub name: String,
    pub created_by: Uuid,
    pub members: Vec<PartyMember>,
    pub preferences: PartyPreferences,
    pub group_recommendation: Option<GroupRecommendation>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub status: PartyStatus,
    pub invite_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WatchParty {
    /// Creates an active party with the creator as its first member
    pub fn new(
        name: String,
        created_by: Uuid,
        scheduled_for: Option<DateTime<Utc>>,
        invite_code: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            created_by,
            members: vec![PartyMember::registered(created_by, None)],
            preferences: PartyPreferences::default(),
            group_recommendation: None,
            scheduled_for,
            status: PartyStatus::Active,
            invite_code,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.members
            .iter()
            .any(|member| member.user_id == Some(user_id))
    }

    pub fn member_mut(&mut self, user_id: Uuid) -> Option<&mut PartyMember> {
        self.members
            .iter_mut()
            .find(|member| member.user_id == Some(user_id))
    }

    pub fn all_responded(&self) -> bool {
        self.members.iter().all(|member| member.has_responded)
    }
}

/// A party with its group recommendation movies populated
#[derive(Debug, Serialize)]
pub struct GroupRecommendationView {
    pub movies: Vec<Movie>,
    pub explanation: String,
}

#[derive(Debug, Serialize)]
pub struct WatchPartyView {
    pub id: Uuid,
    pub name: String,
    pub created_by: Uuid,
    pub members: Vec<PartyMember>,
    pub preferences: PartyPreferences,
    pub group_recommendation: Option<GroupRecommendationView>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub status: PartyStatus,
    pub invite_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WatchPartyView {
    pub fn new(party: WatchParty, movies: Vec<Movie>) -> Self {
        let group_recommendation = party
            .group_recommendation
            .map(|rec| GroupRecommendationView {
                movies,
                explanation: rec.explanation,
            });
        Self {
            id: party.id,
            name: party.name,
            created_by: party.created_by,
            members: party.members,
            preferences: party.preferences,
            group_recommendation,
            scheduled_for: party.scheduled_for,
            status: party.status,
            invite_code: party.invite_code,
            created_at: party.created_at,
            updated_at: party.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_party_seeds_creator_as_member() {
        let creator = Uuid::new_v4();
        let party = WatchParty::new("Movie night".to_string(), creator, None, "AB12CD".to_string());
        assert_eq!(party.members.len(), 1);
        assert_eq!(party.members[0].user_id, Some(creator));
        assert!(!party.members[0].has_responded);
        assert_eq!(party.status, PartyStatus::Active);
    }

    #[test]
    fn test_merge_deduplicates_and_preserves_order() {
        let mut preferences = PartyPreferences::default();
        preferences.merge(&PreferenceSubmission {
            genres: vec!["Action".to_string(), "Comedy".to_string()],
            moods: vec!["tense".to_string()],
            avoid: vec![],
        });
        preferences.merge(&PreferenceSubmission {
            genres: vec!["Comedy".to_string(), "Horror".to_string()],
            moods: vec!["tense".to_string(), "cozy".to_string()],
            avoid: vec!["musicals".to_string()],
        });

        assert_eq!(
            preferences.genres,
            vec![
                "Action".to_string(),
                "Comedy".to_string(),
                "Horror".to_string()
            ]
        );
        assert_eq!(
            preferences.moods,
            vec!["tense".to_string(), "cozy".to_string()]
        );
        assert_eq!(preferences.avoid, vec!["musicals".to_string()]);
    }

    #[test]
    fn test_all_responded() {
        let creator = Uuid::new_v4();
        let mut party =
            WatchParty::new("Movie night".to_string(), creator, None, "AB12CD".to_string());
        party.members.push(PartyMember::registered(Uuid::new_v4(), None));
        assert!(!party.all_responded());

        for member in &mut party.members {
            member.has_responded = true;
        }
        assert!(party.all_responded());
    }

    #[test]
    fn test_party_status_parse_rejects_unknown() {
        assert!(PartyStatus::parse("archived").is_err());
        assert_eq!(PartyStatus::parse("cancelled").unwrap(), PartyStatus::Cancelled);
    }
}
