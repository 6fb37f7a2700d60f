use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Genre/language hints used to bias recommendation prompts.
///
/// Soft bias only: the orchestrator embeds them in the user message when
/// present, mood text always wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserPreferences {
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            genres: Vec::new(),
            languages: vec!["English".to_string()],
        }
    }
}

/// A registered account
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub preferences: UserPreferences,
    pub avatar: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates an account with default preferences. The password must
    /// already be hashed; hashing happens at the call site, not in a
    /// persistence hook.
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            preferences: UserPreferences::default(),
            avatar: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
