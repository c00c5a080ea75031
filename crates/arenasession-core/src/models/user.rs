use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Snapshot of the authenticated user as the identity service reports it.
///
/// Field names follow the server's camelCase wire format. Only the identity
/// fields are required; everything else is profile or statistics data that
/// the server may or may not include.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    id: String,
    pub name: String,
    pub username: String,
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,

    // Streaks and progress
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_streak: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_streak: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_submission: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_solved: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hints_used: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editorial_used: Option<u32>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub links: HashMap<String, String>,
    /// year -> day -> submissions that day
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub yearly_grid: HashMap<String, HashMap<String, u32>>,

    // Opaque collections the profile page renders as-is
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub achievements: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub badges: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub problems: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub submission: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sheets: Vec<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserSession {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            username: username.into(),
            email: email.into(),
            image: None,
            role: None,
            bio: None,
            is_verified: None,
            current_streak: None,
            max_streak: None,
            last_submission: None,
            problem_solved: None,
            xp: None,
            level: None,
            tier: None,
            hints_used: None,
            editorial_used: None,
            links: HashMap::new(),
            yearly_grid: HashMap::new(),
            achievements: Vec::new(),
            badges: Vec::new(),
            problems: Vec::new(),
            submission: Vec::new(),
            sheets: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// The user's identifier. It never changes for a given snapshot.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// "Name (@handle)" for status lines.
    pub fn display_name(&self) -> String {
        format!("{} (@{})", self.name, self.username)
    }

    pub fn is_verified(&self) -> bool {
        self.is_verified.unwrap_or(false)
    }
}
