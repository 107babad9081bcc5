use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Template assigned to spaces created without an explicit one.
pub const SYSTEM_LEGACY_TEMPLATE_ID: &str = "929c963a-174c-4c37-b487-272067e88bd4";

/// Type tag applied to codebases created without one.
pub const DEFAULT_CODEBASE_KIND: &str = "git";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    #[serde(skip)]
    pub token_hash: String,
    #[serde(skip)]
    pub token_lookup: String,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

/// A project container. Ownership is fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Space {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub owner_id: String,
    pub template_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Space {
    #[must_use]
    pub fn is_owned_by(&self, identity: &Identity) -> bool {
        self.owner_id == identity.id
    }
}

/// A link from a space to an external source repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Codebase {
    pub id: String,
    pub space_id: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cve_scan: Option<bool>,
    pub created_at: DateTime<Utc>,
}
