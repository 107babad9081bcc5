use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Codebase, Token};

pub const CODEBASE_RESOURCE_TYPE: &str = "codebases";
pub const SPACE_RESOURCE_TYPE: &str = "spaces";

#[derive(Debug, Deserialize)]
pub struct CreateIdentityRequest {
    pub username: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateIdentityTokenRequest {
    #[serde(default)]
    pub expires_in_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub id: String,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

impl From<Token> for TokenResponse {
    fn from(token: Token) -> Self {
        Self {
            id: token.id,
            is_admin: token.is_admin,
            identity_id: token.identity_id,
            created_at: token.created_at,
            expires_at: token.expires_at,
            last_used_at: token.last_used_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateTokenResponse {
    pub token: String,
    pub metadata: TokenResponse,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpaceRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub template_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCodebaseRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub stack_id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// A codebase as returned by the API, with its space relationship inlined.
#[derive(Debug, Serialize)]
pub struct CodebaseResource {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: &'static str,
    pub attributes: CodebaseAttributes,
    pub relationships: CodebaseRelationships,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodebaseAttributes {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cve_scan: Option<bool>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CodebaseRelationships {
    pub space: Relationship,
}

#[derive(Debug, Serialize)]
pub struct Relationship {
    pub data: ResourceRef,
}

#[derive(Debug, Serialize)]
pub struct ResourceRef {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: &'static str,
}

impl From<Codebase> for CodebaseResource {
    fn from(codebase: Codebase) -> Self {
        Self {
            id: codebase.id,
            resource_type: CODEBASE_RESOURCE_TYPE,
            attributes: CodebaseAttributes {
                url: codebase.url,
                stack_id: codebase.stack_id,
                kind: codebase.kind,
                cve_scan: codebase.cve_scan,
                created_at: codebase.created_at,
            },
            relationships: CodebaseRelationships {
                space: Relationship {
                    data: ResourceRef {
                        id: codebase.space_id,
                        resource_type: SPACE_RESOURCE_TYPE,
                    },
                },
            },
        }
    }
}
