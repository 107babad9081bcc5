mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Identity operations
    fn create_identity(&self, identity: &Identity) -> Result<()>;
    fn get_identity(&self, id: &str) -> Result<Option<Identity>>;
    fn get_identity_by_username(&self, username: &str) -> Result<Option<Identity>>;
    fn list_identities(&self, cursor: &str, limit: i32) -> Result<Vec<Identity>>;
    fn delete_identity(&self, id: &str) -> Result<bool>;

    // Token operations
    fn create_token(&self, token: &Token) -> Result<()>;
    fn get_token_by_id(&self, id: &str) -> Result<Option<Token>>;
    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>>;
    fn list_tokens(&self, cursor: &str, limit: i32) -> Result<Vec<Token>>;
    fn list_identity_tokens(&self, identity_id: &str) -> Result<Vec<Token>>;
    fn delete_token(&self, id: &str) -> Result<bool>;
    fn update_token_last_used(&self, id: &str) -> Result<()>;

    // Space operations
    fn create_space(&self, space: &Space) -> Result<()>;
    fn get_space(&self, id: &str) -> Result<Option<Space>>;
    fn list_spaces(&self, offset: i64, limit: i64) -> Result<Vec<Space>>;
    fn count_spaces(&self) -> Result<i64>;

    // Codebase operations

    /// Inserts a codebase. Fails with `NotFound` if the space is missing and
    /// `AlreadyExists` if the space already holds the same URL.
    fn create_codebase(&self, codebase: &Codebase) -> Result<()>;
    fn get_codebase(&self, id: &str) -> Result<Option<Codebase>>;
    /// Lists a space's codebases in insertion order.
    fn list_codebases(&self, space_id: &str, offset: i64, limit: i64) -> Result<Vec<Codebase>>;
    fn count_codebases(&self, space_id: &str) -> Result<i64>;
    fn set_codebase_cve_scan(&self, id: &str, cve_scan: bool) -> Result<()>;

    // Admin token check
    fn has_admin_token(&self) -> Result<bool>;
}
