use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

const CODEBASE_COLUMNS: &str = "id, space_id, url, stack_id, kind, cve_scan, created_at";
const SPACE_COLUMNS: &str = "id, name, description, owner_id, template_id, created_at, updated_at";
const TOKEN_COLUMNS: &str =
    "id, token_hash, token_lookup, is_admin, identity_id, created_at, expires_at, last_used_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Maps constraint failures on insert: foreign keys mean the parent row is
/// gone, anything else is a uniqueness clash.
fn map_insert_error(e: rusqlite::Error) -> Error {
    if let rusqlite::Error::SqliteFailure(err, _) = &e {
        if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY {
            return Error::NotFound;
        }
        if err.code == rusqlite::ErrorCode::ConstraintViolation {
            return Error::AlreadyExists;
        }
    }
    Error::from(e)
}

fn row_to_token(row: &Row<'_>) -> rusqlite::Result<Token> {
    Ok(Token {
        id: row.get(0)?,
        token_hash: row.get(1)?,
        token_lookup: row.get(2)?,
        is_admin: row.get(3)?,
        identity_id: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        expires_at: row.get::<_, Option<String>>(6)?.map(|s| parse_datetime(&s)),
        last_used_at: row.get::<_, Option<String>>(7)?.map(|s| parse_datetime(&s)),
    })
}

fn row_to_space(row: &Row<'_>) -> rusqlite::Result<Space> {
    Ok(Space {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        owner_id: row.get(3)?,
        template_id: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        updated_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn row_to_codebase(row: &Row<'_>) -> rusqlite::Result<Codebase> {
    Ok(Codebase {
        id: row.get(0)?,
        space_id: row.get(1)?,
        url: row.get(2)?,
        stack_id: row.get(3)?,
        kind: row.get(4)?,
        cve_scan: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Identity operations

    fn create_identity(&self, identity: &Identity) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO identities (id, username, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    identity.id,
                    identity.username,
                    format_datetime(&identity.created_at),
                    format_datetime(&identity.updated_at),
                ],
            )
            .map_err(map_insert_error)?;
        Ok(())
    }

    fn get_identity(&self, id: &str) -> Result<Option<Identity>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, username, created_at, updated_at FROM identities WHERE id = ?1",
            params![id],
            |row| {
                Ok(Identity {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    created_at: parse_datetime(&row.get::<_, String>(2)?),
                    updated_at: parse_datetime(&row.get::<_, String>(3)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_identity_by_username(&self, username: &str) -> Result<Option<Identity>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, username, created_at, updated_at FROM identities WHERE username = ?1",
            params![username],
            |row| {
                Ok(Identity {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    created_at: parse_datetime(&row.get::<_, String>(2)?),
                    updated_at: parse_datetime(&row.get::<_, String>(3)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_identities(&self, cursor: &str, limit: i32) -> Result<Vec<Identity>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, username, created_at, updated_at
             FROM identities WHERE id > ?1 ORDER BY id LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![cursor, limit], |row| {
            Ok(Identity {
                id: row.get(0)?,
                username: row.get(1)?,
                created_at: parse_datetime(&row.get::<_, String>(2)?),
                updated_at: parse_datetime(&row.get::<_, String>(3)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_identity(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM identities WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Token operations

    fn create_token(&self, token: &Token) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO tokens (id, token_hash, token_lookup, is_admin, identity_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                token.id,
                token.token_hash,
                token.token_lookup,
                token.is_admin,
                token.identity_id,
                format_datetime(&token.created_at),
                token.expires_at.as_ref().map(format_datetime),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) => match map_insert_error(e) {
                Error::AlreadyExists => Err(Error::TokenLookupCollision),
                other => Err(other),
            },
        }
    }

    fn get_token_by_id(&self, id: &str) -> Result<Option<Token>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE id = ?1"),
            params![id],
            row_to_token,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE token_lookup = ?1"),
            params![lookup],
            row_to_token,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_tokens(&self, cursor: &str, limit: i32) -> Result<Vec<Token>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens WHERE id > ?1 ORDER BY id LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![cursor, limit], row_to_token)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_identity_tokens(&self, identity_id: &str) -> Result<Vec<Token>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens WHERE identity_id = ?1 ORDER BY created_at"
        ))?;

        let rows = stmt.query_map(params![identity_id], row_to_token)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_token(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM tokens WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn update_token_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE tokens SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    // Space operations

    fn create_space(&self, space: &Space) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO spaces (id, name, description, owner_id, template_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    space.id,
                    space.name,
                    space.description,
                    space.owner_id,
                    space.template_id,
                    format_datetime(&space.created_at),
                    format_datetime(&space.updated_at),
                ],
            )
            .map_err(map_insert_error)?;
        Ok(())
    }

    fn get_space(&self, id: &str) -> Result<Option<Space>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {SPACE_COLUMNS} FROM spaces WHERE id = ?1"),
            params![id],
            row_to_space,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_spaces(&self, offset: i64, limit: i64) -> Result<Vec<Space>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SPACE_COLUMNS} FROM spaces ORDER BY rowid LIMIT ?1 OFFSET ?2"
        ))?;

        let rows = stmt.query_map(params![limit, offset], row_to_space)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn count_spaces(&self) -> Result<i64> {
        let conn = self.conn();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM spaces", [], |row| row.get(0))?;
        Ok(count)
    }

    // Codebase operations

    fn create_codebase(&self, codebase: &Codebase) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let space_exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM spaces WHERE id = ?1)",
            params![codebase.space_id],
            |row| row.get(0),
        )?;
        if !space_exists {
            return Err(Error::NotFound);
        }

        let duplicate: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM codebases WHERE space_id = ?1 AND url = ?2)",
            params![codebase.space_id, codebase.url],
            |row| row.get(0),
        )?;
        if duplicate {
            return Err(Error::AlreadyExists);
        }

        tx.execute(
            "INSERT INTO codebases (id, space_id, url, stack_id, kind, cve_scan, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                codebase.id,
                codebase.space_id,
                codebase.url,
                codebase.stack_id,
                codebase.kind,
                codebase.cve_scan,
                format_datetime(&codebase.created_at),
            ],
        )
        .map_err(map_insert_error)?;

        tx.commit()?;
        Ok(())
    }

    fn get_codebase(&self, id: &str) -> Result<Option<Codebase>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {CODEBASE_COLUMNS} FROM codebases WHERE id = ?1"),
            params![id],
            row_to_codebase,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_codebases(&self, space_id: &str, offset: i64, limit: i64) -> Result<Vec<Codebase>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CODEBASE_COLUMNS} FROM codebases
             WHERE space_id = ?1 ORDER BY rowid LIMIT ?2 OFFSET ?3"
        ))?;

        let rows = stmt.query_map(params![space_id, limit, offset], row_to_codebase)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn count_codebases(&self, space_id: &str) -> Result<i64> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM codebases WHERE space_id = ?1",
            params![space_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn set_codebase_cve_scan(&self, id: &str, cve_scan: bool) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE codebases SET cve_scan = ?1 WHERE id = ?2",
            params![cve_scan, id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn has_admin_token(&self) -> Result<bool> {
        let conn = self.conn();
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM tokens WHERE is_admin = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
