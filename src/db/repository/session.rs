use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use uuid::Uuid;

use super::parse_uuid_column;
use crate::db::DatabaseError;
use crate::models::AppRole;

/// SQLite `datetime('now')` compatible timestamp format (UTC).
const SQLITE_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

/// Identity resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub role: AppRole,
}

/// SHA-256 of a bearer token. Only hashes are stored.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Issue a new session token for `user_id`, valid for `ttl`.
pub fn create_session(
    conn: &Connection,
    user_id: &Uuid,
    ttl: chrono::Duration,
) -> Result<String, DatabaseError> {
    let token = generate_token();
    let expires_at = (chrono::Utc::now() + ttl).format(SQLITE_DATETIME).to_string();
    conn.execute(
        "INSERT INTO sessions (token_hash, user_id, expires_at) VALUES (?1, ?2, ?3)",
        params![hash_token(&token).to_vec(), user_id.to_string(), expires_at],
    )?;
    Ok(token)
}

/// Resolve a bearer token to its user and role.
///
/// `None` for unknown or expired tokens, and for users without a role.
pub fn resolve_session(conn: &Connection, token: &str) -> Result<Option<SessionUser>, DatabaseError> {
    let row: Option<(String, Option<String>)> = conn
        .query_row(
            "SELECT s.user_id, r.role
             FROM sessions s
             LEFT JOIN user_roles r ON r.user_id = s.user_id
             WHERE s.token_hash = ?1 AND s.expires_at > datetime('now')",
            params![hash_token(token).to_vec()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((user_id, Some(role))) = row else {
        return Ok(None);
    };

    Ok(Some(SessionUser {
        user_id: parse_uuid_column("sessions.user_id", &user_id)?,
        role: role.parse()?,
    }))
}

pub fn revoke_session(conn: &Connection, token: &str) -> Result<bool, DatabaseError> {
    let removed = conn.execute(
        "DELETE FROM sessions WHERE token_hash = ?1",
        params![hash_token(token).to_vec()],
    )?;
    Ok(removed > 0)
}
