//! Local credential store: one SQLite table of users with Argon2id password
//! hashes.
//!
//! Registration inserts a row and reports [`AnalyzerError::UsernameExists`]
//! when the insert fails for any reason. Login looks the user up by exact
//! username, then verifies the password against the stored PHC string; an
//! unknown user and a wrong password both yield
//! [`AnalyzerError::InvalidCredentials`]. An unknown user is still verified
//! against a throwaway hash so both failures take the same time.

use crate::error::AnalyzerError;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use once_cell::sync::Lazy;
use rand_core::OsRng;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default database file, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "users.db";

/// Hash checked when the username is unknown. `None` only if hashing
/// itself failed, in which case the mismatch is returned without the work.
static UNKNOWN_USER_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password("legalyze:unknown-user").ok());

/// A registered user, without the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    /// Unix seconds.
    pub created_at: i64,
}

pub struct CredentialStore {
    conn: Mutex<Connection>,
    path: String,
}

impl CredentialStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AnalyzerError> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let conn = Connection::open(&path)?;
        let store = CredentialStore {
            conn: Mutex::new(conn),
            path: path_str,
        };
        store.init()?;
        debug!("Credential store opened at {}", store.path);
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, AnalyzerError> {
        let conn = Connection::open_in_memory()?;
        let store = CredentialStore {
            conn: Mutex::new(conn),
            path: ":memory:".to_string(),
        };
        store.init()?;
        Ok(store)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, AnalyzerError> {
        self.conn
            .lock()
            .map_err(|_| AnalyzerError::Internal("credential store lock poisoned".into()))
    }

    fn init(&self) -> Result<(), AnalyzerError> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            ",
        )?;
        Lazy::force(&UNKNOWN_USER_HASH);
        Ok(())
    }

    /// Create a new account.
    pub fn register(&self, username: &str, password: &str) -> Result<UserRecord, AnalyzerError> {
        check_not_blank(username, password)?;

        let password_hash = hash_password(password)?;
        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            created_at: unix_now(),
        };

        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT INTO users (id, username, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![record.id, record.username, password_hash, record.created_at],
        );
        match inserted {
            Ok(_) => {
                info!("Registered user '{}'", record.username);
                Ok(record)
            }
            Err(e) => {
                warn!("Registration of '{}' rejected: {}", username, e);
                Err(AnalyzerError::UsernameExists)
            }
        }
    }

    /// Check a username/password pair.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<UserRecord, AnalyzerError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AnalyzerError::InvalidCredentials);
        }

        let row = {
            let conn = self.lock()?;
            conn.query_row(
                "SELECT id, username, password_hash, created_at FROM users WHERE username = ?1",
                params![username],
                |row| {
                    Ok((
                        UserRecord {
                            id: row.get(0)?,
                            username: row.get(1)?,
                            created_at: row.get(3)?,
                        },
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?
        };

        match row {
            Some((record, stored_hash)) if verify_password(password, &stored_hash) => {
                debug!("User '{}' authenticated", username);
                Ok(record)
            }
            None => {
                verify_unknown_user(password);
                debug!("Authentication failed for '{}'", username);
                Err(AnalyzerError::InvalidCredentials)
            }
            Some(_) => {
                debug!("Authentication failed for '{}'", username);
                Err(AnalyzerError::InvalidCredentials)
            }
        }
    }

    /// Number of registered users.
    pub fn user_count(&self) -> Result<usize, AnalyzerError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn check_not_blank(username: &str, password: &str) -> Result<(), AnalyzerError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(AnalyzerError::EmptyCredentials);
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, AnalyzerError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AnalyzerError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Run the same Argon2 verification a known user would get. Always a
/// mismatch.
fn verify_unknown_user(password: &str) -> bool {
    if let Some(dummy) = UNKNOWN_USER_HASH.as_deref() {
        verify_password(password, dummy);
    }
    false
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
