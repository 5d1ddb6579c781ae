//! SQLite-backed store of submitted applications
//!
//! Each call opens its own connection, so every connection handler gets an
//! independent session. SQLite's database write lock serialises concurrent
//! inserts and the unique index on `registration_number` rejects duplicates;
//! the busy timeout makes writers wait for the lock instead of failing.

use crate::error::StoreError;
use crate::registration;
use intake_shared::Application;
use log::{debug, warn};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Registration numbers tried per save before giving up.
pub const MAX_SAVE_ATTEMPTS: u32 = 5;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS applicants (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        registration_number TEXT UNIQUE NOT NULL,
        name TEXT NOT NULL,
        address TEXT NOT NULL,
        educational_qualifications TEXT NOT NULL,
        course TEXT NOT NULL,
        start_year INTEGER NOT NULL,
        start_month TEXT NOT NULL,
        application_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    );
";

/// A persisted application as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredApplication {
    pub id: i64,
    pub registration_number: String,
    pub application: Application,
    /// `YYYY-MM-DD HH:MM:SS` in UTC, assigned by the database on insert.
    pub application_date: String,
}

/// Handle to the applications database. Cheap to clone; holds no open
/// connection.
#[derive(Debug, Clone)]
pub struct ApplicationStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl ApplicationStore {
    /// Opens (creating if needed) the database at `path` and ensures the
    /// schema exists. Existing records are left untouched.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Directory {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let store = Self {
            path,
            busy_timeout: BUSY_TIMEOUT,
        };

        let conn = store.connect()?;
        let journal_mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.execute_batch(SCHEMA)?;
        debug!(
            "Store ready at {} (journal mode {})",
            store.path.display(),
            journal_mode
        );

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }

    /// Persists `application` under a freshly generated registration number
    /// and returns that number.
    pub fn save(&self, application: &Application) -> Result<String, StoreError> {
        self.save_with(application, |app| {
            registration::generate(&app.course, app.start_year)
        })
    }

    /// Like [`save`](Self::save), drawing candidate numbers from `propose`.
    /// A candidate that collides with an existing number is discarded and a
    /// new one requested, up to [`MAX_SAVE_ATTEMPTS`] candidates in total.
    pub fn save_with<F>(&self, application: &Application, mut propose: F) -> Result<String, StoreError>
    where
        F: FnMut(&Application) -> String,
    {
        let conn = self.connect()?;

        for attempt in 1..=MAX_SAVE_ATTEMPTS {
            let candidate = propose(application);

            match insert(&conn, &candidate, application) {
                Ok(()) => {
                    debug!("Inserted applicant {} as {}", application.name, candidate);
                    return Ok(candidate);
                }
                Err(e) if is_registration_conflict(&e) => {
                    warn!(
                        "Registration number {} already taken (attempt {}/{}), regenerating",
                        candidate, attempt, MAX_SAVE_ATTEMPTS
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StoreError::IdentifierExhausted {
            attempts: MAX_SAVE_ATTEMPTS,
        })
    }

    /// Number of stored applications.
    pub fn count(&self) -> Result<u64, StoreError> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM applicants", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    pub fn find(&self, registration_number: &str) -> Result<Option<StoredApplication>, StoreError> {
        let conn = self.connect()?;
        let stored = conn
            .query_row(
                "SELECT id, registration_number, name, address, educational_qualifications,
                        course, start_year, start_month, application_date
                 FROM applicants WHERE registration_number = ?1",
                params![registration_number],
                |row| {
                    Ok(StoredApplication {
                        id: row.get(0)?,
                        registration_number: row.get(1)?,
                        application: Application {
                            name: row.get(2)?,
                            address: row.get(3)?,
                            educational_qualifications: row.get(4)?,
                            course: row.get(5)?,
                            start_year: row.get(6)?,
                            start_month: row.get(7)?,
                        },
                        application_date: row.get(8)?,
                    })
                },
            )
            .optional()?;
        Ok(stored)
    }
}

fn insert(
    conn: &Connection,
    registration_number: &str,
    application: &Application,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO applicants
            (registration_number, name, address, educational_qualifications,
             course, start_year, start_month)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            registration_number,
            application.name,
            application.address,
            application.educational_qualifications,
            application.course,
            application.start_year,
            application.start_month,
        ],
    )?;
    Ok(())
}

/// True only for a unique-index violation on `registration_number`.
fn is_registration_conflict(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, message) => {
            failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                && message
                    .as_deref()
                    .is_some_and(|m| m.contains("registration_number"))
        }
        _ => false,
    }
}
