// 📐 Schema Manager - the two-table store and its rebuild policy
// The store is rebuilt wholesale on each run; the only question is how the
// previous contents are cleared, and that is one configurable policy rather
// than divergent code paths.

use crate::error::{Result, TrackerError};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How the previous store contents are cleared before repopulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RebuildPolicy {
    /// Drop and recreate the tables inside the existing store file.
    /// The connection can stay open across the rebuild, and a failed commit
    /// rolls back to the previous contents.
    #[default]
    InPlace,

    /// Delete the store file before recreating it, guaranteeing no stale
    /// schema or connection-cache artifacts survive. Fails with StoreLocked
    /// when another process holds the file, before anything is destroyed.
    /// Trade-off: a failure after deletion leaves the store empty.
    FileReset,
}

impl RebuildPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            RebuildPolicy::InPlace => "in-place",
            RebuildPolicy::FileReset => "file-reset",
        }
    }
}

/// Open the store connection, applying the destructive half of the
/// file-reset policy first. Deletion failure (other than the file simply
/// not existing) aborts the rebuild with no side effects.
pub fn open_store(path: &Path, policy: RebuildPolicy) -> Result<Connection> {
    if policy == RebuildPolicy::FileReset {
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(TrackerError::StoreLocked {
                    path: path.to_path_buf(),
                    cause: e,
                });
            }
        }
    }

    let conn = Connection::open(path)?;
    configure_connection(&conn)?;

    Ok(conn)
}

/// Connection pragmas shared by the writer and any read session
pub fn configure_connection(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    Ok(())
}

/// Create the two-table schema if it does not exist. Idempotent: repeated
/// invocation never accumulates duplicate schema objects.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS Characters (
            CharacterID INTEGER PRIMARY KEY AUTOINCREMENT,
            Name TEXT UNIQUE NOT NULL,
            Element TEXT NOT NULL,
            ReleaseVersion TEXT NOT NULL,
            IconUrl TEXT NOT NULL DEFAULT ''
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS BannerHistory (
            BannerID INTEGER PRIMARY KEY AUTOINCREMENT,
            CharacterID INTEGER NOT NULL,
            StartDate TEXT NOT NULL,
            EndDate TEXT NOT NULL,
            FOREIGN KEY(CharacterID) REFERENCES Characters(CharacterID)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_banner_character ON BannerHistory(CharacterID)",
        [],
    )?;

    Ok(())
}

/// Drop both tables, children first. Used inside the commit transaction so
/// an in-place rebuild that fails mid-way rolls back to the old contents.
pub fn reset_tables(conn: &Connection) -> Result<()> {
    conn.execute("DROP TABLE IF EXISTS BannerHistory", [])?;
    conn.execute("DROP TABLE IF EXISTS Characters", [])?;

    Ok(())
}
