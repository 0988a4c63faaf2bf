//! Comment store schema migrations.
//!
//! # Invariants
//! - Steps are listed in strictly increasing version order.
//! - All pending steps commit together or not at all.
//! - The last applied version is mirrored to `PRAGMA user_version`.

use crate::db::{DbError, DbResult};
use log::debug;
use rusqlite::Connection;

/// One schema step.
struct Step {
    version: u32,
    sql: &'static str,
}

const STEPS: &[Step] = &[
    Step {
        version: 1,
        sql: include_str!("0001_comments.sql"),
    },
    Step {
        version: 2,
        sql: include_str!("0002_comment_attachments.sql"),
    },
];

/// Version range moved by one `apply_migrations` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationSummary {
    pub from: u32,
    pub to: u32,
}

impl MigrationSummary {
    pub fn applied_any(&self) -> bool {
        self.from != self.to
    }
}

/// Newest schema version this build understands.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |step| step.version)
}

/// Reads `PRAGMA user_version`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}

/// Brings `conn` up to `latest_version()`.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file was written by a newer build.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<MigrationSummary> {
    let from = schema_version(conn)?;
    let to = latest_version();
    if from > to {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: to,
        });
    }

    let pending = STEPS.iter().filter(|step| step.version > from);
    let tx = conn.transaction()?;
    for step in pending {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        debug!(
            "event=db_migrate module=db status=applied version={}",
            step.version
        );
    }
    tx.commit()?;

    Ok(MigrationSummary { from, to })
}
