//! Comment repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist row comments and their attachment references.
//! - Reload comments for rows as pages enter the grid window.
//!
//! # Invariants
//! - Write paths call `Comment::validate()` before SQL mutations.
//! - A comment and its attachments are written in one transaction.
//! - Per-row lists are ordered oldest first (insertion order on ties).
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::comment::{Attachment, Comment, CommentId, CommentValidationError};
use crate::model::row::RowId;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row as SqlRow};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const COMMENT_SELECT_SQL: &str = "SELECT
    comment_uuid,
    row_id,
    body,
    created_at
FROM comments";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for comment persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(CommentValidationError),
    Db(DbError),
    DuplicateComment(CommentId),
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateComment(id) => write!(f, "comment already stored: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted comment data: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "comment store is missing table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CommentValidationError> for RepoError {
    fn from(value: CommentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for row comments.
pub trait CommentRepository {
    /// Stores one comment with its attachments.
    fn add_comment(&mut self, comment: &Comment) -> RepoResult<()>;
    /// Lists comments for one row, oldest first.
    fn list_for_row(&self, row_id: RowId) -> RepoResult<Vec<Comment>>;
    /// Lists comments for many rows. Rows without comments are omitted.
    fn list_for_rows(&self, row_ids: &[RowId]) -> RepoResult<BTreeMap<RowId, Vec<Comment>>>;
    /// Counts comments stored for one row.
    fn count_for_row(&self, row_id: RowId) -> RepoResult<u32>;
}

/// SQLite-backed comment repository owning its connection.
#[derive(Debug)]
pub struct SqliteCommentRepository {
    conn: Connection,
}

impl SqliteCommentRepository {
    /// Wraps a migrated connection after checking required tables exist.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        for table in ["comments", "comment_attachments"] {
            if !table_exists(&conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }
        Ok(Self { conn })
    }

    /// Underlying connection, mainly for diagnostics and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn load_comments(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Comment>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            let mut comment = parse_comment_row(row)?;
            comment.attachments = load_attachments(&self.conn, &comment.id.to_string())?;
            comment.validate()?;
            comments.push(comment);
        }
        Ok(comments)
    }
}

impl CommentRepository for SqliteCommentRepository {
    fn add_comment(&mut self, comment: &Comment) -> RepoResult<()> {
        comment.validate()?;

        let comment_uuid = comment.id.to_string();
        let tx = self.conn.transaction()?;
        let exists: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM comments WHERE comment_uuid = ?1);",
            [comment_uuid.as_str()],
            |row| row.get(0),
        )?;
        if exists == 1 {
            return Err(RepoError::DuplicateComment(comment.id));
        }

        tx.execute(
            "INSERT INTO comments (comment_uuid, row_id, body, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                comment_uuid.as_str(),
                i64::from(comment.row_id),
                comment.text.as_str(),
                comment.created_at,
            ],
        )?;
        for (position, attachment) in comment.attachments.iter().enumerate() {
            tx.execute(
                "INSERT INTO comment_attachments (comment_uuid, position, file_name)
                 VALUES (?1, ?2, ?3);",
                params![
                    comment_uuid.as_str(),
                    position as i64,
                    attachment.file_name.as_str()
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn list_for_row(&self, row_id: RowId) -> RepoResult<Vec<Comment>> {
        self.load_comments(
            &format!(
                "{COMMENT_SELECT_SQL}
                 WHERE row_id = ?
                 ORDER BY created_at ASC, rowid ASC;"
            ),
            vec![Value::Integer(i64::from(row_id))],
        )
    }

    fn list_for_rows(&self, row_ids: &[RowId]) -> RepoResult<BTreeMap<RowId, Vec<Comment>>> {
        let mut grouped: BTreeMap<RowId, Vec<Comment>> = BTreeMap::new();
        if row_ids.is_empty() {
            return Ok(grouped);
        }

        let placeholders = vec!["?"; row_ids.len()].join(", ");
        let bind_values = row_ids
            .iter()
            .map(|row_id| Value::Integer(i64::from(*row_id)))
            .collect::<Vec<_>>();
        let comments = self.load_comments(
            &format!(
                "{COMMENT_SELECT_SQL}
                 WHERE row_id IN ({placeholders})
                 ORDER BY row_id ASC, created_at ASC, rowid ASC;"
            ),
            bind_values,
        )?;
        for comment in comments {
            grouped.entry(comment.row_id).or_default().push(comment);
        }
        Ok(grouped)
    }

    fn count_for_row(&self, row_id: RowId) -> RepoResult<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM comments WHERE row_id = ?1;",
            [i64::from(row_id)],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn parse_comment_row(row: &SqlRow<'_>) -> RepoResult<Comment> {
    let uuid_text: String = row.get("comment_uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{uuid_text}` in comments.comment_uuid"
        ))
    })?;

    let raw_row_id: i64 = row.get("row_id")?;
    let row_id = RowId::try_from(raw_row_id).map_err(|_| {
        RepoError::InvalidData(format!("invalid row id `{raw_row_id}` in comments.row_id"))
    })?;

    Ok(Comment {
        id,
        row_id,
        text: row.get("body")?,
        created_at: row.get("created_at")?,
        attachments: Vec::new(),
    })
}

fn load_attachments(conn: &Connection, comment_uuid: &str) -> RepoResult<Vec<Attachment>> {
    let mut stmt = conn.prepare(
        "SELECT file_name
         FROM comment_attachments
         WHERE comment_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([comment_uuid])?;
    let mut attachments = Vec::new();
    while let Some(row) = rows.next()? {
        attachments.push(Attachment {
            file_name: row.get(0)?,
        });
    }
    Ok(attachments)
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
