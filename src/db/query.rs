use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use rusqlite::types::{ToSqlOutput, Value};
use rusqlite::{Connection, ErrorCode, OpenFlags, OptionalExtension, Row, ToSql};
use tracing::debug;

use crate::db::selection::{Param, Selection};
use crate::db::DbPool;
use crate::error::{LibraryError, Result};
use crate::models::asset::{Album, RawRow};

/// Read-only access to the media catalog.
pub trait MediaStore: Send + Sync {
    /// Rows matching `selection`, in its sort order, skipping `offset` and
    /// returning at most `limit`.
    fn fetch_rows(&self, selection: &Selection, offset: u64, limit: usize) -> Result<Vec<RawRow>>;

    /// Bucket name of every row matching `selection`.
    fn bucket_names(&self, selection: &Selection) -> Result<Vec<Option<String>>>;

    /// A single row by catalog id, regardless of kind.
    fn fetch_by_id(&self, id: i64) -> Result<Option<RawRow>>;
}

impl ToSql for Param {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Param::Text(s) => ToSqlOutput::Owned(Value::Text(s.clone())),
            Param::Int(i) => ToSqlOutput::Owned(Value::Integer(*i)),
        })
    }
}

pub fn classify_error(err: &rusqlite::Error) -> LibraryError {
    match err.sqlite_error_code() {
        Some(ErrorCode::PermissionDenied)
        | Some(ErrorCode::AuthorizationForStatementDenied)
        | Some(ErrorCode::ReadOnly)
        | Some(ErrorCode::CannotOpen) => LibraryError::PermissionDenied(err.to_string()),
        _ => LibraryError::StoreUnavailable(err.to_string()),
    }
}

const ROW_COLUMNS: &str =
    "id, mime_type, bucket_display_name, date_taken, date_added, date_modified, width, height, size, data, orientation";

fn row_to_raw(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        id: row.get("id")?,
        mime_type: row.get("mime_type")?,
        bucket: row.get("bucket_display_name")?,
        date_taken: row.get("date_taken")?,
        date_added: row.get("date_added")?,
        date_modified: row.get("date_modified")?,
        width: row.get("width")?,
        height: row.get("height")?,
        size: row.get("size")?,
        path: row.get("data")?,
        orientation: row.get("orientation")?,
    })
}

pub fn select_rows(conn: &Connection, selection: &Selection, offset: u64, limit: usize) -> rusqlite::Result<Vec<RawRow>> {
    let sql = format!(
        "SELECT {} FROM media WHERE {} ORDER BY {} LIMIT ? OFFSET ?",
        ROW_COLUMNS,
        selection.where_sql(),
        selection.order_sql()
    );
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let offset = i64::try_from(offset).unwrap_or(i64::MAX);
    let mut args: Vec<&dyn ToSql> = selection.params.iter().map(|p| p as &dyn ToSql).collect();
    args.push(&limit);
    args.push(&offset);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(args.as_slice(), row_to_raw)?.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn select_bucket_names(conn: &Connection, selection: &Selection) -> rusqlite::Result<Vec<Option<String>>> {
    let sql = format!("SELECT bucket_display_name FROM media WHERE {}", selection.where_sql());
    let mut stmt = conn.prepare(&sql)?;
    let args: Vec<&dyn ToSql> = selection.params.iter().map(|p| p as &dyn ToSql).collect();
    let names = stmt.query_map(args.as_slice(), |r| r.get(0))?.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

pub fn select_row_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<RawRow>> {
    let sql = format!("SELECT {} FROM media WHERE id = ?", ROW_COLUMNS);
    conn.query_row(&sql, [id], row_to_raw).optional()
}

pub fn count_media(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM media", [], |r| r.get(0))
}

/// Catalog backed by a pool of SQLite connections. Each call checks out one
/// connection and returns it when the call ends, whatever the outcome.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
    db_path: PathBuf,
}

impl SqliteStore {
    pub fn new(pool: DbPool, db_path: impl Into<PathBuf>) -> Self {
        Self { pool, db_path: db_path.into() }
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T> {
        let conn = self.pool.get().map_err(|e| checkout_error(&self.db_path, &e))?;
        f(&conn).map_err(|e| classify_error(&e))
    }
}

/// The pool only keeps the message of a failed connect, so reopen the catalog
/// once to learn whether access was refused.
fn checkout_error(db_path: &Path, err: &r2d2::Error) -> LibraryError {
    if !db_path.exists() {
        return LibraryError::StoreUnavailable(format!("catalog {} is missing", db_path.display()));
    }
    if let Err(e) = std::fs::File::open(db_path) {
        if e.kind() == io::ErrorKind::PermissionDenied {
            return LibraryError::PermissionDenied(format!("{}: {}", db_path.display(), e));
        }
    }
    match Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_WRITE) {
        Err(e) => classify_error(&e),
        Ok(_) => LibraryError::StoreUnavailable(format!("Pool error: {}", err)),
    }
}

impl MediaStore for SqliteStore {
    fn fetch_rows(&self, selection: &Selection, offset: u64, limit: usize) -> Result<Vec<RawRow>> {
        let rows = self.with_conn(|c| select_rows(c, selection, offset, limit))?;
        debug!(offset, limit, fetched = rows.len(), "fetched media rows");
        Ok(rows)
    }

    fn bucket_names(&self, selection: &Selection) -> Result<Vec<Option<String>>> {
        self.with_conn(|c| select_bucket_names(c, selection))
    }

    fn fetch_by_id(&self, id: i64) -> Result<Option<RawRow>> {
        self.with_conn(|c| select_row_by_id(c, id))
    }
}

/// Fetch one page worth of rows plus a single look-ahead row.
pub fn fetch_with_lookahead(
    store: &dyn MediaStore,
    selection: &Selection,
    offset: u64,
    page_size: usize,
) -> Result<Vec<RawRow>> {
    store.fetch_rows(selection, offset, page_size.saturating_add(1))
}

/// Group bucket names and count them. Rows without a bucket are not counted.
pub fn group_albums<I>(names: I) -> Vec<Album>
where
    I: IntoIterator<Item = Option<String>>,
{
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for name in names.into_iter().flatten() {
        *counts.entry(name).or_insert(0) += 1;
    }
    counts.into_iter().map(|(title, count)| Album { title, count }).collect()
}
