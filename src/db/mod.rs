pub mod cursor;
pub mod ingest;
pub mod query;
pub mod schema;
pub mod selection;

use anyhow::Result;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;

pub type DbPool = r2d2::Pool<SqliteConnectionManager>;

pub fn open_or_create<P: AsRef<Path>>(db_path: P) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    schema::apply_pragmas(&conn)?;
    schema::apply_schema(&conn)?;
    Ok(conn)
}

/// Pool of catalog connections. The schema is applied once through the first
/// connection handed out.
pub fn create_pool<P: AsRef<Path>>(db_path: P, size: u32) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(db_path.as_ref()).with_init(|c| {
        c.pragma_update(None, "journal_mode", "WAL")?;
        c.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(())
    });
    let pool = r2d2::Pool::builder().max_size(size.max(1)).build(manager)?;
    {
        let conn = pool.get()?;
        schema::apply_schema(&conn)?;
    }
    Ok(pool)
}
