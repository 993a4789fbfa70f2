use anyhow::Result;
use rusqlite::Connection;

pub fn apply_pragmas(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    Ok(())
}

pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS media (
  id INTEGER PRIMARY KEY,
  media_type INTEGER NOT NULL,
  mime_type TEXT,
  bucket_display_name TEXT,
  date_taken INTEGER,
  date_added INTEGER NOT NULL,
  date_modified INTEGER NOT NULL,
  width INTEGER,
  height INTEGER,
  size INTEGER NOT NULL DEFAULT 0,
  data TEXT NOT NULL UNIQUE,
  orientation INTEGER
);

CREATE INDEX IF NOT EXISTS idx_media_bucket ON media(bucket_display_name);
CREATE INDEX IF NOT EXISTS idx_media_type ON media(media_type);
CREATE INDEX IF NOT EXISTS idx_media_mime ON media(mime_type);
DROP INDEX IF EXISTS idx_media_sort;
CREATE INDEX IF NOT EXISTS idx_media_recent
  ON media(COALESCE(date_taken, date_added * 1000) DESC, date_modified DESC, id DESC);
    "#,
    )?;

    // Catalogs created before orientation was tracked lack the column
    let mut stmt = conn.prepare("PRAGMA table_info(media)")?;
    let mut has_orientation = false;
    {
        let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
        for name in rows {
            if name.unwrap_or_default() == "orientation" {
                has_orientation = true;
                break;
            }
        }
    }
    if !has_orientation {
        conn.execute("ALTER TABLE media ADD COLUMN orientation INTEGER", [])?;
    }
    Ok(())
}
