use anyhow::Result;
use rusqlite::{params, Connection};
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::models::asset::{MEDIA_TYPE_IMAGE, MEDIA_TYPE_VIDEO};

/// A catalog row to insert or refresh, keyed by `path`.
#[derive(Clone, Debug, Default)]
pub struct NewMedia {
    pub media_type: i64,
    pub mime_type: Option<String>,
    pub bucket: Option<String>,
    pub date_taken: Option<i64>,
    pub date_added: i64,
    pub date_modified: i64,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub size: i64,
    pub path: String,
    pub orientation: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub indexed: usize,
    pub skipped: usize,
}

/// Upsert one row and return its id. A known path keeps its id and date_added.
pub fn upsert_media(conn: &Connection, m: &NewMedia) -> Result<i64> {
    let id = conn.query_row(
        "INSERT INTO media (media_type, mime_type, bucket_display_name, date_taken, date_added, date_modified,
                            width, height, size, data, orientation)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT(data) DO UPDATE SET
           media_type = excluded.media_type,
           mime_type = excluded.mime_type,
           bucket_display_name = excluded.bucket_display_name,
           date_taken = excluded.date_taken,
           date_modified = excluded.date_modified,
           width = excluded.width,
           height = excluded.height,
           size = excluded.size,
           orientation = excluded.orientation
         RETURNING id",
        params![
            m.media_type,
            m.mime_type,
            m.bucket,
            m.date_taken,
            m.date_added,
            m.date_modified,
            m.width,
            m.height,
            m.size,
            m.path,
            m.orientation
        ],
        |r| r.get(0),
    )?;
    Ok(id)
}

fn is_hidden(p: &Path) -> bool {
    p.file_name()
        .and_then(|s| s.to_str())
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

/// Build a catalog row from filesystem metadata. Non-media files yield `None`.
pub fn media_from_path(path: &Path, md: &fs::Metadata, now_secs: i64) -> Option<NewMedia> {
    if !md.is_file() {
        return None;
    }
    let mime = mime_guess::from_path(path).first()?;
    let media_type = match mime.type_().as_str() {
        "image" => MEDIA_TYPE_IMAGE,
        "video" => MEDIA_TYPE_VIDEO,
        _ => return None,
    };
    let date_modified = md
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(now_secs);
    let bucket = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|s| s.to_str())
        .map(|s| s.to_string());

    Some(NewMedia {
        media_type,
        mime_type: Some(mime.essence_str().to_string()),
        bucket,
        date_taken: None,
        date_added: now_secs,
        date_modified,
        width: None,
        height: None,
        size: md.len() as i64,
        path: path.to_string_lossy().to_string(),
        orientation: None,
    })
}

/// Walk `root` and upsert every image and video found. Hidden entries are skipped.
pub fn index_directory(conn: &mut Connection, root: &Path) -> Result<IngestSummary> {
    let now = chrono::Utc::now().timestamp();
    let mut summary = IngestSummary::default();
    let tx = conn.transaction()?;
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()));
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                summary.skipped += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let md = match entry.metadata() {
            Ok(md) => md,
            Err(_) => {
                summary.skipped += 1;
                continue;
            }
        };
        match media_from_path(entry.path(), &md, now) {
            Some(m) => {
                upsert_media(&tx, &m)?;
                summary.indexed += 1;
            }
            None => summary.skipped += 1,
        }
    }
    tx.commit()?;
    info!(root = %root.display(), indexed = summary.indexed, skipped = summary.skipped, "catalog ingest finished");
    Ok(summary)
}
