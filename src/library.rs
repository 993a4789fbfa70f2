use std::sync::Arc;

use tracing::debug;

use crate::db::query::{self, MediaStore};
use crate::db::{cursor, selection};
use crate::error::{LibraryError, Result};
use crate::models::asset::{Album, Edge, Page};
use crate::models::filter::{AssetKind, IncludeSet, PageRequest};
use crate::pipeline::{enrich, page, MediaProbe};

/// Entry point for photo pages and album listings.
///
/// Holds no per-request state; clones share the store and probe.
#[derive(Clone)]
pub struct MediaLibrary {
    store: Arc<dyn MediaStore>,
    probe: Arc<dyn MediaProbe>,
}

impl MediaLibrary {
    pub fn new(store: Arc<dyn MediaStore>, probe: Arc<dyn MediaProbe>) -> Self {
        Self { store, probe }
    }

    /// Fetch, enrich and assemble one page on the calling thread.
    pub fn get_photos_blocking(&self, req: &PageRequest) -> Result<Page> {
        req.validate()?;
        let offset = cursor::decode(req.cursor.as_deref())?;
        let selection = selection::compile(&req.filter)?;

        let rows = query::fetch_with_lookahead(self.store.as_ref(), &selection, offset, req.page_size)?;
        let fetched = rows.len();
        let nodes = enrich::enrich_batch(self.probe.as_ref(), &rows, req.page_size, &req.include);
        debug!(offset, page_size = req.page_size, fetched, returned = nodes.len(), "assembled photo page");
        Ok(page::assemble(nodes, fetched, offset, req.page_size))
    }

    pub fn get_albums_blocking(&self, kind: AssetKind) -> Result<Vec<Album>> {
        let selection = selection::compile_kind(kind);
        let names = self.store.bucket_names(&selection)?;
        let albums = query::group_albums(names);
        debug!(kind = %kind, albums = albums.len(), "listed albums");
        Ok(albums)
    }

    /// One asset by catalog id, enriched like a page node. A requested size or
    /// duration that cannot be read fails the call instead of dropping the row.
    pub fn get_photo_by_id_blocking(&self, id: &str, include: &IncludeSet) -> Result<Edge> {
        let not_found = || LibraryError::NotFound(id.to_string());
        let key: i64 = id.trim().parse().map_err(|_| not_found())?;
        let row = self.store.fetch_by_id(key)?.ok_or_else(not_found)?;
        let node = enrich::derive_node(self.probe.as_ref(), &row, include)
            .map_err(|e| LibraryError::AssetUnavailable { id: id.to_string(), reason: e.to_string() })?;
        Ok(Edge { node })
    }

    /// Like [`get_photos_blocking`](Self::get_photos_blocking), on a blocking
    /// worker. Malformed requests are rejected before the worker is spawned.
    pub async fn get_photos(&self, req: PageRequest) -> Result<Page> {
        req.validate()?;
        cursor::decode(req.cursor.as_deref())?;
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.get_photos_blocking(&req))
            .await
            .map_err(|e| LibraryError::StoreUnavailable(format!("worker failed: {}", e)))?
    }

    pub async fn get_photo_by_id(&self, id: String, include: IncludeSet) -> Result<Edge> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.get_photo_by_id_blocking(&id, &include))
            .await
            .map_err(|e| LibraryError::StoreUnavailable(format!("worker failed: {}", e)))?
    }

    pub async fn get_albums(&self, kind: AssetKind) -> Result<Vec<Album>> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.get_albums_blocking(kind))
            .await
            .map_err(|e| LibraryError::StoreUnavailable(format!("worker failed: {}", e)))?
    }
}
