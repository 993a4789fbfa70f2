pub mod api;
pub mod db;
pub mod error;
pub mod library;
pub mod models;
pub mod pipeline;
pub mod utils;

use std::path::PathBuf;
use std::sync::Arc;

pub use error::{LibraryError, Result};
pub use library::MediaLibrary;

#[derive(Clone, Debug)]
pub struct AppPaths {
    pub root: PathBuf,
    pub data: PathBuf,
    pub db_path: PathBuf,
}

#[derive(Clone)]
pub struct AppState {
    pub started_at: std::time::Instant,
    pub paths: AppPaths,
    pub pool: db::DbPool,
    pub library: MediaLibrary,
}

impl AppState {
    /// State over a SQLite catalog, probing files with the given backend.
    pub fn new(paths: AppPaths, pool: db::DbPool, probe: Arc<dyn pipeline::MediaProbe>) -> Self {
        let store = Arc::new(db::query::SqliteStore::new(pool.clone(), paths.db_path.clone()));
        Self {
            started_at: std::time::Instant::now(),
            paths,
            pool,
            library: MediaLibrary::new(store, probe),
        }
    }
}
