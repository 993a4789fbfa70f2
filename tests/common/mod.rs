#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::serve;
use camroll_backend_sqlite::db;
use camroll_backend_sqlite::db::ingest::{upsert_media, NewMedia};
use camroll_backend_sqlite::models::asset::{MEDIA_TYPE_IMAGE, MEDIA_TYPE_VIDEO};
use camroll_backend_sqlite::pipeline::FsProbe;
use camroll_backend_sqlite::{AppPaths, AppState};
use rusqlite::Connection;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Temporary catalog plus a photos root to place fixture files in.
pub struct TestEnv {
    pub tmp: TempDir,
    pub root: PathBuf,
    pub db_path: PathBuf,
    pub conn: Connection,
}

pub fn setup_env() -> TestEnv {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("photos");
    std::fs::create_dir_all(&root).unwrap();
    let db_dir = tmp.path().join("db");
    std::fs::create_dir_all(&db_dir).unwrap();
    let db_path = db_dir.join("camroll.db");
    let conn = db::open_or_create(&db_path).unwrap();
    TestEnv { tmp, root, db_path, conn }
}

impl TestEnv {
    pub fn state(&self) -> Arc<AppState> {
        let pool = db::create_pool(&self.db_path, 4).unwrap();
        let paths = AppPaths { root: self.root.clone(), data: self.tmp.path().to_path_buf(), db_path: self.db_path.clone() };
        Arc::new(AppState::new(paths, pool, Arc::new(FsProbe::default())))
    }

    /// Write a real PNG of the given size under `root/<bucket>/<name>`.
    pub fn png(&self, bucket: &str, name: &str, w: u32, h: u32) -> PathBuf {
        let dir = self.root.join(bucket);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        image::RgbImage::new(w, h).save(&path).unwrap();
        path
    }

    /// Write bytes no decoder accepts.
    pub fn garbage(&self, bucket: &str, name: &str) -> PathBuf {
        let dir = self.root.join(bucket);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, b"definitely not an image").unwrap();
        path
    }

    pub fn insert(&self, m: &NewMedia) -> i64 {
        upsert_media(&self.conn, m).unwrap()
    }
}

/// Image row taken at `taken_ms` with no stored dimensions.
pub fn image_row(path: &Path, bucket: &str, taken_ms: i64) -> NewMedia {
    NewMedia {
        media_type: MEDIA_TYPE_IMAGE,
        mime_type: mime_guess::from_path(path).first().map(|m| m.essence_str().to_string()),
        bucket: Some(bucket.to_string()),
        date_taken: Some(taken_ms),
        date_added: taken_ms / 1000,
        date_modified: taken_ms / 1000,
        size: 1234,
        path: path.to_string_lossy().to_string(),
        ..Default::default()
    }
}

pub fn video_row(path: &str, bucket: &str, taken_ms: i64) -> NewMedia {
    NewMedia {
        media_type: MEDIA_TYPE_VIDEO,
        mime_type: Some("video/mp4".to_string()),
        bucket: Some(bucket.to_string()),
        date_taken: Some(taken_ms),
        date_added: taken_ms / 1000,
        date_modified: taken_ms / 1000,
        width: Some(1920),
        height: Some(1080),
        size: 10_000,
        path: path.to_string(),
        ..Default::default()
    }
}

/// Helper to make HTTP requests to test server
pub struct TestClient {
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestClient {
    pub fn new(port: u16) -> Self {
        Self { base_url: format!("http://127.0.0.1:{}", port), client: reqwest::Client::new() }
    }

    pub async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client.get(&format!("{}{}", self.base_url, path)).send().await
    }

    pub async fn post(&self, path: &str, json: &serde_json::Value) -> reqwest::Result<reqwest::Response> {
        self.client.post(&format!("{}{}", self.base_url, path)).json(json).send().await
    }
}

pub async fn spawn_server(state: Arc<AppState>) -> TestClient {
    let app = camroll_backend_sqlite::api::routes::router(state);
    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let listener = TcpListener::bind(&addr).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        serve(listener, app.into_make_service()).await.unwrap();
    });
    TestClient::new(port)
}
