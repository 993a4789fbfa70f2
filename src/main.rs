use std::net::SocketAddr;
use std::sync::Arc;

use camroll_backend_sqlite::db;
use camroll_backend_sqlite::pipeline::FsProbe;
use camroll_backend_sqlite::utils::config::Config;
use camroll_backend_sqlite::utils::logging;
use camroll_backend_sqlite::{AppPaths, AppState};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cfg = Config::from_env();
    let db_dir = cfg.data.join("db");
    std::fs::create_dir_all(&db_dir)?;
    let db_path = db_dir.join("camroll.db");
    let pool = db::create_pool(&db_path, cfg.db_pool_size)?;

    if cfg.index_on_start {
        let root = cfg.root.clone();
        let dbp = db_path.clone();
        tokio::spawn(async move {
            let res = tokio::task::spawn_blocking(move || -> anyhow::Result<db::ingest::IngestSummary> {
                let mut conn = db::open_or_create(&dbp)?;
                db::ingest::index_directory(&mut conn, &root)
            })
            .await;
            match res {
                Ok(Ok(summary)) => info!(indexed = summary.indexed, skipped = summary.skipped, "startup index complete"),
                Ok(Err(e)) => error!("startup index failed: {}", e),
                Err(e) => error!("startup index task panicked: {}", e),
            }
        });
    }

    let paths = AppPaths { root: cfg.root.clone(), data: cfg.data.clone(), db_path };
    let state = Arc::new(AppState::new(paths, pool, Arc::new(FsProbe::new(cfg.ffprobe.clone()))));

    let app = camroll_backend_sqlite::api::routes::router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
