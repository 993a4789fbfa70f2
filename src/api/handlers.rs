use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::LibraryError;
use crate::models::filter::{AssetKind, Filter, IncludeSet, PageRequest};
use crate::AppState;

/// Photo page request as marshalled by a client. List fields are arrays.
///
/// Numeric fields stay untyped until [`into_request`](Self::into_request) so a
/// bad value is reported against the field it came from.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotosBody {
    pub first: Option<JsonValue>,
    pub after: Option<String>,
    pub asset_type: Option<String>,
    pub group_name: Option<String>,
    pub mime_types: Option<Vec<String>>,
    pub from_time: Option<JsonValue>,
    pub to_time: Option<JsonValue>,
    pub include: Option<Vec<String>>,
}

fn scalar_text(v: &JsonValue) -> String {
    match v {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_page_size(v: Option<&JsonValue>) -> Result<usize, LibraryError> {
    let Some(v) = v else {
        return Err(LibraryError::InvalidPageSize("missing".to_string()));
    };
    let raw = scalar_text(v);
    let text = raw.trim();
    if let Ok(n) = text.parse::<usize>() {
        return Ok(n);
    }
    // JSON numbers may arrive as 10.0
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= usize::MAX as f64 => Ok(f as usize),
        _ => Err(LibraryError::InvalidPageSize(raw)),
    }
}

fn parse_time(name: &str, v: Option<&JsonValue>) -> Result<Option<i64>, LibraryError> {
    let Some(v) = v else { return Ok(None) };
    let raw = scalar_text(v);
    match raw.trim().parse::<f64>() {
        Ok(ms) if ms.is_finite() => Ok(Some(ms as i64)),
        _ => Err(LibraryError::InvalidFilter(format!("{} must be epoch milliseconds, got {:?}", name, raw))),
    }
}

impl PhotosBody {
    pub fn into_request(self) -> Result<PageRequest, LibraryError> {
        let asset_kind = match self.asset_type.as_deref() {
            None => AssetKind::All,
            Some(s) => s.parse()?,
        };
        let page_size = parse_page_size(self.first.as_ref())?;
        let filter = Filter {
            asset_kind,
            group_name: self.group_name,
            mime_types: self.mime_types,
            from_time: parse_time("fromTime", self.from_time.as_ref())?,
            to_time: parse_time("toTime", self.to_time.as_ref())?,
        };
        let include = IncludeSet::parse_lenient(self.include.iter().flatten().map(String::as_str));
        let req = PageRequest { filter, page_size, cursor: self.after, include };
        req.validate()?;
        Ok(req)
    }
}

/// Query-string form of [`PhotosBody`]; lists are comma separated.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotosQuery {
    pub first: Option<String>,
    pub after: Option<String>,
    pub asset_type: Option<String>,
    pub group_name: Option<String>,
    pub mime_types: Option<String>,
    pub from_time: Option<String>,
    pub to_time: Option<String>,
    pub include: Option<String>,
}

fn split_list(s: Option<String>) -> Option<Vec<String>> {
    s.map(|s| s.split(',').map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect())
}

impl From<PhotosQuery> for PhotosBody {
    fn from(q: PhotosQuery) -> Self {
        Self {
            first: q.first.map(JsonValue::String),
            after: q.after,
            asset_type: q.asset_type,
            group_name: q.group_name,
            mime_types: split_list(q.mime_types),
            from_time: q.from_time.map(JsonValue::String),
            to_time: q.to_time.map(JsonValue::String),
            include: split_list(q.include),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumsQuery {
    pub asset_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PhotoQuery {
    pub include: Option<String>,
}

pub fn error_response(e: LibraryError) -> Response {
    let status = match &e {
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        LibraryError::NotFound(_) => StatusCode::NOT_FOUND,
        LibraryError::AssetUnavailable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        LibraryError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    };
    if status.is_server_error() {
        tracing::error!("Error serving library request: {}", e);
    }
    (status, Json(serde_json::json!({ "code": e.code(), "message": e.to_string() }))).into_response()
}

fn malformed(detail: String) -> Response {
    error_response(LibraryError::InvalidFilter(detail))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let pool = state.pool.clone();
    let media_count = tokio::task::spawn_blocking(move || {
        let conn = pool.get().ok()?;
        crate::db::query::count_media(&conn).ok()
    })
    .await
    .ok()
    .flatten();
    let body = serde_json::json!({
        "status": if media_count.is_some() { "ok" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "media_count": media_count,
        "root": state.paths.root.to_string_lossy(),
    });
    (StatusCode::OK, Json(body))
}

async fn serve_photos(state: &AppState, body: PhotosBody) -> Response {
    let req = match body.into_request() {
        Ok(r) => r,
        Err(e) => return error_response(e),
    };
    match state.library.get_photos(req).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn photos(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PhotosQuery>, QueryRejection>,
) -> Response {
    match query {
        Ok(Query(q)) => serve_photos(&state, q.into()).await,
        Err(rejection) => malformed(rejection.body_text()),
    }
}

pub async fn photos_json(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PhotosBody>, JsonRejection>,
) -> Response {
    match body {
        Ok(Json(body)) => serve_photos(&state, body).await,
        Err(rejection) => malformed(rejection.body_text()),
    }
}

pub async fn photo_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    query: Result<Query<PhotoQuery>, QueryRejection>,
) -> Response {
    let include = match query {
        Ok(Query(q)) => IncludeSet::parse_lenient(q.include.as_deref().unwrap_or("").split(',')),
        Err(rejection) => return malformed(rejection.body_text()),
    };
    match state.library.get_photo_by_id(id, include).await {
        Ok(edge) => (StatusCode::OK, Json(edge)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn albums(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AlbumsQuery>, QueryRejection>,
) -> Response {
    let q = match query {
        Ok(Query(q)) => q,
        Err(rejection) => return malformed(rejection.body_text()),
    };
    let kind = match q.asset_type.as_deref() {
        None => AssetKind::All,
        Some(s) => match s.parse::<AssetKind>() {
            Ok(k) => k,
            Err(e) => return error_response(e),
        },
    };
    match state.library.get_albums(kind).await {
        Ok(albums) => (StatusCode::OK, Json(albums)).into_response(),
        Err(e) => error_response(e),
    }
}
