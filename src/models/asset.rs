use serde::{Deserialize, Serialize};

/// Platform media-type codes stored in the `media_type` column.
pub const MEDIA_TYPE_IMAGE: i64 = 1;
pub const MEDIA_TYPE_VIDEO: i64 = 3;

/// One catalog record, as fetched. Lives only for the duration of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub id: i64,
    pub mime_type: Option<String>,
    pub bucket: Option<String>,
    /// Milliseconds.
    pub date_taken: Option<i64>,
    /// Seconds.
    pub date_added: i64,
    /// Seconds.
    pub date_modified: i64,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub size: i64,
    pub path: String,
    pub orientation: Option<i64>,
}

impl RawRow {
    pub fn is_video(&self) -> bool {
        self.mime_type.as_deref().map_or(false, |m| m.starts_with("video"))
    }

    /// Creation time in seconds, falling back to the time the row was added.
    pub fn timestamp_secs(&self) -> f64 {
        match self.date_taken {
            Some(ms) if ms != 0 => ms as f64 / 1000.0,
            _ => self.date_added as f64,
        }
    }

    pub fn uri(&self) -> String {
        format!("file://{}", self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub filename: Option<String>,
    pub filepath: Option<String>,
    pub extension: Option<String>,
    pub uri: String,
    pub height: Option<i64>,
    pub width: Option<i64>,
    pub file_size: Option<i64>,
    pub playable_duration: Option<i64>,
    pub orientation: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude, altitude: None, heading: None, speed: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetNode {
    pub id: String,
    #[serde(rename = "type")]
    pub mime_type: Option<String>,
    pub group_name: Vec<String>,
    pub image: ImageInfo,
    /// Seconds.
    pub timestamp: f64,
    #[serde(rename = "modificationTimestamp")]
    pub modification_timestamp: f64,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub node: AssetNode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub has_next_page: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub edges: Vec<Edge>,
    pub page_info: PageInfo,
}

impl Page {
    pub fn empty() -> Self {
        Self { edges: Vec::new(), page_info: PageInfo { has_next_page: false, end_cursor: None } }
    }

    pub fn ids(&self) -> Vec<&str> {
        self.edges.iter().map(|e| e.node.id.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub title: String,
    pub count: u64,
}
