use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    pub root: PathBuf,
    pub data: PathBuf,
    pub port: u16,
    pub db_pool_size: u32,
    pub ffprobe: String,
    pub index_on_start: bool,
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| env::var(k).ok())
    }

    /// Build from any key lookup; unparseable values fall back to defaults.
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let root = get("CAMROLL_ROOT").unwrap_or_else(|| "/photos".to_string());
        let data = get("CAMROLL_DATA").unwrap_or_else(|| "/camroll-data".to_string());
        let port = get("CAMROLL_PORT").and_then(|v| v.parse().ok()).unwrap_or(9171);
        let db_pool_size = get("CAMROLL_DB_POOL").and_then(|v| v.parse().ok()).filter(|n| *n > 0).unwrap_or(8);
        let ffprobe = get("CAMROLL_FFPROBE").filter(|v| !v.is_empty()).unwrap_or_else(|| "ffprobe".to_string());
        let index_on_start = get("CAMROLL_INDEX_ON_START").and_then(|v| parse_bool(&v)).unwrap_or(false);
        Self {
            root: PathBuf::from(root),
            data: PathBuf::from(data),
            port,
            db_pool_size,
            ffprobe,
            index_on_start,
        }
    }
}
