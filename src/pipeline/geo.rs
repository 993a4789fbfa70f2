use thiserror::Error;

use crate::models::asset::Location;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed geo string {0:?}")]
pub struct GeoParseError(pub String);

/// Parse an ISO 6709 decimal-degrees string as embedded in video containers,
/// e.g. `+37.7749-122.4194/` or `+48.8577+002.2950+035.000/`.
pub fn parse_iso6709(raw: &str) -> Result<Location, GeoParseError> {
    let err = || GeoParseError(raw.to_string());
    let s = raw.trim().trim_end_matches('/');
    if !s.starts_with(|c| c == '+' || c == '-') {
        return Err(err());
    }

    let mut parts: Vec<&str> = Vec::with_capacity(3);
    let mut start = 0;
    for (i, c) in s.char_indices().skip(1) {
        if c == '+' || c == '-' {
            parts.push(&s[start..i]);
            start = i;
        }
    }
    parts.push(&s[start..]);
    if parts.len() < 2 || parts.len() > 3 {
        return Err(err());
    }

    let nums = parts
        .iter()
        .map(|p| p.parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<f64>>>()
        .ok_or_else(err)?;
    let (lat, lon) = (nums[0], nums[1]);
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(err());
    }
    let mut loc = Location::new(lat, lon);
    loc.altitude = nums.get(2).copied();
    Ok(loc)
}
