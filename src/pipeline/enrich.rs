//! Turns fetched catalog rows into [`AssetNode`]s.
//!
//! A row is dropped only when a requested size or duration probe fails. Every
//! other problem (unreadable location, missing optional column) leaves the
//! field null and keeps the row.

use std::path::Path;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::asset::{AssetNode, ImageInfo, Location, RawRow};
use crate::models::filter::{IncludeSet, MetadataField};
use crate::pipeline::geo::parse_iso6709;
use crate::pipeline::probe::{GeoTag, MediaProbe, ProbeError, ProbeReport, ProbeRequest};

#[derive(Debug, Error)]
pub enum DeriveFailure {
    #[error("image size unavailable: {0}")]
    ImageSize(String),
    #[error("playable duration unavailable: {0}")]
    PlayableDuration(String),
}

fn columns_have_size(row: &RawRow) -> bool {
    matches!((row.width, row.height), (Some(w), Some(h)) if w > 0 && h > 0)
}

/// Extension registered for the mime type, preferring the one the file
/// already carries when the mime type lists it.
pub fn extension_for(mime: Option<&str>, path: &str) -> Option<String> {
    let path_ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let known = mime.and_then(mime_guess::get_mime_extensions_str);
    match (known, path_ext) {
        (Some(exts), Some(ext)) if exts.contains(&ext.as_str()) => Some(ext),
        (Some(exts), _) if !exts.is_empty() => Some(exts[0].to_string()),
        (_, ext) => ext,
    }
}

fn image_size(
    row: &RawRow,
    probed: Option<&Result<ProbeReport, ProbeError>>,
) -> Result<(i64, i64), DeriveFailure> {
    let (mut w, mut h) = if columns_have_size(row) {
        (row.width.unwrap_or_default(), row.height.unwrap_or_default())
    } else {
        match probed {
            Some(Ok(ProbeReport { width: Some(w), height: Some(h), .. })) => (*w, *h),
            Some(Ok(_)) => return Err(DeriveFailure::ImageSize("no dimensions in file".to_string())),
            Some(Err(e)) => return Err(DeriveFailure::ImageSize(e.to_string())),
            None => return Err(DeriveFailure::ImageSize("not probed".to_string())),
        }
    };
    if let Some(o) = row.orientation {
        if o >= 0 && o % 180 != 0 {
            std::mem::swap(&mut w, &mut h);
        }
    }
    Ok((w, h))
}

fn playable_duration(probed: Option<&Result<ProbeReport, ProbeError>>) -> Result<i64, DeriveFailure> {
    match probed {
        Some(Ok(ProbeReport { duration_ms: Some(ms), .. })) => Ok(ms / 1000),
        Some(Ok(_)) => Err(DeriveFailure::PlayableDuration("no duration in file".to_string())),
        Some(Err(e)) => Err(DeriveFailure::PlayableDuration(e.to_string())),
        None => Err(DeriveFailure::PlayableDuration("not probed".to_string())),
    }
}

fn location(row: &RawRow, probed: Option<&Result<ProbeReport, ProbeError>>) -> Option<Location> {
    match probed? {
        Ok(report) => match &report.geo {
            Some(GeoTag::Exif(loc)) => Some(loc.clone()),
            Some(GeoTag::Iso6709(raw)) => match parse_iso6709(raw) {
                Ok(loc) => Some(loc),
                Err(e) => {
                    warn!(id = row.id, error = %e, "ignoring unparseable video location");
                    None
                }
            },
            None => None,
        },
        Err(e) => {
            warn!(id = row.id, error = %e, "could not read location metadata");
            None
        }
    }
}

/// Derive one node, honoring `include`.
pub fn derive_node(probe: &dyn MediaProbe, row: &RawRow, include: &IncludeSet) -> Result<AssetNode, DeriveFailure> {
    let is_video = row.is_video();
    let want_size = include.contains(MetadataField::ImageSize);
    let want_duration = include.contains(MetadataField::PlayableDuration) && is_video;
    let want_location = include.contains(MetadataField::Location);

    let request = ProbeRequest {
        dimensions: want_size && !columns_have_size(row),
        duration: want_duration,
        location: want_location,
    };
    // one open of the file per row; the probe releases it before returning
    let probed = (!request.is_empty()).then(|| probe.probe(Path::new(&row.path), is_video, request));

    let (width, height) = if want_size {
        let (w, h) = image_size(row, probed.as_ref())?;
        (Some(w), Some(h))
    } else {
        (None, None)
    };
    let playable_duration = if want_duration { Some(playable_duration(probed.as_ref())?) } else { None };

    let (filename, filepath) = if include.contains(MetadataField::Filename) {
        let name = Path::new(&row.path).file_name().map(|n| n.to_string_lossy().to_string());
        (name, Some(row.path.clone()))
    } else {
        (None, None)
    };

    let image = ImageInfo {
        filename,
        filepath,
        extension: include
            .contains(MetadataField::FileExtension)
            .then(|| extension_for(row.mime_type.as_deref(), &row.path))
            .flatten(),
        uri: row.uri(),
        height,
        width,
        file_size: include.contains(MetadataField::FileSize).then_some(row.size),
        playable_duration,
        orientation: include.contains(MetadataField::Orientation).then(|| row.orientation.unwrap_or(0)),
    };

    let group_name = match (&row.bucket, include.contains(MetadataField::Albums)) {
        (Some(b), true) => vec![b.clone()],
        _ => Vec::new(),
    };

    Ok(AssetNode {
        id: row.id.to_string(),
        mime_type: row.mime_type.clone(),
        group_name,
        image,
        timestamp: row.timestamp_secs(),
        modification_timestamp: row.date_modified as f64,
        location: if want_location { location(row, probed.as_ref()) } else { None },
    })
}

fn derive_or_drop(probe: &dyn MediaProbe, row: &RawRow, include: &IncludeSet) -> Option<AssetNode> {
    match derive_node(probe, row, include) {
        Ok(node) => Some(node),
        Err(e) => {
            debug!(id = row.id, path = %row.path, reason = %e, "dropping row from page");
            None
        }
    }
}

/// Enrich rows in fetch order until `page_size` nodes survive or the batch is
/// exhausted. Each wave enriches, in parallel, only as many rows as there are
/// open slots, so rows past the page (the look-ahead) are touched only to
/// backfill drops.
pub fn enrich_batch(probe: &dyn MediaProbe, rows: &[RawRow], page_size: usize, include: &IncludeSet) -> Vec<AssetNode> {
    let mut nodes = Vec::with_capacity(page_size.min(rows.len()));
    let mut remaining = rows;
    while nodes.len() < page_size && !remaining.is_empty() {
        let take = (page_size - nodes.len()).min(remaining.len());
        let (wave, rest) = remaining.split_at(take);
        let derived: Vec<Option<AssetNode>> = wave.par_iter().map(|row| derive_or_drop(probe, row, include)).collect();
        nodes.extend(derived.into_iter().flatten());
        remaining = rest;
    }
    nodes
}
