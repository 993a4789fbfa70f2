//! Pagination tokens: a base-10 row offset into the filter's sort order.
//!
//! A cursor is only meaningful while the catalog is not mutated. Inserts or
//! deletes between calls shift the offset window, so rows may be skipped or
//! repeated; this is not detected.

use crate::error::{LibraryError, Result};

pub fn encode(offset: u64) -> String {
    offset.to_string()
}

/// Absent or empty cursors start at offset 0.
pub fn decode(cursor: Option<&str>) -> Result<u64> {
    match cursor {
        None | Some("") => Ok(0),
        Some(raw) => {
            if !raw.bytes().all(|b| b.is_ascii_digit()) {
                return Err(LibraryError::InvalidCursor(raw.to_string()));
            }
            raw.parse::<u64>().map_err(|_| LibraryError::InvalidCursor(raw.to_string()))
        }
    }
}
