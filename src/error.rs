use thiserror::Error;

/// Call-level failures of a library query.
///
/// Per-row derivation failures never show up here: they drop the row from the
/// page and are only logged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LibraryError {
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid cursor: {0:?}")]
    InvalidCursor(String),

    #[error("Invalid page size {0:?}: must be a positive integer")]
    InvalidPageSize(String),

    #[error("No media with id {0:?}")]
    NotFound(String),

    /// The asset exists but a requested measurement could not be read.
    #[error("Media {id} is unreadable: {reason}")]
    AssetUnavailable { id: String, reason: String },

    #[error("Media store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

impl LibraryError {
    /// Stable machine-readable code, used by the HTTP bridge.
    pub fn code(&self) -> &'static str {
        match self {
            LibraryError::InvalidFilter(_) => "E_INVALID_FILTER",
            LibraryError::InvalidCursor(_) => "E_INVALID_CURSOR",
            LibraryError::InvalidPageSize(_) => "E_INVALID_PAGE_SIZE",
            LibraryError::NotFound(_) => "E_NOT_FOUND",
            LibraryError::AssetUnavailable { .. } => "E_ASSET_UNAVAILABLE",
            LibraryError::StoreUnavailable(_) => "E_STORE_UNAVAILABLE",
            LibraryError::PermissionDenied(_) => "E_PERMISSION_DENIED",
        }
    }

    /// True for errors raised by request validation, before any I/O.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LibraryError::InvalidFilter(_) | LibraryError::InvalidCursor(_) | LibraryError::InvalidPageSize(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let errs = [
            LibraryError::InvalidFilter("x".into()),
            LibraryError::InvalidCursor("x".into()),
            LibraryError::InvalidPageSize("0".into()),
            LibraryError::NotFound("1".into()),
            LibraryError::AssetUnavailable { id: "1".into(), reason: "x".into() },
            LibraryError::StoreUnavailable("x".into()),
            LibraryError::PermissionDenied("x".into()),
        ];
        let mut codes: Vec<_> = errs.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errs.len());
    }

    #[test]
    fn test_client_errors() {
        assert!(LibraryError::InvalidCursor("abc".into()).is_client_error());
        assert!(!LibraryError::PermissionDenied("no".into()).is_client_error());
        assert!(!LibraryError::StoreUnavailable("down".into()).is_client_error());
        assert!(!LibraryError::NotFound("7".into()).is_client_error());
    }
}
