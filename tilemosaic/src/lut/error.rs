//! Membership table errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors loading or persisting the membership table.
#[derive(Debug, Error)]
pub enum LutError {
    /// Table file exists but could not be read
    #[error("Failed to read membership table {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Table could not be written or moved into place
    #[error("Failed to write membership table {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Document is not well-formed or has an unexpected layout
    #[error("Malformed membership table: {0}")]
    Xml(String),

    /// Table was written for a different mosaic area
    #[error("Membership table belongs to area '{found}', expected '{expected}'")]
    AreaMismatch { expected: String, found: String },

    /// Tile bucket carries an unparsable pixel offset
    #[error("Invalid upper_left_yx '{value}' on bucket {bucket}")]
    InvalidOffset { bucket: String, value: String },
}

impl LutError {
    pub(crate) fn xml(err: impl std::fmt::Display) -> Self {
        LutError::Xml(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_mismatch_display() {
        let err = LutError::AreaMismatch {
            expected: "gemNA".to_string(),
            found: "nrd".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Membership table belongs to area 'nrd', expected 'gemNA'"
        );
    }

    #[test]
    fn test_write_error_keeps_source() {
        use std::error::Error as _;
        let err = LutError::Write {
            path: PathBuf::from("/tmp/lut.xml"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("/tmp/lut.xml"));
    }
}
