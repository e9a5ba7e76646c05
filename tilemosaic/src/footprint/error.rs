//! Source geometry errors.

use thiserror::Error;

use crate::domain::SourceId;

/// A source whose footprint cannot be evaluated.
///
/// Recovered per source: the source is skipped for the cycle and retried on
/// the next one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceUnusable {
    #[error("Source id '{source_id}' cannot be stored in the membership table")]
    InvalidId { source_id: SourceId },

    #[error("Source {source_id} has an invalid origin ({lon}, {lat}, {height} m)")]
    InvalidOrigin {
        source_id: SourceId,
        lon: f64,
        lat: f64,
        height: f64,
    },

    #[error("Source {source_id} has an invalid maximum range {range}")]
    InvalidRange { source_id: SourceId, range: f64 },

    #[error("Source {source_id} range ring at azimuth {azimuth:.1} cannot be projected")]
    Unprojectable { source_id: SourceId, azimuth: f64 },
}

impl SourceUnusable {
    /// Id of the offending source.
    pub fn source_id(&self) -> &SourceId {
        match self {
            SourceUnusable::InvalidId { source_id }
            | SourceUnusable::InvalidOrigin { source_id, .. }
            | SourceUnusable::InvalidRange { source_id, .. }
            | SourceUnusable::Unprojectable { source_id, .. } => source_id,
        }
    }
}
