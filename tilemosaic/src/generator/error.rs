//! Umbrella error of a mosaic generation cycle.

use thiserror::Error;

use crate::composite::{DispatchError, TileFailure};
use crate::domain::ConfigError;
use crate::lut::LutError;
use crate::merge::MergeError;

/// Why a generation cycle produced no mosaic.
#[derive(Debug, Error)]
pub enum MosaicError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lut(#[from] LutError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// A tile failed under the abort policy
    #[error("{0}")]
    TileFailed(Box<TileFailure>),

    #[error(transparent)]
    Merge(#[from] MergeError),
}
