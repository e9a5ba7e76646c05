//! Source footprints and their classification against the tile grid.
//!
//! A footprint is the bounding box of a source's maximum-range ring in domain
//! projection coordinates: a conservative over-approximation of its coverage,
//! not an exact polygon.

mod error;
mod resolver;
mod source;

pub use error::SourceUnusable;
pub use resolver::{Classification, FootprintResolver, DEFAULT_PIXEL_BUFFER};
pub use source::Source;
