//! Per-tile compositing and its parallel dispatch.
//!
//! [`Compositor`] is the seam to the external compositing collaborator.
//! [`TileCompositor`] adds the shape checks and the empty-tile case, and
//! [`TileDispatcher`] fans tiles out to a bounded worker pool behind a
//! barrier.

mod compositor;
mod dispatch;
mod error;

pub use compositor::{Compositor, TileCompositor};
pub use dispatch::{DispatchConfig, DispatchOutcome, TileDispatcher, TileFailure};
pub use error::{CompositeError, DispatchError};
