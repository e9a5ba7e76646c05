//! Geometry collaborators: map projections and polar navigation.
//!
//! Only what footprint estimation needs lives here. The [`Projection`] trait
//! is the seam for real projection libraries; the two built-in projections
//! cover geographic grids and spherical Web Mercator.

mod polar;
mod projection;

pub use polar::{destination, EARTH_RADIUS_M};
pub use projection::{
    projection_for_id, LonLatProjection, Projection, WebMercatorProjection, MAX_MERCATOR_LAT,
};
