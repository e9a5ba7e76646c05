//! Persistent membership table ("LUT").
//!
//! Maps source ids to the tiles their footprint touches so that geometry is
//! only evaluated the first time a source is seen. The table lives in one XML
//! document per mosaic area, loaded at cycle start and persisted once at
//! cycle end.

mod cache;
mod error;
mod xml;

pub use cache::{MembershipCache, MembershipRecord, TileBucket};
pub use error::LutError;
