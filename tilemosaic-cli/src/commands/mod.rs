//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`lut`] - Membership table inspection and maintenance (show, stale, invalidate)
//! - [`partition`] - Classify sources and print the per-tile assignment
//! - [`tiles`] - Print the configured tile grid

pub mod common;
pub mod lut;
pub mod partition;
pub mod tiles;
