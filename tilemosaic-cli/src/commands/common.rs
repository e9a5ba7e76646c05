//! Helpers shared across CLI commands.

use std::path::Path;

use tilemosaic::config::MosaicConfig;
use tilemosaic::domain::TileGrid;
use tilemosaic::lut::MembershipCache;

use crate::error::CliError;

/// Load the configuration from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<MosaicConfig, CliError> {
    let config = match path {
        Some(path) => MosaicConfig::load_from(path)?,
        None => MosaicConfig::load()?,
    };
    Ok(config)
}

/// Build and validate the configured tile grid.
pub fn load_grid(config: &MosaicConfig) -> Result<TileGrid, CliError> {
    Ok(config.build_grid()?)
}

/// Load the configured membership table; a missing file yields an empty one.
pub fn load_lut(config: &MosaicConfig) -> Result<MembershipCache, CliError> {
    Ok(MembershipCache::load(
        config.domain.area_id.as_str(),
        config.lut_path(),
    )?)
}
