//! Configuration of mosaic runs.
//!
//! Settings come from an INI file (default `~/.tilemosaic/config.ini`); a
//! missing file yields defaults. Settings structs live in `settings`,
//! constants in `defaults`, and INI parsing in `parser`.

mod defaults;
mod file;
mod parser;
mod settings;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    CompositeSettings, DomainSettings, FootprintSettings, GenerationSettings, LoggingSettings,
    LutSettings, MosaicConfig, TileSettings,
};
