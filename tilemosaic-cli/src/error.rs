//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use tilemosaic::config::ConfigFileError;
use tilemosaic::domain::ConfigError;
use tilemosaic::lut::LutError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Config file could not be read or parsed
    Config(ConfigFileError),
    /// Domain or tile grid is invalid
    Grid(ConfigError),
    /// Membership table could not be loaded or saved
    Lut(LutError),
    /// Source is not present in the membership table
    UnknownSource(String),
    /// Source description could not be parsed
    InvalidSource(String, String),
    /// Source list file could not be read
    SourceFile(PathBuf, String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Grid(_) => {
                eprintln!();
                eprintln!("Check the [domain] and [tiles] / [tile.<id>] sections:");
                eprintln!("  tile edges must fall on the domain pixel grid,");
                eprintln!("  tiles must not overlap and must cover the whole domain.");
            }
            CliError::Lut(LutError::AreaMismatch { .. }) => {
                eprintln!();
                eprintln!("The table was written for another area; point [lut] path at");
                eprintln!("the table of the configured area_id.");
            }
            CliError::InvalidSource(..) => {
                eprintln!();
                eprintln!("Sources are written as ID,LON,LAT,HEIGHT,RANGE[,NRAYS]");
                eprintln!("with coordinates in degrees and height/range in meters.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Grid(e) => write!(f, "Invalid tile grid: {}", e),
            CliError::Lut(e) => write!(f, "Membership table error: {}", e),
            CliError::UnknownSource(id) => {
                write!(f, "Source '{}' is not in the membership table", id)
            }
            CliError::InvalidSource(spec, reason) => {
                write!(f, "Invalid source '{}': {}", spec, reason)
            }
            CliError::SourceFile(path, msg) => {
                write!(f, "Failed to read source list {}: {}", path.display(), msg)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Grid(e) => Some(e),
            CliError::Lut(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Grid(e)
    }
}

impl From<LutError> for CliError {
    fn from(e: LutError) -> Self {
        CliError::Lut(e)
    }
}
