//! Source partitioning command.
//!
//! Sources are given as `ID,LON,LAT,HEIGHT,RANGE[,NRAYS]` with range in
//! meters, either repeated on the command line or one per line in a file
//! (blank lines and `#` comments are skipped).

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tilemosaic::config::MosaicConfig;
use tilemosaic::footprint::{FootprintResolver, Source};
use tilemosaic::partition::TilePartitioner;

use super::common::{load_grid, load_lut};
use crate::error::CliError;

/// Azimuth samples used when a source line omits NRAYS.
const DEFAULT_NRAYS: u32 = 360;

/// Arguments for the partition command.
#[derive(Debug, Args)]
pub struct PartitionArgs {
    /// Source as ID,LON,LAT,HEIGHT,RANGE[,NRAYS] (repeatable)
    #[arg(long = "source", value_name = "SPEC")]
    pub sources: Vec<String>,

    /// File with one source per line
    #[arg(long, value_name = "PATH")]
    pub from: Option<PathBuf>,
}

/// Classify the sources against the grid and print each tile's members.
///
/// The membership table is updated and saved like in a generation run.
pub fn run(args: PartitionArgs, config: &MosaicConfig) -> Result<(), CliError> {
    let mut lines = args.sources;
    if let Some(path) = &args.from {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::SourceFile(path.clone(), e.to_string()))?;
        lines.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(String::from),
        );
    }

    let sources = lines
        .iter()
        .map(|line| parse_source(line))
        .collect::<Result<Vec<_>, _>>()?;

    let grid = Arc::new(load_grid(config)?);
    let resolver = FootprintResolver::for_grid(grid)?
        .with_rule(config.footprint.rule)
        .with_pixel_buffer(config.footprint.pixel_buffer);
    let partitioner = TilePartitioner::new(Arc::new(resolver));

    let mut lut = load_lut(config)?;
    let partition = partitioner.partition(&sources, &mut lut)?;

    for (tile_id, members) in &partition.tiles {
        let members: Vec<&str> = members.iter().map(|s| s.as_str()).collect();
        if members.is_empty() {
            println!("{}: (empty)", tile_id);
        } else {
            println!("{}: {}", tile_id, members.join(", "));
        }
    }

    if !partition.outside.is_empty() {
        let outside: Vec<&str> = partition.outside.iter().map(|s| s.as_str()).collect();
        println!("outside: {}", outside.join(", "));
    }
    for unusable in &partition.unusable {
        println!("unusable: {}", unusable);
    }

    println!();
    println!(
        "{} classified, {} from table",
        partition.classified, partition.cache_hits
    );
    Ok(())
}

/// Parse `ID,LON,LAT,HEIGHT,RANGE[,NRAYS]`.
fn parse_source(spec: &str) -> Result<Source, CliError> {
    let invalid = |reason: &str| CliError::InvalidSource(spec.to_string(), reason.to_string());

    let fields: Vec<&str> = spec.split(',').map(str::trim).collect();
    if fields.len() != 5 && fields.len() != 6 {
        return Err(invalid("expected 5 or 6 comma-separated fields"));
    }
    if fields[0].is_empty() {
        return Err(invalid("empty source id"));
    }

    let number = |i: usize, name: &str| -> Result<f64, CliError> {
        fields[i]
            .parse::<f64>()
            .map_err(|_| invalid(&format!("{} is not a number", name)))
    };
    let nrays = match fields.get(5) {
        Some(v) => v
            .parse::<u32>()
            .map_err(|_| invalid("nrays is not a positive integer"))?,
        None => DEFAULT_NRAYS,
    };

    Ok(Source::new(
        fields[0],
        number(1, "lon")?,
        number(2, "lat")?,
        number(3, "height")?,
        number(4, "range")?,
        nrays,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source_with_default_nrays() {
        let source = parse_source("sehem, 12.5, 56.0, 180, 240000").unwrap();
        assert_eq!(source.id.as_str(), "sehem");
        assert_eq!(source.lon, 12.5);
        assert_eq!(source.max_range, 240000.0);
        assert_eq!(source.nrays, DEFAULT_NRAYS);
    }

    #[test]
    fn test_parse_source_explicit_nrays() {
        let source = parse_source("a,0,0,0,1000,8").unwrap();
        assert_eq!(source.nrays, 8);
    }

    #[test]
    fn test_parse_source_rejects_bad_fields() {
        assert!(matches!(
            parse_source("a,0,0"),
            Err(CliError::InvalidSource(_, _))
        ));
        assert!(matches!(
            parse_source("a,east,0,0,1000"),
            Err(CliError::InvalidSource(_, _))
        ));
        assert!(matches!(
            parse_source(",0,0,0,1000"),
            Err(CliError::InvalidSource(_, _))
        ));
    }
}
