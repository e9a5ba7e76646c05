//! INI parsing logic for converting `Ini` → `MosaicConfig`.
//!
//! The single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::{MosaicConfig, TileSettings};
use crate::domain::{Extent, IntersectionRule, TileDef};
use crate::generator::FailurePolicy;

/// Prefix of per-tile sections (`[tile.<id>]`).
const TILE_SECTION_PREFIX: &str = "tile.";

/// Parse an `Ini` object into a `MosaicConfig`.
///
/// Starts from `MosaicConfig::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<MosaicConfig, ConfigFileError> {
    let mut config = MosaicConfig::default();

    // [domain] section
    if let Some(section) = ini.section(Some("domain")) {
        let s = Section::new("domain", section);
        if let Some(v) = s.text("area_id") {
            config.domain.area_id = v;
        }
        if let Some(v) = s.text("projection") {
            config.domain.projection = v.to_lowercase();
        }
        if let Some(v) = s.get("extent") {
            config.domain.extent = parse_extent(v).ok_or_else(|| {
                s.invalid("extent", v, "expected 'min_x, min_y, max_x, max_y'")
            })?;
        }
        if let Some(v) = s.parse::<f64>("xscale", "must be a positive number")? {
            config.domain.xscale = v;
        }
        if let Some(v) = s.parse::<f64>("yscale", "must be a positive number")? {
            config.domain.yscale = v;
        }
        if let Some(v) = s.parse::<f64>("alignment_tolerance", "must be a fraction of a pixel")? {
            if !(0.0..1.0).contains(&v) {
                return Err(s.invalid(
                    "alignment_tolerance",
                    &v.to_string(),
                    "must be at least 0 and below one pixel",
                ));
            }
            config.domain.alignment_tolerance = v;
        }
    }

    // [tile.<id>] sections take precedence over [tiles]
    let mut defs = Vec::new();
    for (name, section) in ini.iter() {
        let Some(id) = name.and_then(|n| n.strip_prefix(TILE_SECTION_PREFIX)) else {
            continue;
        };
        let section_name = format!("{}{}", TILE_SECTION_PREFIX, id);
        let s = Section::new(&section_name, section);
        let value = s.get("extent").ok_or_else(|| ConfigFileError::MissingValue {
            section: section_name.clone(),
            key: "extent".to_string(),
        })?;
        let extent = parse_extent(value).ok_or_else(|| {
            s.invalid("extent", value, "expected 'min_x, min_y, max_x, max_y'")
        })?;
        defs.push(TileDef::new(id.trim(), extent));
    }

    if !defs.is_empty() {
        config.tiles = TileSettings::Explicit(defs);
    } else if let Some(section) = ini.section(Some("tiles")) {
        let s = Section::new("tiles", section);
        if let TileSettings::Regular { rows, cols } = &mut config.tiles {
            if let Some(v) = s.parse::<usize>("rows", "must be a positive integer")? {
                *rows = v;
            }
            if let Some(v) = s.parse::<usize>("cols", "must be a positive integer")? {
                *cols = v;
            }
        }
    }

    // [footprint] section
    if let Some(section) = ini.section(Some("footprint")) {
        let s = Section::new("footprint", section);
        if let Some(v) = s.get("rule") {
            config.footprint.rule = IntersectionRule::from_name(v)
                .ok_or_else(|| s.invalid("rule", v, "must be 'corners' or 'overlap'"))?;
        }
        if let Some(v) = s.parse::<u32>("pixel_buffer", "must be a non-negative integer")? {
            config.footprint.pixel_buffer = v;
        }
    }

    // [generation] section
    if let Some(section) = ini.section(Some("generation")) {
        let s = Section::new("generation", section);
        if let Some(v) = s.parse::<usize>("workers", "must be a non-negative integer")? {
            config.generation.workers = v;
        }
        if let Some(v) = s.parse::<u64>("timeout", "must be a non-negative integer (seconds)")? {
            config.generation.timeout = v;
        }
        if let Some(v) = s.get("sequential") {
            config.generation.sequential =
                parse_bool(v).ok_or_else(|| s.invalid("sequential", v, "must be true or false"))?;
        }
        if let Some(v) = s.get("failure_policy") {
            config.generation.failure_policy = FailurePolicy::from_name(v).ok_or_else(|| {
                s.invalid("failure_policy", v, "must be 'abort' or 'allow_partial'")
            })?;
        }
    }

    // [lut] section
    if let Some(section) = ini.section(Some("lut")) {
        let s = Section::new("lut", section);
        if let Some(v) = s.text("path") {
            config.lut.path = Some(expand_tilde(&v));
        }
    }

    // [composite] section
    if let Some(section) = ini.section(Some("composite")) {
        let s = Section::new("composite", section);
        if let Some(v) = s.get("quantities") {
            let quantities = parse_list(v);
            if quantities.is_empty() {
                return Err(s.invalid("quantities", v, "at least one quantity is required"));
            }
            config.composite.quantities = quantities;
        }
        if let Some(v) = s.get("quality_tasks") {
            config.composite.quality_tasks = parse_list(v);
        }
        if let Some(v) = s.parse::<f64>("gain", "must be a number")? {
            config.composite.gain = v;
        }
        if let Some(v) = s.parse::<f64>("offset", "must be a number")? {
            config.composite.offset = v;
        }
        if let Some(v) = s.parse::<u8>("nodata", "must be an integer from 0 to 255")? {
            config.composite.nodata = v;
        }
        if let Some(v) = s.parse::<u8>("undetect", "must be an integer from 0 to 255")? {
            config.composite.undetect = v;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        let s = Section::new("logging", section);
        if let Some(v) = s.text("directory") {
            config.logging.directory = expand_tilde(&v);
        }
        if let Some(v) = s.text("file") {
            config.logging.file = v;
        }
    }

    Ok(config)
}

/// Section accessor that produces uniform `InvalidValue` errors.
struct Section<'a> {
    name: &'a str,
    properties: &'a Properties,
}

impl<'a> Section<'a> {
    fn new(name: &'a str, properties: &'a Properties) -> Self {
        Self { name, properties }
    }

    fn get(&self, key: &str) -> Option<&'a str> {
        self.properties.get(key).map(str::trim)
    }

    /// Non-empty trimmed value.
    fn text(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| !v.is_empty()).map(str::to_string)
    }

    fn parse<T: FromStr>(&self, key: &str, reason: &str) -> Result<Option<T>, ConfigFileError> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v
                .parse()
                .map(Some)
                .map_err(|_| self.invalid(key, v, reason)),
        }
    }

    fn invalid(&self, key: &str, value: &str, reason: &str) -> ConfigFileError {
        ConfigFileError::InvalidValue {
            section: self.name.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Parse `min_x, min_y, max_x, max_y`, optionally bracketed.
fn parse_extent(value: &str) -> Option<Extent> {
    let inner = value.trim().trim_start_matches('[').trim_end_matches(']');
    let parts: Vec<f64> = inner
        .split(',')
        .map(|p| p.trim().parse().ok())
        .collect::<Option<_>>()?;
    match parts.as_slice() {
        &[min_x, min_y, max_x, max_y] => Some(Extent::new(min_x, min_y, max_x, max_y)),
        _ => None,
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Expand a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
