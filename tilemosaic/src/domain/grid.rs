//! Mosaic domain and its disjoint, pixel-aligned tile grid.

use std::collections::BTreeMap;

use tracing::debug;

use super::{ConfigError, Extent, PixelOffset, PixelSize, TileId};

/// Default alignment tolerance, as a fraction of one pixel.
///
/// Configurable tolerances must lie in `[0, 1)`.
pub const DEFAULT_ALIGNMENT_TOLERANCE: f64 = 0.01;

/// Largest domain width or height, in pixels.
///
/// Raster buffers address pixels with `u32` coordinates.
pub const MAX_DOMAIN_PIXELS: usize = u32::MAX as usize;

/// Bucket names used by the membership table; tiles may not reuse them.
pub const RESERVED_BUCKETS: [&str; 3] = ["all", "outside", "undetermined"];

/// The full output mosaic: projection, extent and pixel grid.
///
/// Immutable for the lifetime of a mosaic run.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    area_id: String,
    projection: String,
    extent: Extent,
    xscale: f64,
    yscale: f64,
    size: PixelSize,
}

impl Domain {
    /// Create a domain; the pixel size is derived from extent and scale.
    pub fn new(
        area_id: impl Into<String>,
        projection: impl Into<String>,
        extent: Extent,
        xscale: f64,
        yscale: f64,
    ) -> Result<Self, ConfigError> {
        if !extent.is_valid() {
            return Err(ConfigError::InvalidExtent { extent });
        }
        if !(xscale.is_finite() && yscale.is_finite() && xscale > 0.0 && yscale > 0.0) {
            return Err(ConfigError::InvalidScale { xscale, yscale });
        }
        let width = (extent.width() / xscale).round();
        let height = (extent.height() / yscale).round();
        let in_range = |v: f64| v.is_finite() && v >= 1.0 && v <= MAX_DOMAIN_PIXELS as f64;
        if !(in_range(width) && in_range(height)) {
            return Err(ConfigError::InvalidPixelSize { width, height });
        }
        let size = PixelSize::new(width as usize, height as usize);
        if size.checked_area().is_none() {
            return Err(ConfigError::InvalidPixelSize { width, height });
        }

        Ok(Self {
            area_id: area_id.into(),
            projection: projection.into(),
            extent,
            xscale,
            yscale,
            size,
        })
    }

    pub fn area_id(&self) -> &str {
        &self.area_id
    }

    /// Projection identifier.
    pub fn projection(&self) -> &str {
        &self.projection
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    pub fn xscale(&self) -> f64 {
        self.xscale
    }

    pub fn yscale(&self) -> f64 {
        self.yscale
    }

    pub fn size(&self) -> PixelSize {
        self.size
    }

    /// Extent of a pixel rectangle, in projection coordinates.
    pub fn pixel_extent(&self, offset: PixelOffset, size: PixelSize) -> Extent {
        let min_x = self.extent.min_x + offset.col as f64 * self.xscale;
        let max_y = self.extent.max_y - offset.row as f64 * self.yscale;
        Extent::new(
            min_x,
            max_y - size.height as f64 * self.yscale,
            min_x + size.width as f64 * self.xscale,
            max_y,
        )
    }

    /// Grow an extent outward to whole pixels of this grid, then pad it.
    pub fn snap_outward(&self, extent: &Extent, pad_pixels: u32) -> Extent {
        let pad = pad_pixels as f64;
        let origin = &self.extent;
        let snap_down = |v: f64, o: f64, s: f64| ((v - o) / s).floor() * s + o;
        let snap_up = |v: f64, o: f64, s: f64| ((v - o) / s).ceil() * s + o;

        Extent::new(
            snap_down(extent.min_x, origin.min_x, self.xscale) - pad * self.xscale,
            snap_down(extent.min_y, origin.min_y, self.yscale) - pad * self.yscale,
            snap_up(extent.max_x, origin.min_x, self.xscale) + pad * self.xscale,
            snap_up(extent.max_y, origin.min_y, self.yscale) + pad * self.yscale,
        )
    }
}

/// A disjoint, pixel-aligned sub-rectangle of the domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    id: TileId,
    extent: Extent,
    offset: PixelOffset,
    size: PixelSize,
}

impl Tile {
    pub fn id(&self) -> &TileId {
        &self.id
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    /// Upper-left pixel position in the domain raster.
    pub fn offset(&self) -> PixelOffset {
        self.offset
    }

    pub fn size(&self) -> PixelSize {
        self.size
    }

    fn overlaps_pixels(&self, other: &Tile) -> bool {
        let (a, b) = (self, other);
        a.offset.col < b.offset.col + b.size.width
            && b.offset.col < a.offset.col + a.size.width
            && a.offset.row < b.offset.row + b.size.height
            && b.offset.row < a.offset.row + a.size.height
    }
}

/// Statically configured tile definition, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct TileDef {
    pub id: String,
    pub extent: Extent,
}

impl TileDef {
    pub fn new(id: impl Into<String>, extent: Extent) -> Self {
        Self {
            id: id.into(),
            extent,
        }
    }
}

/// Validated set of tiles covering a domain.
#[derive(Debug, Clone)]
pub struct TileGrid {
    domain: Domain,
    tiles: Vec<Tile>,
    index: BTreeMap<TileId, usize>,
    tolerance: f64,
}

impl TileGrid {
    /// Build and validate a grid from tile definitions.
    ///
    /// Every tile edge must fall on the domain pixel grid within `tolerance`
    /// (a fraction of a pixel), tiles must not overlap, and together they
    /// must cover every domain pixel.
    pub fn new(domain: Domain, defs: &[TileDef], tolerance: f64) -> Result<Self, ConfigError> {
        let mut tiles: Vec<Tile> = Vec::with_capacity(defs.len());
        let mut index = BTreeMap::new();

        for def in defs {
            let id = TileId::qualified(domain.area_id(), &def.id);
            validate_tile_id(&id)?;
            if index.contains_key(&id) {
                return Err(ConfigError::DuplicateTile(id));
            }
            let tile = locate_tile(&domain, id.clone(), def.extent, tolerance)?;

            if let Some(other) = tiles.iter().find(|t| t.overlaps_pixels(&tile)) {
                return Err(ConfigError::OverlappingTiles {
                    first: other.id.clone(),
                    second: tile.id.clone(),
                });
            }

            debug!(
                tile_id = %tile.id,
                row = tile.offset.row,
                col = tile.offset.col,
                width = tile.size.width,
                height = tile.size.height,
                "Tile located on domain grid"
            );
            index.insert(id, tiles.len());
            tiles.push(tile);
        }

        let covered: usize = tiles.iter().map(|t| t.size.area()).sum();
        let expected = domain.size().area();
        if covered != expected {
            return Err(ConfigError::IncompleteCoverage { covered, expected });
        }

        Ok(Self {
            domain,
            tiles,
            index,
            tolerance,
        })
    }

    /// Split a domain into `rows` x `cols` tiles along pixel boundaries.
    ///
    /// Tile ids are `<area>_r<row>c<col>`.
    pub fn regular(domain: Domain, rows: usize, cols: usize) -> Result<Self, ConfigError> {
        Self::regular_with_tolerance(domain, rows, cols, DEFAULT_ALIGNMENT_TOLERANCE)
    }

    /// [`TileGrid::regular`] with an explicit alignment tolerance.
    pub fn regular_with_tolerance(
        domain: Domain,
        rows: usize,
        cols: usize,
        tolerance: f64,
    ) -> Result<Self, ConfigError> {
        let size = domain.size();
        if cols == 0 || cols > size.width {
            return Err(ConfigError::InvalidSplit {
                axis: "x",
                size: size.width,
                parts: cols,
            });
        }
        if rows == 0 || rows > size.height {
            return Err(ConfigError::InvalidSplit {
                axis: "y",
                size: size.height,
                parts: rows,
            });
        }

        let bounds = |n: usize, parts: usize| -> Vec<usize> {
            (0..=parts).map(|i| (i * n + parts / 2) / parts).collect()
        };
        let col_bounds = bounds(size.width, cols);
        let row_bounds = bounds(size.height, rows);

        let mut defs = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                let offset = PixelOffset::new(row_bounds[r], col_bounds[c]);
                let tile_size = PixelSize::new(
                    col_bounds[c + 1] - col_bounds[c],
                    row_bounds[r + 1] - row_bounds[r],
                );
                defs.push(TileDef::new(
                    format!("r{}c{}", r, c),
                    domain.pixel_extent(offset, tile_size),
                ));
            }
        }

        Self::new(domain, &defs, tolerance)
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Tolerance the tile edges were validated with, in pixels.
    pub fn alignment_tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Tiles in configuration order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, id: &TileId) -> Option<&Tile> {
        self.index.get(id).map(|&i| &self.tiles[i])
    }

    pub fn contains(&self, id: &TileId) -> bool {
        self.index.contains_key(id)
    }

    /// Tile ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &TileId> {
        self.index.keys()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Tile ids become XML element names in the membership table.
fn validate_tile_id(id: &TileId) -> Result<(), ConfigError> {
    let s = id.as_str();
    let invalid = |reason: &str| ConfigError::InvalidTileId {
        id: s.to_string(),
        reason: reason.to_string(),
    };

    if RESERVED_BUCKETS.contains(&s) {
        return Err(invalid("reserved membership bucket name"));
    }
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return Err(invalid("must start with a letter or underscore")),
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')) {
        return Err(invalid("only letters, digits, '_', '-' and '.' are allowed"));
    }
    Ok(())
}

fn locate_tile(
    domain: &Domain,
    id: TileId,
    extent: Extent,
    tolerance: f64,
) -> Result<Tile, ConfigError> {
    if !extent.is_valid() {
        return Err(ConfigError::InvalidExtent { extent });
    }

    let origin = domain.extent();
    let edges = [
        ("left", (extent.min_x - origin.min_x) / domain.xscale()),
        ("right", (extent.max_x - origin.min_x) / domain.xscale()),
        ("top", (origin.max_y - extent.max_y) / domain.yscale()),
        ("bottom", (origin.max_y - extent.min_y) / domain.yscale()),
    ];

    let mut pixels = [0i64; 4];
    for (i, &(edge, position)) in edges.iter().enumerate() {
        let rounded = position.round();
        let offset_pixels = (position - rounded).abs();
        if offset_pixels > tolerance {
            return Err(ConfigError::Misaligned {
                tile: id,
                edge,
                offset_pixels,
                tolerance,
            });
        }
        pixels[i] = rounded as i64;
    }
    let [left, right, top, bottom] = pixels;

    let size = domain.size();
    if left < 0 || top < 0 || right > size.width as i64 || bottom > size.height as i64 {
        return Err(ConfigError::TileOutsideDomain {
            tile: id,
            extent,
            domain: *origin,
        });
    }
    if right <= left || bottom <= top {
        return Err(ConfigError::EmptyTile(id));
    }

    Ok(Tile {
        id,
        extent,
        offset: PixelOffset::new(top as usize, left as usize),
        size: PixelSize::new((right - left) as usize, (bottom - top) as usize),
    })
}
