//! Identifier types shared across the pipeline.

use std::fmt;

/// Separator of source ids in persisted membership lists.
pub const SOURCE_ID_DELIMITER: char = ',';

/// Stable identifier of a sensor contributing to the mosaic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(String);

impl SourceId {
    /// Create a source id; surrounding whitespace is trimmed.
    ///
    /// The id is not checked; see [`SourceId::is_storable`].
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_string())
    }

    /// Create a source id, rejecting ids the membership table cannot store.
    pub fn try_new(id: impl AsRef<str>) -> Option<Self> {
        let id = Self::new(id);
        id.is_storable().then_some(id)
    }

    /// Whether the id survives a membership table round trip.
    ///
    /// Buckets store members as a comma-separated list, so ids must be
    /// non-empty and free of commas and whitespace.
    pub fn is_storable(&self) -> bool {
        !self.0.is_empty()
            && !self
                .0
                .chars()
                .any(|c| c == SOURCE_ID_DELIMITER || c.is_whitespace())
    }

    /// Derive a source id from a polar volume file name.
    ///
    /// The sensor name is the second-to-last `.`-separated component,
    /// lower-cased: `qcvol.20160913T1200Z.casbv.h5` yields `casbv`.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
        let parts: Vec<&str> = base.split('.').collect();
        if parts.len() < 2 {
            return None;
        }
        let node = parts[parts.len() - 2].trim();
        if node.is_empty() {
            return None;
        }
        Some(Self(node.to_lowercase()))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Identifier of a tile within a domain's tile grid.
///
/// Tile ids are permanent: membership tables persisted across runs are
/// keyed by them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileId(String);

impl TileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Qualify a configured tile id with its area id.
    ///
    /// Ids that already start with the area id are kept as they are,
    /// everything else becomes `<area>_<id>`.
    pub fn qualified(area_id: &str, id: &str) -> Self {
        if id.starts_with(area_id) {
            Self(id.to_string())
        } else {
            Self(format!("{}_{}", area_id, id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TileId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Pixel position of a tile's upper-left corner in the domain raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelOffset {
    pub row: usize,
    pub col: usize,
}

impl PixelOffset {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for PixelOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

/// Raster dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelSize {
    pub width: usize,
    pub height: usize,
}

impl PixelSize {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Number of pixels covered, saturating at `usize::MAX`.
    pub fn area(&self) -> usize {
        self.width.saturating_mul(self.height)
    }

    /// Number of pixels covered, or `None` on overflow.
    pub fn checked_area(&self) -> Option<usize> {
        self.width.checked_mul(self.height)
    }
}

impl fmt::Display for PixelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_from_file_name() {
        let id = SourceId::from_file_name("qcvol.20160913T1200Z.CASBV.h5");
        assert_eq!(id, Some(SourceId::new("casbv")));
    }

    #[test]
    fn test_source_id_from_path() {
        let id = SourceId::from_file_name("/data/2016/09/13/qcvol.20160913T1200Z.usktlx.h5");
        assert_eq!(id.map(|i| i.to_string()), Some("usktlx".to_string()));
    }

    #[test]
    fn test_source_id_without_components() {
        assert_eq!(SourceId::from_file_name("casbv"), None);
        assert_eq!(SourceId::from_file_name("a..h5"), None);
    }

    #[test]
    fn test_storable_source_ids() {
        assert_eq!(SourceId::try_new(" casbv "), Some(SourceId::new("casbv")));
        assert_eq!(SourceId::try_new("radar,north"), None);
        assert_eq!(SourceId::try_new("radar north"), None);
        assert_eq!(SourceId::try_new("   "), None);
        assert!(!SourceId::new("radar,north").is_storable());
    }

    #[test]
    fn test_tile_id_qualification() {
        assert_eq!(TileId::qualified("gemNA", "t1").as_str(), "gemNA_t1");
        assert_eq!(TileId::qualified("gemNA", "gemNA_t1").as_str(), "gemNA_t1");
    }

    #[test]
    fn test_offset_display() {
        assert_eq!(PixelOffset::new(0, 50).to_string(), "0,50");
        assert_eq!(PixelSize::new(50, 100).area(), 5000);
        assert_eq!(PixelSize::new(usize::MAX, 2).checked_area(), None);
        assert_eq!(PixelSize::new(usize::MAX, 2).area(), usize::MAX);
    }
}
