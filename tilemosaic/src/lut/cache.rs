//! Persistent source-to-tile membership table.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::xml::{parse_document, write_document, Bucket};
use super::LutError;
use crate::domain::{PixelOffset, SourceId, TileGrid, TileId};

const ALL: &str = "all";
const OUTSIDE: &str = "outside";
const UNDETERMINED: &str = "undetermined";

/// Classification outcome for one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipRecord {
    /// Footprint does not touch the domain.
    Outside,
    /// Footprint touches the domain; the tiles it contributes to.
    ///
    /// May be empty when the footprint touches the domain but no tile passes
    /// the intersection rule.
    Inside(BTreeSet<TileId>),
}

impl MembershipRecord {
    pub fn is_outside(&self) -> bool {
        matches!(self, MembershipRecord::Outside)
    }

    /// Tiles the source contributes to; empty when outside.
    pub fn tiles(&self) -> impl Iterator<Item = &TileId> {
        match self {
            MembershipRecord::Outside => None,
            MembershipRecord::Inside(tiles) => Some(tiles.iter()),
        }
        .into_iter()
        .flatten()
    }

    pub fn contains(&self, tile: &TileId) -> bool {
        match self {
            MembershipRecord::Outside => false,
            MembershipRecord::Inside(tiles) => tiles.contains(tile),
        }
    }
}

/// Members of one tile bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileBucket {
    /// Tile pixel offset recorded with the bucket.
    pub upper_left: Option<PixelOffset>,
    pub members: BTreeSet<SourceId>,
}

/// Membership cache ("LUT") mapping source ids to the tiles they feed.
///
/// Every classified source is recorded in the `all` bucket so it is never
/// classified again, plus either `outside` or the buckets of the tiles it
/// contributes to. Sources whose geometry could not be evaluated are kept in
/// `undetermined` for diagnosis, outside `all`, so they are retried.
///
/// Not safe for concurrent writers: load it once at cycle start, mutate it
/// from a single thread and persist it once at the end.
#[derive(Debug, Clone)]
pub struct MembershipCache {
    area_id: String,
    path: Option<PathBuf>,
    all: BTreeSet<SourceId>,
    outside: BTreeSet<SourceId>,
    undetermined: BTreeSet<SourceId>,
    tiles: BTreeMap<TileId, TileBucket>,
}

impl MembershipCache {
    /// Empty, memory-only table; [`persist`](Self::persist) is a no-op.
    pub fn new(area_id: impl Into<String>) -> Self {
        Self {
            area_id: area_id.into(),
            path: None,
            all: BTreeSet::new(),
            outside: BTreeSet::new(),
            undetermined: BTreeSet::new(),
            tiles: BTreeMap::new(),
        }
    }

    /// Empty table bound to a file.
    pub fn with_path(area_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let mut cache = Self::new(area_id);
        cache.path = Some(path.into());
        cache
    }

    /// Load the table from `path`.
    ///
    /// A missing file is a cold start and yields an empty table bound to
    /// `path`.
    pub fn load(area_id: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, LutError> {
        let path = path.as_ref();
        let area_id = area_id.into();

        let xml = match fs::read_to_string(path) {
            Ok(xml) => xml,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No membership table found, starting cold");
                return Ok(Self::with_path(area_id, path));
            }
            Err(source) => {
                return Err(LutError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let mut cache = Self::from_xml(area_id, &xml)?;
        cache.path = Some(path.to_path_buf());
        info!(
            path = %path.display(),
            sources = cache.all.len(),
            tiles = cache.tiles.len(),
            "Loaded membership table"
        );
        Ok(cache)
    }

    /// Parse a table from XML text without binding it to a file.
    pub fn from_xml(area_id: impl Into<String>, xml: &str) -> Result<Self, LutError> {
        let document = parse_document(xml)?;
        let mut cache = Self::new(area_id);
        if document.root != cache.area_id {
            return Err(LutError::AreaMismatch {
                expected: cache.area_id,
                found: document.root,
            });
        }

        for bucket in document.buckets {
            let members = bucket.members.into_iter();
            match bucket.name.as_str() {
                ALL => cache.all.extend(members),
                OUTSIDE => cache.outside.extend(members),
                UNDETERMINED => cache.undetermined.extend(members),
                _ => {
                    let entry = cache.tiles.entry(TileId::new(bucket.name)).or_default();
                    entry.upper_left = bucket.upper_left.or(entry.upper_left);
                    entry.members.extend(members);
                }
            }
        }
        Ok(cache)
    }

    /// Serialize the whole table.
    pub fn to_xml(&self) -> Result<String, LutError> {
        let mut buckets = Vec::with_capacity(self.tiles.len() + 3);
        for (name, set) in [
            (ALL, &self.all),
            (OUTSIDE, &self.outside),
            (UNDETERMINED, &self.undetermined),
        ] {
            buckets.push(Bucket {
                name: name.to_string(),
                upper_left: None,
                members: set.iter().cloned().collect(),
            });
        }
        for (id, bucket) in &self.tiles {
            buckets.push(Bucket {
                name: id.to_string(),
                upper_left: bucket.upper_left,
                members: bucket.members.iter().cloned().collect(),
            });
        }
        write_document(&self.area_id, &buckets)
    }

    /// Write the table to its bound file.
    ///
    /// The document goes to a temporary sibling first and is renamed into
    /// place, so readers never observe a half-written table.
    pub fn persist(&self) -> Result<(), LutError> {
        match &self.path {
            Some(path) => self.persist_to(path),
            None => {
                debug!(area_id = %self.area_id, "Membership table is memory-only, not persisted");
                Ok(())
            }
        }
    }

    /// Write the table to an explicit path.
    pub fn persist_to(&self, path: &Path) -> Result<(), LutError> {
        let xml = self.to_xml()?;
        let write_err = |source| LutError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, xml).map_err(write_err)?;
        fs::rename(&temp_path, path).map_err(write_err)?;

        info!(
            path = %path.display(),
            sources = self.all.len(),
            "Persisted membership table"
        );
        Ok(())
    }

    /// Make sure every tile of the grid has a bucket carrying its offset.
    pub fn register_tiles(&mut self, grid: &TileGrid) {
        for tile in grid.tiles() {
            let bucket = self.tiles.entry(tile.id().clone()).or_default();
            if let Some(previous) = bucket.upper_left.filter(|o| *o != tile.offset()) {
                warn!(
                    tile_id = %tile.id(),
                    recorded = %previous,
                    configured = %tile.offset(),
                    "Tile offset differs from membership table, using configured offset"
                );
            }
            bucket.upper_left = Some(tile.offset());
        }
    }

    /// Buckets for tiles the grid does not define.
    pub fn stale_tiles(&self, grid: &TileGrid) -> Vec<TileId> {
        self.tiles
            .keys()
            .filter(|id| !grid.contains(id))
            .cloned()
            .collect()
    }

    /// Recorded classification of a source, if it was classified before.
    pub fn lookup(&self, source: &SourceId) -> Option<MembershipRecord> {
        if !self.all.contains(source) {
            return None;
        }
        if self.outside.contains(source) {
            return Some(MembershipRecord::Outside);
        }
        let tiles = self
            .tiles
            .iter()
            .filter(|(_, bucket)| bucket.members.contains(source))
            .map(|(id, _)| id.clone())
            .collect();
        Some(MembershipRecord::Inside(tiles))
    }

    /// Record a classification, replacing whatever was stored for the source.
    ///
    /// Ids that would not survive persistence are ignored.
    pub fn record(&mut self, source: &SourceId, tiles: &BTreeSet<TileId>, outside: bool) {
        if !source.is_storable() {
            warn!(source_id = %source, "Not recording unstorable source id");
            return;
        }
        self.remove_everywhere(source);

        if outside {
            self.outside.insert(source.clone());
        } else {
            for tile in tiles {
                self.tiles
                    .entry(tile.clone())
                    .or_default()
                    .members
                    .insert(source.clone());
            }
        }
        self.all.insert(source.clone());
    }

    /// Note a source whose geometry could not be evaluated.
    ///
    /// Ignored for sources that are already classified or whose id cannot
    /// be stored.
    pub fn mark_undetermined(&mut self, source: &SourceId) {
        if source.is_storable() && !self.all.contains(source) {
            self.undetermined.insert(source.clone());
        }
    }

    /// Forget a source so that it is classified again on next sight.
    ///
    /// Required after a sensor has been relocated. Returns whether the
    /// source was known.
    pub fn invalidate(&mut self, source: &SourceId) -> bool {
        let known = self.all.contains(source) || self.undetermined.contains(source);
        self.remove_everywhere(source);
        if known {
            info!(source_id = %source, "Invalidated membership");
        }
        known
    }

    fn remove_everywhere(&mut self, source: &SourceId) {
        self.all.remove(source);
        self.outside.remove(source);
        self.undetermined.remove(source);
        for bucket in self.tiles.values_mut() {
            bucket.members.remove(source);
        }
    }

    pub fn area_id(&self) -> &str {
        &self.area_id
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Every classified source.
    pub fn all(&self) -> &BTreeSet<SourceId> {
        &self.all
    }

    pub fn outside(&self) -> &BTreeSet<SourceId> {
        &self.outside
    }

    pub fn undetermined(&self) -> &BTreeSet<SourceId> {
        &self.undetermined
    }

    pub fn tile_buckets(&self) -> &BTreeMap<TileId, TileBucket> {
        &self.tiles
    }

    /// Number of classified sources.
    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}
