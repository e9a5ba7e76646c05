//! Grouping of sources by tile.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::domain::{SourceId, TileId};
use crate::footprint::{FootprintResolver, Source, SourceUnusable};
use crate::lut::{LutError, MembershipCache, MembershipRecord};

/// Sources grouped by the tiles they contribute to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    /// Every tile of the grid, with its sources in input order.
    pub tiles: BTreeMap<TileId, Vec<SourceId>>,
    /// Sources whose footprint misses the domain.
    pub outside: Vec<SourceId>,
    /// Sources skipped this cycle because their geometry is unusable.
    pub unusable: Vec<SourceUnusable>,
    /// Classifications answered by the membership table.
    pub cache_hits: usize,
    /// Classifications that evaluated geometry.
    pub classified: usize,
}

impl Partition {
    /// Sources assigned to a tile; empty for unknown tiles.
    pub fn sources_for(&self, tile: &TileId) -> &[SourceId] {
        self.tiles.get(tile).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Tiles without any assigned source.
    pub fn empty_tiles(&self) -> impl Iterator<Item = &TileId> {
        self.tiles
            .iter()
            .filter(|(_, sources)| sources.is_empty())
            .map(|(id, _)| id)
    }
}

/// Runs the footprint resolver over a batch of sources.
///
/// The only component that mutates the membership table: classification and
/// the single persist at the end happen on the calling thread.
pub struct TilePartitioner {
    resolver: Arc<FootprintResolver>,
}

impl TilePartitioner {
    pub fn new(resolver: Arc<FootprintResolver>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &FootprintResolver {
        &self.resolver
    }

    /// Classify every source and group ids by tile, then persist the table.
    ///
    /// Unusable sources are logged and skipped. A source id that appears
    /// more than once is only partitioned on its first occurrence.
    pub fn partition(
        &self,
        sources: &[Source],
        lut: &mut MembershipCache,
    ) -> Result<Partition, LutError> {
        let start = Instant::now();
        let grid = self.resolver.grid();

        lut.register_tiles(grid);
        for stale in lut.stale_tiles(grid) {
            warn!(tile_id = %stale, "Membership table has a bucket for a tile not in the grid");
        }

        let mut partition = Partition {
            tiles: grid.ids().map(|id| (id.clone(), Vec::new())).collect(),
            ..Default::default()
        };
        let mut seen = HashSet::with_capacity(sources.len());

        for source in sources {
            if !seen.insert(&source.id) {
                warn!(source_id = %source.id, "Duplicate source in batch, skipping");
                continue;
            }

            let classification = match self.resolver.classify(lut, source) {
                Ok(classification) => classification,
                Err(e) => {
                    warn!(source_id = %source.id, error = %e, "Skipping unusable source");
                    partition.unusable.push(e);
                    continue;
                }
            };

            if classification.cache_hit {
                partition.cache_hits += 1;
            } else {
                partition.classified += 1;
            }

            match classification.record {
                MembershipRecord::Outside => partition.outside.push(source.id.clone()),
                MembershipRecord::Inside(tiles) => {
                    for tile in tiles {
                        match partition.tiles.get_mut(&tile) {
                            Some(members) => members.push(source.id.clone()),
                            None => debug!(
                                source_id = %source.id,
                                tile_id = %tile,
                                "Ignoring membership in unknown tile"
                            ),
                        }
                    }
                }
            }
        }

        lut.persist()?;

        info!(
            sources = sources.len(),
            cache_hits = partition.cache_hits,
            classified = partition.classified,
            outside = partition.outside.len(),
            unusable = partition.unusable.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Partitioned sources"
        );
        Ok(partition)
    }
}
