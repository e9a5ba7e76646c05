//! One mosaic generation cycle, end to end.
//!
//! ```text
//!  sources ──► TilePartitioner ──► TileDispatcher ──► MosaicMerger ──► MosaicRaster
//!                 │    ▲              (N workers)
//!                 ▼    │
//!             MembershipCache
//! ```
//!
//! Classification, partitioning and merging run on the calling thread; only
//! tile compositing fans out.

mod error;

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

pub use error::MosaicError;

use crate::composite::{Compositor, DispatchConfig, TileCompositor, TileDispatcher, TileFailure};
use crate::config::MosaicConfig;
use crate::domain::{ConfigError, IntersectionRule, SourceId, TileGrid};
use crate::footprint::{FootprintResolver, Source, SourceUnusable, DEFAULT_PIXEL_BUFFER};
use crate::geo::{projection_for_id, Projection};
use crate::lut::{LutError, MembershipCache};
use crate::merge::MosaicMerger;
use crate::partition::TilePartitioner;
use crate::raster::{LayerTemplate, MosaicRaster};

/// What to do when some tiles fail to composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Fail the whole cycle with the first failed tile.
    #[default]
    Abort,
    /// Merge the remaining tiles and list the failed ones on the mosaic.
    AllowPartial,
}

impl FailurePolicy {
    /// Parse a policy name as used in configuration files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace('-', "_").as_str() {
            "abort" => Some(Self::Abort),
            "allow_partial" | "partial" => Some(Self::AllowPartial),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Abort => "abort",
            Self::AllowPartial => "allow_partial",
        }
    }
}

/// Tunables of a generator.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorOptions {
    pub rule: IntersectionRule,
    /// Footprint padding in domain pixels
    pub pixel_buffer: u32,
    pub dispatch: DispatchConfig,
    pub failure_policy: FailurePolicy,
    pub template: LayerTemplate,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            rule: IntersectionRule::default(),
            pixel_buffer: DEFAULT_PIXEL_BUFFER,
            dispatch: DispatchConfig::default(),
            failure_policy: FailurePolicy::default(),
            template: LayerTemplate::default(),
        }
    }
}

impl From<&MosaicConfig> for GeneratorOptions {
    fn from(config: &MosaicConfig) -> Self {
        let generation = &config.generation;
        let mut dispatch = DispatchConfig::default()
            .with_workers(generation.workers)
            .with_sequential(generation.sequential);
        dispatch.timeout = generation.timeout();

        Self {
            rule: config.footprint.rule,
            pixel_buffer: config.footprint.pixel_buffer,
            dispatch,
            failure_policy: generation.failure_policy,
            template: config.layer_template(),
        }
    }
}

/// Outcome of a successful cycle.
#[derive(Debug)]
pub struct Generation {
    pub mosaic: MosaicRaster,
    /// Sources whose footprint misses the domain
    pub outside: Vec<SourceId>,
    /// Sources skipped because their geometry is unusable
    pub unusable: Vec<SourceUnusable>,
    /// Tiles that failed under [`FailurePolicy::AllowPartial`]
    pub failures: Vec<TileFailure>,
    pub cache_hits: usize,
    pub classified: usize,
}

/// Wires partitioning, dispatch and merging over one tile grid.
pub struct MosaicGenerator {
    grid: Arc<TileGrid>,
    partitioner: TilePartitioner,
    dispatcher: TileDispatcher,
    merger: MosaicMerger,
    policy: FailurePolicy,
}

impl MosaicGenerator {
    /// Generator using the projection named by the grid's domain.
    pub fn new(
        grid: Arc<TileGrid>,
        compositor: Arc<dyn Compositor>,
        options: GeneratorOptions,
    ) -> Result<Self, ConfigError> {
        let projection = projection_for_id(grid.domain().projection())?;
        Ok(Self::with_projection(grid, projection, compositor, options))
    }

    pub fn with_projection(
        grid: Arc<TileGrid>,
        projection: Arc<dyn Projection>,
        compositor: Arc<dyn Compositor>,
        options: GeneratorOptions,
    ) -> Self {
        let resolver = FootprintResolver::new(Arc::clone(&grid), projection)
            .with_rule(options.rule)
            .with_pixel_buffer(options.pixel_buffer);
        let compositor = Arc::new(TileCompositor::new(compositor, options.template));

        Self {
            partitioner: TilePartitioner::new(Arc::new(resolver)),
            dispatcher: TileDispatcher::new(compositor, options.dispatch),
            merger: MosaicMerger::new(Arc::clone(&grid)),
            policy: options.failure_policy,
            grid,
        }
    }

    /// Build the grid and generator described by a configuration.
    pub fn from_config(
        config: &MosaicConfig,
        compositor: Arc<dyn Compositor>,
    ) -> Result<Self, MosaicError> {
        let grid = Arc::new(config.build_grid()?);
        Ok(Self::new(grid, compositor, GeneratorOptions::from(config))?)
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Run one cycle: classify, partition, composite every tile, merge.
    ///
    /// The membership table is updated and persisted once, before any tile
    /// is composited, so classifications survive a failed cycle.
    pub fn generate(
        &self,
        sources: &[Source],
        lut: &mut MembershipCache,
    ) -> Result<Generation, MosaicError> {
        let start = Instant::now();
        let area_id = self.grid.domain().area_id();
        if lut.area_id() != area_id {
            return Err(LutError::AreaMismatch {
                expected: area_id.to_string(),
                found: lut.area_id().to_string(),
            }
            .into());
        }

        let partition = self.partitioner.partition(sources, lut)?;
        let outcome = self.dispatcher.dispatch(&self.grid, &partition)?;

        for failure in &outcome.failures {
            error!(
                tile_id = %failure.tile_id,
                sources = failure.sources.len(),
                error = %failure.error,
                "Tile compositing failed"
            );
        }

        let missing = match (self.policy, outcome.failures.first()) {
            (FailurePolicy::Abort, Some(first)) => {
                return Err(MosaicError::TileFailed(Box::new(first.clone())));
            }
            (FailurePolicy::AllowPartial, Some(_)) => {
                warn!(
                    missing = outcome.failures.len(),
                    "Merging partial mosaic"
                );
                outcome.failures.iter().map(|f| f.tile_id.clone()).collect()
            }
            (_, None) => Vec::new(),
        };

        let mosaic = self.merger.merge(outcome.rasters, missing)?;

        info!(
            area_id,
            contributors = mosaic.provenance.len(),
            outside = partition.outside.len(),
            unusable = partition.unusable.len(),
            missing = mosaic.missing_tiles.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Generated mosaic"
        );

        Ok(Generation {
            mosaic,
            outside: partition.outside,
            unusable: partition.unusable,
            failures: outcome.failures,
            cache_hits: partition.cache_hits,
            classified: partition.classified,
        })
    }
}
