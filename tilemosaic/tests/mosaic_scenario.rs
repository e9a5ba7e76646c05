//! Full generation cycles over a two-tile domain.
//!
//! ```text
//!  (0,100) ┌──────────┬──────────┐ (100,100)
//!          │ test_A   │ test_B   │
//!          │  west ●  ● mid ● east
//!          │          │          │
//!    (0,0) └──────────┴──────────┘ (100,0)
//! ```
//!
//! Sources sit at latitude 50 with ranges of a few degrees, so the
//! geographic grid doubles as a plain 1-unit pixel grid.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use image::{GrayImage, Luma};
use tempfile::TempDir;
use tilemosaic::composite::{CompositeError, Compositor, DispatchConfig, DispatchError};
use tilemosaic::domain::{
    Domain, Extent, SourceId, Tile, TileDef, TileGrid, TileId, DEFAULT_ALIGNMENT_TOLERANCE,
};
use tilemosaic::footprint::Source;
use tilemosaic::generator::{FailurePolicy, GeneratorOptions, MosaicError, MosaicGenerator};
use tilemosaic::geo::LonLatProjection;
use tilemosaic::lut::{LutError, MembershipCache};
use tilemosaic::raster::{QuantityLayer, QuantityMeta, TileRaster};

const NODATA: u8 = 255;

fn grid() -> Arc<TileGrid> {
    let domain =
        Domain::new("test", "lonlat", Extent::new(0.0, 0.0, 100.0, 100.0), 1.0, 1.0).unwrap();
    let defs = vec![
        TileDef::new("A", Extent::new(0.0, 0.0, 50.0, 100.0)),
        TileDef::new("B", Extent::new(50.0, 0.0, 100.0, 100.0)),
    ];
    Arc::new(TileGrid::new(domain, &defs, DEFAULT_ALIGNMENT_TOLERANCE).unwrap())
}

fn west() -> Source {
    Source::new("west", 20.0, 50.0, 0.0, 300_000.0, 72)
}

fn east() -> Source {
    Source::new("east", 80.0, 50.0, 0.0, 300_000.0, 72)
}

fn middle() -> Source {
    Source::new("mid", 50.0, 50.0, 0.0, 300_000.0, 72)
}

fn far() -> Source {
    Source::new("far", -120.0, 50.0, 0.0, 300_000.0, 72)
}

fn meta() -> QuantityMeta {
    QuantityMeta::new("DBZH", 0.5, -32.0, NODATA, 0)
}

/// Fills tile A with 10 + n and tile B with 20 + n, n being the source count.
fn filling(tile: &Tile, sources: &[SourceId]) -> Result<TileRaster, CompositeError> {
    let base = if tile.id().as_str().ends_with('A') { 10 } else { 20 };
    let size = tile.size();
    let data = GrayImage::from_pixel(
        size.width as u32,
        size.height as u32,
        Luma([base + sources.len() as u8]),
    );
    Ok(TileRaster::new(tile.id().clone(), size)
        .with_quantity(QuantityLayer::new(meta(), data))
        .with_contributors(sources.to_vec()))
}

fn generator(compositor: Arc<dyn Compositor>, options: GeneratorOptions) -> MosaicGenerator {
    MosaicGenerator::with_projection(grid(), Arc::new(LonLatProjection), compositor, options)
}

#[test]
fn test_two_tile_mosaic() {
    let temp = TempDir::new().unwrap();
    let mut lut = MembershipCache::with_path("test", temp.path().join("test_tile_node_LUT.xml"));
    let generator = generator(Arc::new(filling), GeneratorOptions::default());

    let generation = generator
        .generate(&[west(), east(), middle(), far()], &mut lut)
        .unwrap();
    let mosaic = &generation.mosaic;

    assert_eq!(mosaic.size.width, 100);
    assert_eq!(mosaic.size.height, 100);
    assert_eq!(mosaic.area_id, "test");
    assert!(mosaic.is_complete());

    let dbzh = mosaic.quantity("DBZH").unwrap();
    assert_eq!(dbzh.raw(50, 10), Some(12));
    assert_eq!(dbzh.raw(50, 49), Some(12));
    assert_eq!(dbzh.raw(50, 50), Some(22));
    assert_eq!(dbzh.raw(99, 99), Some(22));

    assert_eq!(mosaic.nodes_attribute(), "east,mid,west");
    assert_eq!(generation.outside, vec![SourceId::new("far")]);
    assert_eq!(generation.classified, 4);
    assert_eq!(generation.cache_hits, 0);
    assert!(temp.path().join("test_tile_node_LUT.xml").exists());
}

#[test]
fn test_empty_tile_gets_nodata_without_compositing() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let compositor = move |tile: &Tile, sources: &[SourceId]| {
        counted.fetch_add(1, Ordering::SeqCst);
        filling(tile, sources)
    };

    let mut lut = MembershipCache::new("test");
    let generation = generator(Arc::new(compositor), GeneratorOptions::default())
        .generate(&[west()], &mut lut)
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let dbzh = generation.mosaic.quantity("DBZH").unwrap();
    assert_eq!(dbzh.raw(50, 10), Some(11));
    assert_eq!(dbzh.raw(50, 80), Some(NODATA));
    assert_eq!(generation.mosaic.nodes_attribute(), "west");
}

#[test]
fn test_no_sources_yields_all_nodata_mosaic() {
    let mut lut = MembershipCache::new("test");
    let generation = generator(Arc::new(filling), GeneratorOptions::default())
        .generate(&[], &mut lut)
        .unwrap();

    let dbzh = generation.mosaic.quantity("DBZH").unwrap();
    assert_eq!(dbzh.raw(0, 0), Some(NODATA));
    assert_eq!(dbzh.raw(99, 99), Some(NODATA));
    assert!(generation.mosaic.provenance.is_empty());
}

fn failing_b(tile: &Tile, sources: &[SourceId]) -> Result<TileRaster, CompositeError> {
    if tile.id().as_str() == "test_B" {
        return Err(CompositeError::SourceData {
            source_id: sources[0].clone(),
            message: "truncated scan".to_string(),
        });
    }
    filling(tile, sources)
}

#[test]
fn test_abort_policy_fails_cycle_but_keeps_table() {
    let temp = TempDir::new().unwrap();
    let lut_path = temp.path().join("test_tile_node_LUT.xml");
    let mut lut = MembershipCache::with_path("test", &lut_path);

    let result = generator(Arc::new(failing_b), GeneratorOptions::default())
        .generate(&[west(), east()], &mut lut);

    match result {
        Err(MosaicError::TileFailed(failure)) => {
            assert_eq!(failure.tile_id, TileId::new("test_B"));
            assert_eq!(failure.sources, vec![SourceId::new("east")]);
        }
        other => panic!("expected tile failure, got {:?}", other.map(|g| g.mosaic.size)),
    }

    let reloaded = MembershipCache::load("test", &lut_path).unwrap();
    assert_eq!(reloaded.len(), 2);
}

#[test]
fn test_allow_partial_lists_missing_tiles() {
    let options = GeneratorOptions {
        failure_policy: FailurePolicy::AllowPartial,
        ..Default::default()
    };
    let mut lut = MembershipCache::new("test");
    let generation = generator(Arc::new(failing_b), options)
        .generate(&[west(), east()], &mut lut)
        .unwrap();

    let mosaic = &generation.mosaic;
    assert!(!mosaic.is_complete());
    assert_eq!(mosaic.missing_tiles, vec![TileId::new("test_B")]);
    assert_eq!(generation.failures.len(), 1);

    let dbzh = mosaic.quantity("DBZH").unwrap();
    assert_eq!(dbzh.raw(50, 10), Some(11));
    assert_eq!(dbzh.raw(50, 80), Some(NODATA));
    assert_eq!(mosaic.nodes_attribute(), "west");
}

#[test]
fn test_panicking_tile_is_reported_as_failure() {
    let compositor = |tile: &Tile, sources: &[SourceId]| {
        if tile.id().as_str() == "test_A" {
            panic!("corrupt polar volume");
        }
        filling(tile, sources)
    };
    let options = GeneratorOptions {
        failure_policy: FailurePolicy::AllowPartial,
        ..Default::default()
    };
    let mut lut = MembershipCache::new("test");
    let generation = generator(Arc::new(compositor), options)
        .generate(&[west(), east()], &mut lut)
        .unwrap();

    assert_eq!(generation.failures.len(), 1);
    let failure = &generation.failures[0];
    assert_eq!(failure.tile_id, TileId::new("test_A"));
    match &failure.error {
        CompositeError::Panicked { message, .. } => {
            assert!(message.contains("corrupt polar volume"))
        }
        other => panic!("expected panic failure, got {:?}", other),
    }
}

#[test]
fn test_stuck_tile_times_out() {
    let compositor = |tile: &Tile, sources: &[SourceId]| {
        if tile.id().as_str() == "test_B" {
            thread::sleep(Duration::from_secs(2));
        }
        filling(tile, sources)
    };
    let options = GeneratorOptions {
        dispatch: DispatchConfig::default().with_timeout(Duration::from_millis(200)),
        ..Default::default()
    };
    let mut lut = MembershipCache::new("test");
    let result = generator(Arc::new(compositor), options).generate(&[west(), east()], &mut lut);

    match result {
        Err(MosaicError::Dispatch(DispatchError::Timeout { pending, .. })) => {
            assert_eq!(pending, vec![TileId::new("test_B")]);
        }
        other => panic!("expected timeout, got {:?}", other.map(|g| g.mosaic.size)),
    }
}

#[test]
fn test_sequential_matches_parallel() {
    let sources = [west(), east(), middle()];

    let mut lut = MembershipCache::new("test");
    let parallel = generator(Arc::new(filling), GeneratorOptions::default())
        .generate(&sources, &mut lut)
        .unwrap();

    let options = GeneratorOptions {
        dispatch: DispatchConfig::default().with_sequential(true),
        ..Default::default()
    };
    let mut lut = MembershipCache::new("test");
    let sequential = generator(Arc::new(filling), options)
        .generate(&sources, &mut lut)
        .unwrap();

    assert_eq!(
        parallel.mosaic.quantity("DBZH").unwrap().data,
        sequential.mosaic.quantity("DBZH").unwrap().data
    );
    assert_eq!(parallel.mosaic.provenance, sequential.mosaic.provenance);
}

#[test]
fn test_table_of_other_area_is_rejected() {
    let mut lut = MembershipCache::new("elsewhere");
    let result = generator(Arc::new(filling), GeneratorOptions::default())
        .generate(&[west()], &mut lut);
    assert!(matches!(
        result,
        Err(MosaicError::Lut(LutError::AreaMismatch { .. }))
    ));
}
