//! Per-tile compositing seam.

use std::sync::Arc;

use tracing::{debug, info_span};

use super::CompositeError;
use crate::domain::{SourceId, Tile};
use crate::raster::{LayerTemplate, TileRaster};

/// Reduces the sources assigned to a tile into one tile raster.
///
/// The per-pixel reduction across overlapping sources, and fetching each
/// source's measurements, belong to the implementation. Invocations for
/// different tiles run concurrently and must not share mutable state.
pub trait Compositor: Send + Sync {
    fn composite(&self, tile: &Tile, sources: &[SourceId]) -> Result<TileRaster, CompositeError>;
}

impl<F> Compositor for F
where
    F: Fn(&Tile, &[SourceId]) -> Result<TileRaster, CompositeError> + Send + Sync,
{
    fn composite(&self, tile: &Tile, sources: &[SourceId]) -> Result<TileRaster, CompositeError> {
        self(tile, sources)
    }
}

/// Wraps a [`Compositor`] with the checks every tile result must pass.
///
/// Tiles without sources never reach the inner compositor: they get an
/// all-nodata raster shaped by the layer template.
pub struct TileCompositor {
    inner: Arc<dyn Compositor>,
    template: LayerTemplate,
}

impl TileCompositor {
    pub fn new(inner: Arc<dyn Compositor>, template: LayerTemplate) -> Self {
        Self { inner, template }
    }

    pub fn template(&self) -> &LayerTemplate {
        &self.template
    }

    pub fn composite(
        &self,
        tile: &Tile,
        sources: &[SourceId],
    ) -> Result<TileRaster, CompositeError> {
        let _span = info_span!("tile", tile_id = %tile.id()).entered();

        if sources.is_empty() {
            debug!("No sources, using empty raster");
            return Ok(self.template.empty_raster(tile));
        }

        let mut raster = self.inner.composite(tile, sources)?;
        if raster.tile_id != *tile.id() {
            return Err(CompositeError::WrongTile {
                expected: tile.id().clone(),
                found: raster.tile_id,
            });
        }
        if raster.size != tile.size() {
            return Err(CompositeError::ShapeMismatch {
                tile_id: tile.id().clone(),
                layer: "raster".to_string(),
                expected: tile.size(),
                actual: raster.size,
            });
        }
        if let Some((layer, actual)) = raster.shape_mismatch() {
            return Err(CompositeError::ShapeMismatch {
                tile_id: tile.id().clone(),
                layer,
                expected: tile.size(),
                actual,
            });
        }
        if raster.contributors.is_empty() {
            raster.contributors = sources.to_vec();
        }

        debug!(
            sources = sources.len(),
            quantities = raster.quantities.len(),
            "Composited tile"
        );
        Ok(raster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Domain, Extent, PixelSize, TileGrid, TileId};
    use crate::raster::{QuantityLayer, QuantityMeta};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tile() -> Tile {
        let domain =
            Domain::new("test", "lonlat", Extent::new(0.0, 0.0, 100.0, 100.0), 1.0, 1.0).unwrap();
        TileGrid::regular(domain, 1, 2).unwrap().tiles()[0].clone()
    }

    fn meta() -> QuantityMeta {
        QuantityMeta::new("DBZH", 0.5, -32.0, 255, 0)
    }

    struct CountingCompositor {
        calls: AtomicUsize,
        size: PixelSize,
    }

    impl Compositor for CountingCompositor {
        fn composite(
            &self,
            tile: &Tile,
            _sources: &[SourceId],
        ) -> Result<TileRaster, CompositeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TileRaster::new(tile.id().clone(), tile.size())
                .with_quantity(QuantityLayer::filled(meta(), self.size)))
        }
    }

    #[test]
    fn test_empty_tile_skips_inner_compositor() {
        let inner = Arc::new(CountingCompositor {
            calls: AtomicUsize::new(0),
            size: PixelSize::new(50, 100),
        });
        let compositor = TileCompositor::new(inner.clone(), LayerTemplate::default());
        let raster = compositor.composite(&tile(), &[]).unwrap();

        assert_eq!(raster.size, PixelSize::new(50, 100));
        assert!(raster.quantity("DBZH").is_some());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_contributors_default_to_assigned_sources() {
        let inner = Arc::new(CountingCompositor {
            calls: AtomicUsize::new(0),
            size: PixelSize::new(50, 100),
        });
        let compositor = TileCompositor::new(inner.clone(), LayerTemplate::default());
        let sources = vec![SourceId::new("casbv"), SourceId::new("cawmn")];
        let raster = compositor.composite(&tile(), &sources).unwrap();

        assert_eq!(raster.contributors, sources);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        let inner = Arc::new(CountingCompositor {
            calls: AtomicUsize::new(0),
            size: PixelSize::new(50, 99),
        });
        let compositor = TileCompositor::new(inner, LayerTemplate::default());
        let err = compositor
            .composite(&tile(), &[SourceId::new("casbv")])
            .unwrap_err();
        assert!(matches!(err, CompositeError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_raster_for_other_tile_is_rejected() {
        let closure = |tile: &Tile, _: &[SourceId]| -> Result<TileRaster, CompositeError> {
            Ok(TileRaster::new(TileId::new("test_r0c1"), tile.size()))
        };
        let compositor = TileCompositor::new(Arc::new(closure), LayerTemplate::default());
        let err = compositor
            .composite(&tile(), &[SourceId::new("casbv")])
            .unwrap_err();
        assert_eq!(
            err,
            CompositeError::WrongTile {
                expected: TileId::new("test_r0c0"),
                found: TileId::new("test_r0c1"),
            }
        );
    }

    #[test]
    fn test_closure_compositor() {
        let closure = |tile: &Tile, _: &[SourceId]| -> Result<TileRaster, CompositeError> {
            Err(CompositeError::Failed {
                tile_id: tile.id().clone(),
                message: "no data".to_string(),
            })
        };
        let compositor = TileCompositor::new(Arc::new(closure), LayerTemplate::default());
        let err = compositor
            .composite(&tile(), &[SourceId::new("casbv")])
            .unwrap_err();
        assert_eq!(
            err,
            CompositeError::Failed {
                tile_id: TileId::new("test_r0c0"),
                message: "no data".to_string()
            }
        );
    }
}
