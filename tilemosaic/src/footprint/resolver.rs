//! Footprint computation and tile classification.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, trace};

use super::{Source, SourceUnusable};
use crate::domain::{ConfigError, Extent, IntersectionRule, TileGrid};
use crate::geo::{destination, projection_for_id, Projection};
use crate::lut::{MembershipCache, MembershipRecord};

/// Default footprint padding, in domain pixels.
pub const DEFAULT_PIXEL_BUFFER: u32 = 1;

/// Result of classifying one source.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub record: MembershipRecord,
    /// True when the record came from the membership table.
    pub cache_hit: bool,
}

/// Classifies sources against the domain and its tiles.
///
/// Geometry is only evaluated for sources the membership table has not seen;
/// every fresh classification is written back to the table.
pub struct FootprintResolver {
    grid: Arc<TileGrid>,
    projection: Arc<dyn Projection>,
    rule: IntersectionRule,
    pixel_buffer: u32,
}

impl FootprintResolver {
    pub fn new(grid: Arc<TileGrid>, projection: Arc<dyn Projection>) -> Self {
        Self {
            grid,
            projection,
            rule: IntersectionRule::default(),
            pixel_buffer: DEFAULT_PIXEL_BUFFER,
        }
    }

    /// Resolver using the projection named by the grid's domain.
    pub fn for_grid(grid: Arc<TileGrid>) -> Result<Self, ConfigError> {
        let projection = projection_for_id(grid.domain().projection())?;
        Ok(Self::new(grid, projection))
    }

    pub fn with_rule(mut self, rule: IntersectionRule) -> Self {
        self.rule = rule;
        self
    }

    /// Padding added around snapped footprints, in domain pixels.
    pub fn with_pixel_buffer(mut self, pixels: u32) -> Self {
        self.pixel_buffer = pixels;
        self
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn rule(&self) -> IntersectionRule {
        self.rule
    }

    /// Bounding box of the source's maximum-range ring in domain coordinates.
    ///
    /// The ring is sampled at `360 / nrays` degree steps (at least one
    /// sample). The box is snapped outward to whole domain pixels and padded.
    pub fn footprint(&self, source: &Source) -> Result<Extent, SourceUnusable> {
        let valid_origin = source.lon.is_finite()
            && source.lat.is_finite()
            && source.height.is_finite()
            && (-90.0..=90.0).contains(&source.lat);
        if !valid_origin {
            return Err(SourceUnusable::InvalidOrigin {
                source_id: source.id.clone(),
                lon: source.lon,
                lat: source.lat,
                height: source.height,
            });
        }
        if !(source.max_range.is_finite() && source.max_range > 0.0) {
            return Err(SourceUnusable::InvalidRange {
                source_id: source.id.clone(),
                range: source.max_range,
            });
        }

        let samples = source.nrays.max(1);
        let step = 360.0 / samples as f64;
        let mut bbox = Extent::empty();
        for i in 0..samples {
            let azimuth = i as f64 * step;
            let (lon, lat) = destination(
                source.lon,
                source.lat,
                source.height,
                source.max_range,
                azimuth,
            );
            let (x, y) = self
                .projection
                .forward(lon, lat)
                .ok_or_else(|| SourceUnusable::Unprojectable {
                    source_id: source.id.clone(),
                    azimuth,
                })?;
            bbox.include(x, y);
        }

        let footprint = self.grid.domain().snap_outward(&bbox, self.pixel_buffer);
        trace!(source_id = %source.id, footprint = %footprint, "Computed footprint");
        Ok(footprint)
    }

    /// Classify a footprint against the domain, then against every tile.
    pub fn classify_footprint(&self, footprint: &Extent) -> MembershipRecord {
        if !self.rule.intersects(footprint, self.grid.domain().extent()) {
            return MembershipRecord::Outside;
        }
        let tiles: BTreeSet<_> = self
            .grid
            .tiles()
            .iter()
            .filter(|tile| self.rule.intersects(footprint, tile.extent()))
            .map(|tile| tile.id().clone())
            .collect();
        MembershipRecord::Inside(tiles)
    }

    /// Classify a source, consulting the membership table first.
    ///
    /// Unusable sources are noted as undetermined in the table and returned
    /// as errors; the caller skips them. Ids the table cannot store are
    /// rejected without touching it.
    pub fn classify(
        &self,
        lut: &mut MembershipCache,
        source: &Source,
    ) -> Result<Classification, SourceUnusable> {
        if !source.id.is_storable() {
            return Err(SourceUnusable::InvalidId {
                source_id: source.id.clone(),
            });
        }

        if let Some(record) = lut.lookup(&source.id) {
            return Ok(Classification {
                record,
                cache_hit: true,
            });
        }

        let footprint = match self.footprint(source) {
            Ok(footprint) => footprint,
            Err(e) => {
                lut.mark_undetermined(&source.id);
                return Err(e);
            }
        };

        let record = self.classify_footprint(&footprint);
        match &record {
            MembershipRecord::Outside => {
                debug!(source_id = %source.id, "Source is outside the domain");
                lut.record(&source.id, &BTreeSet::new(), true);
            }
            MembershipRecord::Inside(tiles) => {
                debug!(source_id = %source.id, tiles = tiles.len(), "Source classified");
                lut.record(&source.id, tiles, false);
            }
        }

        Ok(Classification {
            record,
            cache_hit: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Domain, TileDef, TileId, DEFAULT_ALIGNMENT_TOLERANCE};
    use crate::geo::LonLatProjection;

    fn halves() -> Arc<TileGrid> {
        let domain =
            Domain::new("test", "lonlat", Extent::new(0.0, 0.0, 100.0, 100.0), 1.0, 1.0).unwrap();
        let defs = vec![
            TileDef::new("A", Extent::new(0.0, 0.0, 50.0, 100.0)),
            TileDef::new("B", Extent::new(50.0, 0.0, 100.0, 100.0)),
        ];
        Arc::new(TileGrid::new(domain, &defs, DEFAULT_ALIGNMENT_TOLERANCE).unwrap())
    }

    fn geographic() -> Arc<TileGrid> {
        let domain =
            Domain::new("geo", "lonlat", Extent::new(-10.0, 40.0, 10.0, 60.0), 0.1, 0.1).unwrap();
        Arc::new(TileGrid::regular(domain, 1, 2).unwrap())
    }

    fn tiles(ids: &[&str]) -> BTreeSet<TileId> {
        ids.iter().map(|s| TileId::new(*s)).collect()
    }

    #[test]
    fn test_straddling_footprint_joins_both_tiles() {
        let resolver = FootprintResolver::new(halves(), Arc::new(LonLatProjection));
        let record = resolver.classify_footprint(&Extent::new(40.0, 10.0, 60.0, 90.0));
        assert_eq!(record, MembershipRecord::Inside(tiles(&["test_A", "test_B"])));
    }

    #[test]
    fn test_far_footprint_is_outside() {
        let resolver = FootprintResolver::new(halves(), Arc::new(LonLatProjection));
        let record = resolver.classify_footprint(&Extent::new(200.0, 200.0, 220.0, 220.0));
        assert_eq!(record, MembershipRecord::Outside);
    }

    #[test]
    fn test_crossing_boxes_depend_on_rule() {
        // Tall thin footprint crossing the whole domain: no corner of either
        // box lies inside the other.
        let crossing = Extent::new(20.0, -10.0, 30.0, 110.0);
        let corners = FootprintResolver::new(halves(), Arc::new(LonLatProjection));
        assert_eq!(corners.classify_footprint(&crossing), MembershipRecord::Outside);

        let overlap = FootprintResolver::new(halves(), Arc::new(LonLatProjection))
            .with_rule(IntersectionRule::Overlap);
        assert_eq!(
            overlap.classify_footprint(&crossing),
            MembershipRecord::Inside(tiles(&["test_A"]))
        );
    }

    #[test]
    fn test_footprint_is_snapped_and_padded() {
        let resolver = FootprintResolver::for_grid(geographic()).unwrap();
        let source = Source::new("casbv", 0.0, 50.0, 0.0, 100_000.0, 360);
        let fp = resolver.footprint(&source).unwrap();

        // ~0.9 degrees of latitude, padded by one 0.1 degree pixel
        assert!(fp.max_y > 50.9 && fp.max_y < 51.2);
        assert!(fp.min_y > 48.8 && fp.min_y < 49.1);
        let pixels = (fp.max_x - fp.min_x) / 0.1;
        assert!((pixels - pixels.round()).abs() < 1e-6);
    }

    #[test]
    fn test_classify_records_and_hits_cache() {
        let resolver = FootprintResolver::for_grid(geographic()).unwrap();
        let mut lut = MembershipCache::new("geo");

        let straddling = Source::new("casbv", 0.0, 50.0, 0.0, 200_000.0, 360);
        let first = resolver.classify(&mut lut, &straddling).unwrap();
        assert!(!first.cache_hit);
        assert_eq!(
            first.record,
            MembershipRecord::Inside(tiles(&["geo_r0c0", "geo_r0c1"]))
        );

        let second = resolver.classify(&mut lut, &straddling).unwrap();
        assert!(second.cache_hit);
        assert_eq!(second.record, first.record);

        let west = Source::new("cawmn", -5.0, 50.0, 0.0, 100_000.0, 360);
        let record = resolver.classify(&mut lut, &west).unwrap().record;
        assert_eq!(record, MembershipRecord::Inside(tiles(&["geo_r0c0"])));

        let far = Source::new("usktlx", -170.0, 50.0, 0.0, 100_000.0, 360);
        let record = resolver.classify(&mut lut, &far).unwrap().record;
        assert_eq!(record, MembershipRecord::Outside);
        assert!(lut.outside().contains(&far.id));
    }

    #[test]
    fn test_unusable_source_is_undetermined() {
        let resolver = FootprintResolver::for_grid(geographic()).unwrap();
        let mut lut = MembershipCache::new("geo");

        let broken = Source::new("cxbad", 0.0, f64::NAN, 0.0, 100_000.0, 360);
        let err = resolver.classify(&mut lut, &broken).unwrap_err();
        assert!(matches!(err, SourceUnusable::InvalidOrigin { .. }));
        assert!(lut.undetermined().contains(&broken.id));
        assert_eq!(lut.lookup(&broken.id), None);

        let no_range = Source::new("cxnone", 0.0, 50.0, 0.0, 0.0, 360);
        let err = resolver.classify(&mut lut, &no_range).unwrap_err();
        assert_eq!(err.source_id().as_str(), "cxnone");
    }

    #[test]
    fn test_unstorable_id_is_rejected_every_time() {
        let resolver = FootprintResolver::for_grid(geographic()).unwrap();
        let mut lut = MembershipCache::new("geo");

        let source = Source::new("radar,north", 0.0, 50.0, 0.0, 100_000.0, 360);
        for _ in 0..2 {
            let err = resolver.classify(&mut lut, &source).unwrap_err();
            assert!(matches!(err, SourceUnusable::InvalidId { .. }));
        }
        assert!(lut.is_empty());
        assert!(lut.undetermined().is_empty());
        assert!(!lut.to_xml().unwrap().contains("north"));
    }

    #[test]
    fn test_zero_rays_still_samples_once() {
        let resolver = FootprintResolver::for_grid(geographic()).unwrap();
        let source = Source::new("casbv", 0.0, 50.0, 0.0, 100_000.0, 0);
        assert!(resolver.footprint(&source).is_ok());
    }
}
