//! Axis-aligned extents in projected coordinates.

use std::fmt;

/// Axis-aligned rectangle in domain projection coordinates.
///
/// Edges are inclusive for containment tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// Rule used to decide whether a footprint touches a target extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntersectionRule {
    /// Any corner of either box lies inside the other.
    ///
    /// Misses boxes that cross each other without any corner inside the
    /// other (a tall thin box over a wide flat one). Kept as the default so
    /// that classifications already persisted in a membership table stay
    /// consistent with new ones.
    #[default]
    Corners,
    /// Exact axis-aligned overlap (shared edges count).
    Overlap,
}

impl IntersectionRule {
    /// Parse a rule name as used in configuration files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "corners" | "corner" => Some(Self::Corners),
            "overlap" | "exact" => Some(Self::Overlap),
            _ => None,
        }
    }

    /// Configuration name of the rule.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Corners => "corners",
            Self::Overlap => "overlap",
        }
    }

    /// Apply the rule to a footprint and a target extent.
    pub fn intersects(&self, footprint: &Extent, target: &Extent) -> bool {
        match self {
            Self::Corners => footprint.corners_intersect(target),
            Self::Overlap => footprint.overlaps(target),
        }
    }
}

impl Extent {
    /// Create an extent from its lower-left and upper-right corners.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Extent that contains nothing; growing it with any point yields that point.
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Width in projection units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height in projection units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// True when every coordinate is finite and min < max on both axes.
    pub fn is_valid(&self) -> bool {
        [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite())
            && self.min_x < self.max_x
            && self.min_y < self.max_y
    }

    /// Grow the extent to include a point.
    pub fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Inclusive point containment.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// True when `other` lies entirely within this extent.
    pub fn contains(&self, other: &Extent) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    /// Corners in order lower-left, upper-left, upper-right, lower-right.
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.min_x, self.min_y),
            (self.min_x, self.max_y),
            (self.max_x, self.max_y),
            (self.max_x, self.min_y),
        ]
    }

    /// Loose symmetric corner-containment test.
    pub fn corners_intersect(&self, other: &Extent) -> bool {
        self.corners()
            .iter()
            .any(|&(x, y)| other.contains_point(x, y))
            || other
                .corners()
                .iter()
                .any(|&(x, y)| self.contains_point(x, y))
    }

    /// Exact overlap test; touching edges count as overlap.
    pub fn overlaps(&self, other: &Extent) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}
