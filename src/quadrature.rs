mod glq;
mod tables;

pub use glq::{gauss_legendre, scale_to_interval};

use crate::error::ErrorCategory;
use std::fmt;

/// Canonical reference-domain families with precomputed quadrature tables.
///
/// Reference conventions: the line is [−1, 1]; the triangle is the right
/// triangle with unit legs (area ½); the quadrilateral is [−1, 1]²; the
/// tetrahedron has unit legs (volume 1/6); the hexahedron is [−1, 1]³; the
/// prism is the reference triangle extruded over ζ ∈ [−1, 1]; the pyramid has
/// base [−1, 1]² at ζ = 0 and apex (0, 0, 1) (volume 4/3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefDomain {
    Line,
    Triangle,
    Quadrilateral,
    Tetrahedron,
    Hexahedron,
    Prism,
    Pyramid,
}

impl RefDomain {
    pub const ALL: [RefDomain; 7] = [
        Self::Line,
        Self::Triangle,
        Self::Quadrilateral,
        Self::Tetrahedron,
        Self::Hexahedron,
        Self::Prism,
        Self::Pyramid,
    ];

    /// Number of parametric axes (ξ / η / ζ) the domain uses
    pub fn dimension(&self) -> usize {
        match self {
            Self::Line => 1,
            Self::Triangle | Self::Quadrilateral => 2,
            Self::Tetrahedron | Self::Hexahedron | Self::Prism | Self::Pyramid => 3,
        }
    }

    /// Measure (length / area / volume) of the reference domain; every rule's
    /// weights sum to this.
    pub fn measure(&self) -> f64 {
        match self {
            Self::Line => 2.0,
            Self::Triangle => 0.5,
            Self::Quadrilateral => 4.0,
            Self::Tetrahedron => 1.0 / 6.0,
            Self::Hexahedron => 8.0,
            Self::Prism => 1.0,
            Self::Pyramid => 4.0 / 3.0,
        }
    }
}

impl fmt::Display for RefDomain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Line => write!(f, "Line"),
            Self::Triangle => write!(f, "Triangle"),
            Self::Quadrilateral => write!(f, "Quadrilateral"),
            Self::Tetrahedron => write!(f, "Tetrahedron"),
            Self::Hexahedron => write!(f, "Hexahedron"),
            Self::Prism => write!(f, "Prism"),
            Self::Pyramid => write!(f, "Pyramid"),
        }
    }
}

const AXIS_NAMES: [&str; 3] = ["ksi", "eta", "zeta"];

/// Lookup failures of the quadrature tables. Both are input errors: the
/// caller asked for an axis the domain does not have, or navigated below the
/// smallest available rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuadratureError {
    AxisNotDefined { domain: RefDomain, axis: usize },
    NoRuleBelow { domain: RefDomain, requested: usize },
}

impl QuadratureError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Input
    }
}

impl fmt::Display for QuadratureError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::AxisNotDefined { domain, axis } => write!(
                f,
                "{} rules have no {} axis; domain mismatch!",
                domain,
                AXIS_NAMES.get(*axis).unwrap_or(&"unknown")
            ),
            Self::NoRuleBelow { domain, requested } => write!(
                f,
                "No {} rule with {} or fewer points!",
                domain, requested
            ),
        }
    }
}

impl std::error::Error for QuadratureError {}

/// One fixed point/weight set over a reference domain.
#[derive(Clone, Debug)]
pub struct QuadratureRule {
    num_points: usize,
    degree: usize,
    coords: [Vec<f64>; 3],
    weights: Vec<f64>,
}

impl QuadratureRule {
    pub(crate) fn with(
        num_points: usize,
        degree: usize,
        coords: [Vec<f64>; 3],
        weights: Vec<f64>,
    ) -> Self {
        debug_assert_eq!(weights.len(), num_points);
        Self {
            num_points,
            degree,
            coords,
            weights,
        }
    }

    #[inline]
    pub fn num_points(&self) -> usize {
        self.num_points
    }

    /// Highest total polynomial degree integrated exactly
    #[inline]
    pub fn degree(&self) -> usize {
        self.degree
    }

    #[inline]
    pub fn ksi(&self) -> &[f64] {
        &self.coords[0]
    }

    #[inline]
    pub fn eta(&self) -> &[f64] {
        &self.coords[1]
    }

    #[inline]
    pub fn zeta(&self) -> &[f64] {
        &self.coords[2]
    }

    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

/// The fixed, sparse rule table of one reference-domain family.
///
/// Not every point count has a rule; lookups resolve to the nearest available
/// count at or above the request, clamped to the largest table.
pub struct QuadratureTable {
    domain: RefDomain,
    rules: Vec<QuadratureRule>,
}

impl QuadratureTable {
    pub(crate) fn with(domain: RefDomain, rules: Vec<QuadratureRule>) -> Self {
        debug_assert!(!rules.is_empty());
        debug_assert!(rules.windows(2).all(|w| w[0].num_points < w[1].num_points));
        debug_assert!(rules.windows(2).all(|w| w[0].degree <= w[1].degree));
        Self { domain, rules }
    }

    /// The table for a domain family (built once, on first use)
    pub fn for_domain(domain: RefDomain) -> &'static Self {
        tables::table(domain)
    }

    #[inline]
    pub fn domain(&self) -> RefDomain {
        self.domain
    }

    pub fn available_point_counts(&self) -> Vec<usize> {
        self.rules.iter().map(|r| r.num_points).collect()
    }

    fn largest(&self) -> &QuadratureRule {
        &self.rules[self.rules.len() - 1]
    }

    /// Smallest available point count whose rule integrates polynomials of the
    /// given total degree exactly. Monotonic non-decreasing in `order`; clamps
    /// to the largest table above the supported range.
    pub fn num_points_for_poly_order(&self, order: usize) -> usize {
        match self.rules.iter().find(|r| r.degree >= order) {
            Some(rule) => rule.num_points,
            None => self.largest().num_points,
        }
    }

    /// Nearest available point count at or above `n` (clamped to the largest)
    pub fn num_points_above(&self, n: usize) -> usize {
        match self.rules.iter().find(|r| r.num_points >= n) {
            Some(rule) => rule.num_points,
            None => self.largest().num_points,
        }
    }

    /// Nearest available point count at or below `n`; fails if the smallest
    /// table is larger than `n`.
    pub fn num_points_below(&self, n: usize) -> Result<usize, QuadratureError> {
        self.rules
            .iter()
            .rev()
            .find(|r| r.num_points <= n)
            .map(|r| r.num_points)
            .ok_or(QuadratureError::NoRuleBelow {
                domain: self.domain,
                requested: n,
            })
    }

    /// Full rule for the nearest available point count >= `num_points`
    /// (clamped to the largest table)
    pub fn rule(&self, num_points: usize) -> &QuadratureRule {
        match self.rules.iter().find(|r| r.num_points >= num_points) {
            Some(rule) => rule,
            None => self.largest(),
        }
    }

    fn axis(&self, axis: usize, num_points: usize) -> Result<&[f64], QuadratureError> {
        if axis >= self.domain.dimension() {
            return Err(QuadratureError::AxisNotDefined {
                domain: self.domain,
                axis,
            });
        }
        Ok(&self.rule(num_points).coords[axis])
    }

    pub fn ksi_coordinates(&self, num_points: usize) -> Result<&[f64], QuadratureError> {
        self.axis(0, num_points)
    }

    pub fn eta_coordinates(&self, num_points: usize) -> Result<&[f64], QuadratureError> {
        self.axis(1, num_points)
    }

    pub fn zeta_coordinates(&self, num_points: usize) -> Result<&[f64], QuadratureError> {
        self.axis(2, num_points)
    }

    pub fn weights(&self, num_points: usize) -> &[f64] {
        &self.rule(num_points).weights
    }
}
