//! Slide descriptors and sort keys.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

/// Numeric sort key for a slide. Integer and fractional orders share one space.
///
/// Always finite, so `total_cmp` agrees with the usual numeric ordering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OrderKey(f64);

impl OrderKey {
    /// Returns `None` for NaN and infinities.
    pub fn new(value: f64) -> Option<Self> {
        value.is_finite().then_some(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<u32> for OrderKey {
    fn from(value: u32) -> Self {
        Self(f64::from(value))
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One slide as seen by ordering and navigation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideDescriptor {
    pub id: String,
    pub title: String,
    pub order: OrderKey,
    /// Source filename, kept for diagnostics.
    pub filename: String,
}
