use derive_more::Display;
use serde::{Deserialize, Serialize};

/// A multiplicative cost discount constrained to [0.01, 1.0].
///
/// Applying it never increases a cost. NaN falls back to 1.0 (no discount).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct DiscountFactor(f64);

impl DiscountFactor {
    const MIN: f64 = 0.01;
    const MAX: f64 = 1.0;

    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(Self::MAX);
        }
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> f64 {
        self.0
    }

    pub fn apply(self, cost: f64) -> f64 {
        cost * self.0
    }
}

impl From<f64> for DiscountFactor {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<DiscountFactor> for f64 {
    fn from(value: DiscountFactor) -> Self {
        value.0
    }
}

impl Default for DiscountFactor {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Upper bound on a cell's elevation coefficient of variation, constrained to [0.0, 10.0]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct CvThreshold(f64);

impl CvThreshold {
    const MIN: f64 = 0.0;
    const MAX: f64 = 10.0;

    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(Self::MIN);
        }
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl From<f64> for CvThreshold {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<CvThreshold> for f64 {
    fn from(value: CvThreshold) -> Self {
        value.0
    }
}

impl Default for CvThreshold {
    fn default() -> Self {
        Self::new(0.5)
    }
}

/// A hexagon resolution constrained to [0, 15]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Resolution(u8);

impl Resolution {
    const MAX: u8 = 15;

    pub fn new(value: u8) -> Self {
        Self(value.min(Self::MAX))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl From<u8> for Resolution {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl From<Resolution> for u8 {
    fn from(value: Resolution) -> Self {
        value.0
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::new(11)
    }
}
