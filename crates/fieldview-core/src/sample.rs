use serde::{Deserialize, Serialize};

use crate::geo::LatLng;

/// Upper end of the normalised intensity scale.
pub const VALUE_MAX: f64 = 100.0;

/// A geolocated vegetation-index measurement.
/// `value` is on the 0–100 scale; coordinates are finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub lat: f64,
    pub lng: f64,
    pub value: f64,
}

impl Sample {
    /// Build a sample from a raw index reading, or `None` if any component is not finite.
    pub fn from_raw(lat: f64, lng: f64, raw_value: f64) -> Option<Self> {
        if !lat.is_finite() || !lng.is_finite() || !raw_value.is_finite() {
            return None;
        }
        Some(Self { lat, lng, value: normalize_value(raw_value) })
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// Map a raw reading onto `[0, 100]`.
///
/// Readings above 1 are taken as already percentage-scaled; anything else is a
/// fractional index and is multiplied by 100. Both are clamped.
pub fn normalize_value(raw: f64) -> f64 {
    let scaled = if raw > 1.0 { raw } else { raw * 100.0 };
    scaled.clamp(0.0, VALUE_MAX)
}
