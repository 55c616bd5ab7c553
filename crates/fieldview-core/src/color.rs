//! Discrete colour scale for vegetation intensity.

use serde::{Deserialize, Serialize};

use crate::error::{OverlayError, Result};
use crate::sample::VALUE_MAX;

/// sRGB colour with straight (non-premultiplied) alpha in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub rgb: [u8; 3],
    pub alpha: f64,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, alpha: f64) -> Self {
        Self { rgb: [r, g, b], alpha }
    }

    /// Same colour with alpha multiplied by `k` (a canvas global alpha).
    pub fn scaled_alpha(self, k: f64) -> Self {
        Self { rgb: self.rgb, alpha: (self.alpha * k).clamp(0.0, 1.0) }
    }

    /// CSS `rgba()` form, for replay on an HTML canvas.
    pub fn to_css(self) -> String {
        let [r, g, b] = self.rgb;
        format!("rgba({r}, {g}, {b}, {})", self.alpha)
    }
}

/// Values whose normalised intensity is `<= upper` (and above the previous
/// bucket) take `color`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorBucket {
    pub upper: f64,
    pub color: Color,
    pub label: String,
}

/// Ordered buckets; the last one also catches anything above its bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorScale {
    pub buckets: Vec<ColorBucket>,
}

impl Default for ColorScale {
    fn default() -> Self {
        let bucket = |upper: f64, color: Color, label: &str| ColorBucket {
            upper,
            color,
            label: label.to_string(),
        };
        Self {
            buckets: vec![
                bucket(0.2, Color::rgba(0, 0, 255, 0.7), "Low"),
                bucket(0.4, Color::rgba(0, 255, 0, 0.7), "Healthy vegetation"),
                bucket(0.6, Color::rgba(255, 255, 0, 0.7), "Moderate vegetation"),
                bucket(0.8, Color::rgba(255, 165, 0, 0.7), "High"),
                bucket(1.0, Color::rgba(255, 0, 0, 0.7), "Very high"),
            ],
        }
    }
}

/// One legend row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub upper: f64,
    pub color: Color,
}

impl ColorScale {
    pub fn validate(&self) -> Result<()> {
        if self.buckets.is_empty() {
            return Err(OverlayError::InvalidConfig("colour scale has no buckets".into()));
        }
        for pair in self.buckets.windows(2) {
            if !(pair[0].upper < pair[1].upper) {
                return Err(OverlayError::InvalidConfig(format!(
                    "colour thresholds must increase: {} then {}",
                    pair[0].upper, pair[1].upper
                )));
            }
        }
        if self.buckets.iter().any(|b| !(0.0..=1.0).contains(&b.color.alpha)) {
            return Err(OverlayError::InvalidConfig("colour alpha must be within [0, 1]".into()));
        }
        Ok(())
    }

    /// Colour for a sample value on the 0–100 scale.
    pub fn resolve(&self, value: f64) -> Color {
        self.resolve_normalized(value / VALUE_MAX)
    }

    /// Colour for an intensity on the 0–1 scale; bucket bounds are inclusive.
    pub fn resolve_normalized(&self, normalized: f64) -> Color {
        self.buckets
            .iter()
            .find(|b| normalized <= b.upper)
            .or_else(|| self.buckets.last())
            .map(|b| b.color)
            .unwrap_or(Color::rgba(0, 0, 0, 0.0))
    }

    pub fn legend(&self) -> Vec<LegendEntry> {
        self.buckets
            .iter()
            .map(|b| LegendEntry { label: b.label.clone(), upper: b.upper, color: b.color })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLUE: [u8; 3] = [0, 0, 255];
    const GREEN: [u8; 3] = [0, 255, 0];
    const YELLOW: [u8; 3] = [255, 255, 0];
    const ORANGE: [u8; 3] = [255, 165, 0];
    const RED: [u8; 3] = [255, 0, 0];

    #[test]
    fn bucket_bounds_are_inclusive_below() {
        let scale = ColorScale::default();
        let cases = [
            (0.0, BLUE),
            (0.2, BLUE),
            (0.2000001, GREEN),
            (0.4, GREEN),
            (0.4000001, YELLOW),
            (0.6, YELLOW),
            (0.6000001, ORANGE),
            (0.8, ORANGE),
            (0.8000001, RED),
            (1.0, RED),
        ];
        for (n, rgb) in cases {
            assert_eq!(scale.resolve_normalized(n).rgb, rgb, "normalised {n}");
        }
    }

    #[test]
    fn sample_values_are_normalised_by_100() {
        let scale = ColorScale::default();
        assert_eq!(scale.resolve(20.0).rgb, BLUE);
        assert_eq!(scale.resolve(61.0).rgb, ORANGE);
        assert_eq!(scale.resolve(90.0).rgb, RED);
        assert_eq!(scale.resolve(100.0).rgb, RED);
    }

    #[test]
    fn values_above_the_last_bound_take_the_last_colour() {
        let scale = ColorScale::default();
        assert_eq!(scale.resolve_normalized(3.0).rgb, RED);
    }

    #[test]
    fn legend_lists_every_bucket() {
        let legend = ColorScale::default().legend();
        let uppers: Vec<f64> = legend.iter().map(|e| e.upper).collect();
        assert_eq!(uppers, vec![0.2, 0.4, 0.6, 0.8, 1.0]);
        assert_eq!(legend[1].label, "Healthy vegetation");
    }

    #[test]
    fn unordered_thresholds_fail_validation() {
        let mut scale = ColorScale::default();
        assert!(scale.validate().is_ok());
        scale.buckets.swap(1, 2);
        assert!(scale.validate().is_err());
        assert!(ColorScale { buckets: vec![] }.validate().is_err());
    }

    #[test]
    fn css_form_and_alpha_scaling() {
        let c = Color::rgba(255, 165, 0, 0.7);
        assert_eq!(c.to_css(), "rgba(255, 165, 0, 0.7)");
        assert!((c.scaled_alpha(0.5).alpha - 0.35).abs() < 1e-12);
    }
}
