use serde::{Deserialize, Serialize};

use crate::color::{Color, ColorScale};
use crate::error::{OverlayError, Result};
use crate::ingest::DEFAULT_VALUE_ALIASES;

/// Opacity slider range.
pub const MIN_OPACITY: f64 = 0.2;
pub const MAX_OPACITY: f64 = 1.0;

/// Outline colour and line width in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f64,
}

/// Overlay configuration.
/// Defaults match the dashboard's field view; every field may be omitted in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Clustering grid cell size in degrees.
    pub simplification_factor: f64,
    /// Pixels added around the viewport before tessellating.
    pub viewport_margin: f64,
    pub color_scale: ColorScale,
    /// Global fill alpha, 0.2–1.0.
    pub opacity: f64,
    /// Record properties tried, in order, for the index reading.
    pub value_aliases: Vec<String>,
    pub boundary_style: StrokeStyle,
    pub separator_style: StrokeStyle,
    /// Draw a dot at every raw sample.
    pub show_sample_markers: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            simplification_factor: 0.001,
            viewport_margin: 100.0,
            color_scale: ColorScale::default(),
            opacity: 0.8,
            value_aliases: DEFAULT_VALUE_ALIASES.iter().map(|s| s.to_string()).collect(),
            boundary_style: StrokeStyle { color: Color::rgba(255, 255, 255, 0.8), width: 2.0 },
            separator_style: StrokeStyle { color: Color::rgba(255, 255, 255, 0.3), width: 0.5 },
            show_sample_markers: false,
        }
    }
}

impl OverlayConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| OverlayError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.simplification_factor.is_finite() && self.simplification_factor > 0.0) {
            return Err(OverlayError::InvalidConfig(format!(
                "simplification_factor must be positive, got {}",
                self.simplification_factor
            )));
        }
        if !(self.viewport_margin.is_finite() && self.viewport_margin >= 0.0) {
            return Err(OverlayError::InvalidConfig(format!(
                "viewport_margin must be non-negative, got {}",
                self.viewport_margin
            )));
        }
        if !(MIN_OPACITY..=MAX_OPACITY).contains(&self.opacity) {
            return Err(OverlayError::InvalidConfig(format!(
                "opacity must be within [{MIN_OPACITY}, {MAX_OPACITY}], got {}",
                self.opacity
            )));
        }
        if self.value_aliases.is_empty() {
            return Err(OverlayError::InvalidConfig("value_aliases is empty".into()));
        }
        for style in [&self.boundary_style, &self.separator_style] {
            if !(style.width.is_finite() && style.width >= 0.0) {
                return Err(OverlayError::InvalidConfig(format!(
                    "stroke width must be non-negative, got {}",
                    style.width
                )));
            }
        }
        self.color_scale.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = OverlayConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.simplification_factor, 0.001);
        assert_eq!(c.viewport_margin, 100.0);
        assert_eq!(c.opacity, 0.8);
        assert_eq!(c.value_aliases[0], "NDVI_2023-06-14");
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let c = OverlayConfig::from_json(r#"{ "simplification_factor": 0.0005, "opacity": 0.5 }"#)
            .unwrap();
        assert_eq!(c.simplification_factor, 0.0005);
        assert_eq!(c.opacity, 0.5);
        assert_eq!(c.viewport_margin, 100.0);
        assert_eq!(c.color_scale, ColorScale::default());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for json in [
            r#"{ "simplification_factor": 0 }"#,
            r#"{ "viewport_margin": -1 }"#,
            r#"{ "opacity": 0.1 }"#,
            r#"{ "value_aliases": [] }"#,
            r#"{ "opacity": "high" }"#,
        ] {
            assert!(
                matches!(OverlayConfig::from_json(json), Err(OverlayError::InvalidConfig(_))),
                "{json} should be rejected"
            );
        }
    }
}
