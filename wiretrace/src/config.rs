//! Tunable heuristics for line extraction, classification and matching.
//!
//! All thresholds are in pixels unless the name says otherwise. Defaults are
//! calibrated for schematics scanned or exported at roughly 100 DPI.

use serde::{Deserialize, Serialize};

use crate::core::WiretraceError;

const MAX_BLOCK_SIZE: u32 = 255;
const MAX_CLOSING_KERNEL: u32 = 63;

/// Configuration for every heuristic stage of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    // Preprocessing
    pub blur_sigma: f32,
    /// Side of the square window used for local thresholding (odd, >= 3).
    pub adaptive_block_size: u32,
    /// Offset subtracted from the local mean before comparison.
    pub adaptive_offset: f32,
    pub closing_kernel: u32,

    // Probabilistic Hough transform
    pub hough_rho: f64,
    pub hough_theta_degrees: f64,
    pub hough_threshold: u32,
    pub min_line_length: u32,
    pub max_line_gap: u32,
    pub max_lines: usize,

    // Segment merging
    pub merge_distance: f64,

    // Classification
    /// Grayscale values below this count as ink.
    pub dark_threshold: u8,
    pub axis_tolerance_degrees: f64,
    pub long_segment_length: f64,
    pub thin_line_thickness: f64,
    pub continuity_threshold: f64,
    pub base_confidence: f64,
    pub classification_threshold: f64,

    // Pins and matching
    pub proximity_threshold: f64,
    pub pin_pitch: f64,

    // Anomaly detection
    pub high_degree_threshold: usize,
    pub short_connection_length: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 0.8,
            adaptive_block_size: 11,
            adaptive_offset: 2.0,
            closing_kernel: 2,
            hough_rho: 1.0,
            hough_theta_degrees: 1.0,
            hough_threshold: 50,
            min_line_length: 20,
            max_line_gap: 5,
            max_lines: 1000,
            merge_distance: 10.0,
            dark_threshold: 128,
            axis_tolerance_degrees: 15.0,
            long_segment_length: 30.0,
            thin_line_thickness: 3.0,
            continuity_threshold: 0.8,
            base_confidence: 0.7,
            classification_threshold: 0.6,
            proximity_threshold: 25.0,
            pin_pitch: 20.0,
            high_degree_threshold: 4,
            short_connection_length: 10.0,
        }
    }
}

impl DetectionConfig {
    /// Scale every distance threshold by `factor`, e.g. for a 2x upscaled scan.
    pub fn scaled(&self, factor: f64) -> Self {
        let scale_u32 = |v: u32| ((f64::from(v) * factor).round() as u32).max(1);
        Self {
            min_line_length: scale_u32(self.min_line_length),
            max_line_gap: scale_u32(self.max_line_gap),
            merge_distance: self.merge_distance * factor,
            long_segment_length: self.long_segment_length * factor,
            thin_line_thickness: self.thin_line_thickness * factor,
            proximity_threshold: self.proximity_threshold * factor,
            pin_pitch: self.pin_pitch * factor,
            short_connection_length: self.short_connection_length * factor,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), WiretraceError> {
        if self.adaptive_block_size < 3
            || self.adaptive_block_size % 2 == 0
            || self.adaptive_block_size > MAX_BLOCK_SIZE
        {
            return Err(WiretraceError::InvalidConfig(format!(
                "adaptive_block_size must be odd and within [3, {}], got {}",
                MAX_BLOCK_SIZE, self.adaptive_block_size
            )));
        }
        if self.closing_kernel > MAX_CLOSING_KERNEL {
            return Err(WiretraceError::InvalidConfig(format!(
                "closing_kernel must be at most {}, got {}",
                MAX_CLOSING_KERNEL, self.closing_kernel
            )));
        }
        // Bounds cap the Hough accumulator and per-edge pin counts.
        let bounded = [
            ("blur_sigma", f64::from(self.blur_sigma), 0.0, 50.0),
            ("hough_rho", self.hough_rho, 0.5, 100.0),
            ("hough_theta_degrees", self.hough_theta_degrees, 0.1, 90.0),
            ("pin_pitch", self.pin_pitch, 1.0, 10_000.0),
        ];
        for (name, value, min, max) in bounded {
            if !(min..=max).contains(&value) {
                return Err(WiretraceError::InvalidConfig(format!(
                    "{} must lie in [{}, {}], got {}",
                    name, min, max, value
                )));
            }
        }
        let positive = [
            ("merge_distance", self.merge_distance),
            ("proximity_threshold", self.proximity_threshold),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(WiretraceError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        let unit = [
            ("continuity_threshold", self.continuity_threshold),
            ("base_confidence", self.base_confidence),
            ("classification_threshold", self.classification_threshold),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(WiretraceError::InvalidConfig(format!(
                    "{} must lie in [0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.hough_threshold == 0 {
            return Err(WiretraceError::InvalidConfig(
                "hough_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(DetectionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_even_block_size() {
        let config = DetectionConfig {
            adaptive_block_size: 10,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(WiretraceError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_non_positive_proximity() {
        let config = DetectionConfig {
            proximity_threshold: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DetectionConfig =
            serde_json::from_str(r#"{ "proximity_threshold": 40.0 }"#).unwrap();
        assert_eq!(config.proximity_threshold, 40.0);
        assert_eq!(config.merge_distance, 10.0);
        assert_eq!(config.hough_threshold, 50);
    }

    #[test]
    fn test_scaled() {
        let config = DetectionConfig::default().scaled(2.0);
        assert_eq!(config.proximity_threshold, 50.0);
        assert_eq!(config.min_line_length, 40);
        assert_eq!(config.hough_threshold, 50);
    }

    #[test]
    fn test_rejects_degenerate_resolutions() {
        for config in [
            DetectionConfig {
                hough_rho: 1e-6,
                ..Default::default()
            },
            DetectionConfig {
                hough_theta_degrees: 1e-4,
                ..Default::default()
            },
            DetectionConfig {
                pin_pitch: 0.01,
                ..Default::default()
            },
            DetectionConfig {
                adaptive_block_size: 1001,
                ..Default::default()
            },
            DetectionConfig {
                closing_kernel: 500,
                ..Default::default()
            },
        ] {
            assert!(
                matches!(config.validate(), Err(WiretraceError::InvalidConfig(_))),
                "{:?}",
                config
            );
        }
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let config = DetectionConfig {
            hough_rho: 0.5,
            pin_pitch: 1.0,
            adaptive_block_size: 255,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
