//! Connection Classifier
//!
//! Scores each merged segment's likelihood of being an intentional wire from
//! its length, orientation, stroke thickness and continuity. No segment is
//! discarded here; proximity to pins decides relevance downstream.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::config::DetectionConfig;
use crate::geometry::{angle_degrees, axis_deviation, Point};
use crate::vision::preprocess::is_dark;
use crate::vision::RawSegment;

/// How far to look across a stroke when measuring its thickness.
const MAX_PERPENDICULAR_REACH: i32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    Wire,
    Trace,
    Bus,
}

impl Default for ConnectionKind {
    fn default() -> Self {
        ConnectionKind::Wire
    }
}

/// Measured properties of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentProperties {
    pub length: f64,
    pub angle_degrees: f64,
    pub thickness_px: f64,
    pub continuity_ratio: f64,
}

/// A segment scored as a candidate electrical connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedConnection {
    pub id: String,
    pub start: Point,
    pub end: Point,
    pub kind: ConnectionKind,
    pub confidence: f64,
    pub properties: SegmentProperties,
}

impl ClassifiedConnection {
    pub fn is_confident(&self, threshold: f64) -> bool {
        self.confidence >= threshold
    }
}

pub struct ConnectionClassifier;

impl ConnectionClassifier {
    /// Classify every segment, in input order. Ids are `conn_<index>`.
    pub fn classify(
        segments: &[RawSegment],
        gray: &GrayImage,
        config: &DetectionConfig,
    ) -> Vec<ClassifiedConnection> {
        let classified: Vec<ClassifiedConnection> = segments
            .iter()
            .enumerate()
            .map(|(i, segment)| Self::classify_segment(i, segment, gray, config))
            .collect();
        tracing::info!("Classified {} candidate connections", classified.len());
        classified
    }

    pub fn classify_segment(
        index: usize,
        segment: &RawSegment,
        gray: &GrayImage,
        config: &DetectionConfig,
    ) -> ClassifiedConnection {
        let start = segment.p1;
        let end = segment.p2;
        let length = segment.length();
        let angle = angle_degrees(&start, &end);
        let thickness = Self::estimate_thickness(gray, segment, config.dark_threshold);
        let continuity = Self::check_continuity(gray, segment, config.dark_threshold);

        let mut confidence = config.base_confidence;
        if axis_deviation(angle) < config.axis_tolerance_degrees {
            confidence += 0.2;
        }
        if length > config.long_segment_length {
            confidence += 0.1;
        }
        if thickness <= config.thin_line_thickness && continuity > config.continuity_threshold {
            confidence += 0.1;
        }

        let connection = ClassifiedConnection {
            id: format!("conn_{}", index),
            start,
            end,
            kind: ConnectionKind::Wire,
            confidence: confidence.clamp(0.0, 1.0),
            properties: SegmentProperties {
                length,
                angle_degrees: angle,
                thickness_px: thickness,
                continuity_ratio: continuity,
            },
        };
        tracing::debug!(
            "{}: len={:.1} angle={:.1} thickness={:.2} continuity={:.2} confidence={:.2}",
            connection.id,
            length,
            angle,
            thickness,
            continuity,
            connection.confidence
        );
        connection
    }

    /// Point `i` of `n` evenly spaced samples along the segment.
    fn sample_point(segment: &RawSegment, i: usize, n: usize) -> Point {
        let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
        let x = f64::from(segment.p1.x) + t * f64::from(segment.p2.x - segment.p1.x);
        let y = f64::from(segment.p1.y) + t * f64::from(segment.p2.y - segment.p1.y);
        Point::new(x as i32, y as i32)
    }

    fn in_image(gray: &GrayImage, p: &Point) -> bool {
        p.x >= 0 && p.y >= 0 && (p.x as u32) < gray.width() && (p.y as u32) < gray.height()
    }

    /// Mean stroke thickness across samples taken every ~10px (at least 3).
    ///
    /// Returns 1.0 when no sample falls inside the image.
    pub fn estimate_thickness(gray: &GrayImage, segment: &RawSegment, dark_threshold: u8) -> f64 {
        let num_samples = ((segment.length() / 10.0) as usize).max(3);
        let thicknesses: Vec<f64> = (0..num_samples)
            .map(|i| Self::sample_point(segment, i, num_samples))
            .filter(|p| Self::in_image(gray, p))
            .map(|p| Self::measure_perpendicular_thickness(gray, &p, segment, dark_threshold))
            .collect();

        if thicknesses.is_empty() {
            1.0
        } else {
            thicknesses.iter().sum::<f64>() / thicknesses.len() as f64
        }
    }

    /// Length of the dark run crossing the segment at `point`, stepping
    /// outward both ways along the perpendicular until a light pixel.
    fn measure_perpendicular_thickness(
        gray: &GrayImage,
        point: &Point,
        segment: &RawSegment,
        dark_threshold: u8,
    ) -> f64 {
        let dx = f64::from(segment.p2.x - segment.p1.x);
        let dy = f64::from(segment.p2.y - segment.p1.y);
        let length = (dx * dx + dy * dy).sqrt();
        if length == 0.0 {
            return 1.0;
        }
        if !is_dark(gray, point.x, point.y, dark_threshold) {
            return 0.0;
        }

        let perp_x = -dy / length;
        let perp_y = dx / length;
        let mut run = 1;
        for direction in [-1.0, 1.0] {
            for dist in 1..=MAX_PERPENDICULAR_REACH {
                let sx = (f64::from(point.x) + direction * f64::from(dist) * perp_x).round() as i32;
                let sy = (f64::from(point.y) + direction * f64::from(dist) * perp_y).round() as i32;
                if !is_dark(gray, sx, sy, dark_threshold) {
                    break;
                }
                run += 1;
            }
        }
        f64::from(run)
    }

    /// Fraction of samples (every ~5px, at least 5) that land on ink.
    pub fn check_continuity(gray: &GrayImage, segment: &RawSegment, dark_threshold: u8) -> f64 {
        let num_samples = ((segment.length() / 5.0) as usize).max(5);
        let dark = (0..num_samples)
            .map(|i| Self::sample_point(segment, i, num_samples))
            .filter(|p| is_dark(gray, p.x, p.y, dark_threshold))
            .count();
        dark as f64 / num_samples as f64
    }
}
