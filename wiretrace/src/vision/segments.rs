//! Line Segment Extractor: raster in, consolidated candidate wires out.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::config::DetectionConfig;
use crate::geometry::{distance, projection, Point};
use crate::vision::hough::{probabilistic_hough, HoughParams};
use crate::vision::preprocess;

/// A detected line segment between two pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawSegment {
    pub p1: Point,
    pub p2: Point,
}

impl RawSegment {
    pub const fn new(p1: Point, p2: Point) -> Self {
        Self { p1, p2 }
    }

    /// Same segment with endpoints ordered by (x, y), so that a segment and
    /// its reverse compare equal and pair up endpoint-for-endpoint.
    pub fn normalized(&self) -> Self {
        if self.p2 < self.p1 {
            Self::new(self.p2, self.p1)
        } else {
            *self
        }
    }

    pub fn length(&self) -> f64 {
        distance(&self.p1, &self.p2)
    }
}

/// Preprocessing + Hough + merge pipeline.
pub struct LineSegmentExtractor;

impl LineSegmentExtractor {
    /// Extract merged segments from a grayscale image.
    ///
    /// An image with no lines yields an empty list, never an error.
    pub fn extract(gray: &GrayImage, config: &DetectionConfig) -> Vec<RawSegment> {
        let edges = Self::edge_map(gray, config);
        let raw = probabilistic_hough(&edges, &HoughParams::from_config(config));
        tracing::debug!("Hough transform produced {} raw segments", raw.len());

        let merged = Self::merge_segments(&raw, config.merge_distance);
        if merged.is_empty() {
            tracing::warn!("No line segments found in {}x{} image", gray.width(), gray.height());
        } else {
            tracing::info!(
                "Detected {} line segments ({} before merging)",
                merged.len(),
                raw.len()
            );
        }
        merged
    }

    /// Blur, threshold, close and edge-detect.
    pub fn edge_map(gray: &GrayImage, config: &DetectionConfig) -> GrayImage {
        let blurred = preprocess::gaussian_blur(gray, config.blur_sigma);
        let binary = preprocess::adaptive_threshold_inv(
            &blurred,
            config.adaptive_block_size,
            config.adaptive_offset,
        );
        let closed = preprocess::morphological_close(&binary, config.closing_kernel);
        preprocess::boundary_edges(&closed)
    }

    /// Greedy single-pass merge of near-duplicate segments.
    ///
    /// Two segments merge when both corresponding endpoint pairs lie within
    /// `threshold`. The merged segment keeps the base segment's direction and
    /// spans the extreme endpoints of the group along it. Each segment is
    /// consumed at most once.
    pub fn merge_segments(segments: &[RawSegment], threshold: f64) -> Vec<RawSegment> {
        let segments: Vec<RawSegment> = segments.iter().map(RawSegment::normalized).collect();
        let mut used = vec![false; segments.len()];
        let mut merged = Vec::with_capacity(segments.len());

        for i in 0..segments.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            let base = segments[i];
            let mut low = (0.0, base.p1);
            let mut high = (projection(&base.p1, &base.p2, &base.p2), base.p2);

            for j in (i + 1)..segments.len() {
                if used[j] {
                    continue;
                }
                let other = segments[j];
                if distance(&base.p1, &other.p1) < threshold
                    && distance(&base.p2, &other.p2) < threshold
                {
                    used[j] = true;
                    for p in [other.p1, other.p2] {
                        let t = projection(&base.p1, &base.p2, &p);
                        if t < low.0 {
                            low = (t, p);
                        }
                        if t > high.0 {
                            high = (t, p);
                        }
                    }
                }
            }

            merged.push(RawSegment::new(low.1, high.1));
        }

        merged
    }
}
