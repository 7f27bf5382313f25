//! Raster line extraction.
//!
//! ```text
//! grayscale ─▶ blur ─▶ adaptive threshold ─▶ closing ─▶ edges ─▶ Hough ─▶ merge
//! ```
//!
//! The output is a list of [`RawSegment`]s; an image without lines yields an
//! empty list.

pub mod hough;
pub mod preprocess;
pub mod segments;

pub use hough::{probabilistic_hough, HoughParams};
pub use segments::{LineSegmentExtractor, RawSegment};
