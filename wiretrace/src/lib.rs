//! Wiretrace - schematic image connectivity analysis
//!
//! This library recovers the wiring of a circuit schematic from a raster
//! image and a list of already-detected components, then synthesizes a
//! SPICE netlist from the result.
//!
//! # Quick Start
//!
//! ```no_run
//! use wiretrace::{AnalysisOptions, WiretraceCore};
//! use std::path::Path;
//!
//! let components = WiretraceCore::load_components(Path::new("components.json")).unwrap();
//! let result = WiretraceCore::analyze_file(
//!     Path::new("schematic.png"),
//!     &components,
//!     AnalysisOptions::default(),
//! ).unwrap();
//!
//! for issue in &result.topology.potential_issues {
//!     println!("{:?}: {}", issue.severity, issue.message);
//! }
//! if let Some(netlist) = &result.netlist {
//!     println!("{}", netlist.netlist_text);
//! }
//! ```
//!
//! # Pipeline
//!
//! - **Line extraction**: blur, adaptive threshold, closing, edges, Hough, merge
//! - **Classification**: per-segment confidence from geometry and ink sampling
//! - **Pins and network**: pins from boxes, segments attached to nearby pins
//! - **Nodes**: equipotential pin groups via graph traversal
//! - **Analysis**: adjacency, complexity ratios, anomaly report
//! - **Netlist**: device naming, value normalization, SPICE deck assembly

pub mod component;
pub mod config;
pub mod core;
pub mod geometry;
pub mod netlist;
pub mod topology;
pub mod vision;

// Re-export main types
pub use crate::core::{
    AnalysisOptions, AnalysisResult, AnalysisStats, WiretraceCore, WiretraceError,
};
pub use component::{BoundingBox, ComponentType, DetectedComponent};
pub use config::DetectionConfig;
pub use geometry::Point;
pub use netlist::{DeviceKind, NetlistResult, NetlistSynthesizer, SpiceComponent};
pub use topology::{
    Connection, ElectricalNode, IssueKind, Pin, Severity, TopologyBuilder, TopologyIssue,
    TopologyResult,
};
pub use vision::{LineSegmentExtractor, RawSegment};

/// Analyze an image file with default options (convenience wrapper).
pub fn analyze_file(
    path: &std::path::Path,
    components: &[DetectedComponent],
) -> Result<AnalysisResult, WiretraceError> {
    WiretraceCore::analyze_file(path, components, AnalysisOptions::default())
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        AnalysisOptions, AnalysisResult, DetectedComponent, DetectionConfig, NetlistResult,
        TopologyResult, WiretraceCore, WiretraceError,
    };
}
