//! Core analysis entry points shared by the CLI and library users.
//! Pure in-memory transformations; the only I/O is in the file helpers.

use std::collections::HashSet;
use std::path::Path;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::component::DetectedComponent;
use crate::config::DetectionConfig;
use crate::netlist::{NetlistResult, NetlistSynthesizer};
use crate::topology::{Severity, TopologyBuilder, TopologyResult};
use crate::vision::preprocess::to_grayscale;
use crate::vision::{LineSegmentExtractor, RawSegment};

pub const DEFAULT_TITLE: &str = "wiretrace";

#[derive(Debug, thiserror::Error)]
pub enum WiretraceError {
    #[error("Image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),
    #[error("Empty image input")]
    EmptyInput,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("JSON error: {0}")]
    Json(String),
    #[error("Duplicate component id: {0}")]
    DuplicateComponentId(String),
}

impl From<serde_json::Error> for WiretraceError {
    fn from(e: serde_json::Error) -> Self {
        WiretraceError::Json(e.to_string())
    }
}

/// Options for one analysis run.
#[derive(Clone, Debug)]
pub struct AnalysisOptions {
    pub config: DetectionConfig,
    pub generate_netlist: bool,
    /// Shown in the netlist header comment.
    pub title: String,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            config: DetectionConfig::default(),
            generate_netlist: true,
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

/// Topology plus (optionally) the synthesized netlist.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub topology: TopologyResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub netlist: Option<NetlistResult>,
    pub stats: AnalysisStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisStats {
    pub segments: usize,
    pub components: usize,
    pub pins: usize,
    pub connections: usize,
    pub nodes: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl AnalysisResult {
    pub fn has_warnings(&self) -> bool {
        self.stats.warnings > 0
    }

    pub fn netlist_ok(&self) -> bool {
        self.netlist.as_ref().map_or(true, |n| n.generation_success)
    }
}

fn collect_stats(segments: usize, components: usize, topology: &TopologyResult) -> AnalysisStats {
    let mut warnings = 0;
    let mut infos = 0;
    for issue in &topology.potential_issues {
        match issue.severity {
            Severity::Warning => warnings += 1,
            Severity::Info => infos += 1,
        }
    }
    AnalysisStats {
        segments,
        components,
        pins: topology.pins.len(),
        connections: topology.connections.len(),
        nodes: topology.nodes.len(),
        warnings,
        infos,
    }
}

/// Component list as a bare array or wrapped in `{"components": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ComponentFile {
    List(Vec<DetectedComponent>),
    Wrapped { components: Vec<DetectedComponent> },
}

/// Core analysis API used by the CLI.
pub struct WiretraceCore;

impl WiretraceCore {
    /// Analyze encoded image bytes (PNG, JPEG or BMP).
    pub fn analyze_bytes(
        bytes: &[u8],
        components: &[DetectedComponent],
        options: AnalysisOptions,
    ) -> Result<AnalysisResult, WiretraceError> {
        let gray = Self::decode_image(bytes)?;
        Self::analyze_image(&gray, components, options)
    }

    /// Read and analyze an image file.
    pub fn analyze_file(
        path: &Path,
        components: &[DetectedComponent],
        options: AnalysisOptions,
    ) -> Result<AnalysisResult, WiretraceError> {
        let bytes = std::fs::read(path)?;
        tracing::info!("Analyzing {} ({} bytes)", path.display(), bytes.len());
        Self::analyze_bytes(&bytes, components, options)
    }

    /// Analyze an already decoded grayscale image.
    pub fn analyze_image(
        gray: &GrayImage,
        components: &[DetectedComponent],
        options: AnalysisOptions,
    ) -> Result<AnalysisResult, WiretraceError> {
        options.config.validate()?;
        let segments = LineSegmentExtractor::extract(gray, &options.config);
        Self::analyze_segments(&segments, gray, components, options)
    }

    /// Run everything after line extraction on the given segments. `gray`
    /// is only sampled for stroke thickness and continuity.
    pub fn analyze_segments(
        segments: &[RawSegment],
        gray: &GrayImage,
        components: &[DetectedComponent],
        options: AnalysisOptions,
    ) -> Result<AnalysisResult, WiretraceError> {
        options.config.validate()?;
        Self::check_component_ids(components)?;
        let topology = TopologyBuilder::build(segments, gray, components, &options.config);

        let netlist = options.generate_netlist.then(|| {
            NetlistSynthesizer::generate(components, &topology.pins, &topology.nodes, &options.title)
        });

        let stats = collect_stats(segments.len(), components.len(), &topology);
        Ok(AnalysisResult {
            topology,
            netlist,
            stats,
        })
    }

    /// Pin and node ids are derived from component ids, so they must be unique.
    fn check_component_ids(components: &[DetectedComponent]) -> Result<(), WiretraceError> {
        let mut seen = HashSet::new();
        for component in components {
            if !seen.insert(component.id.as_str()) {
                return Err(WiretraceError::DuplicateComponentId(component.id.clone()));
            }
        }
        Ok(())
    }

    /// Decode image bytes to 8-bit grayscale.
    pub fn decode_image(bytes: &[u8]) -> Result<GrayImage, WiretraceError> {
        if bytes.is_empty() {
            return Err(WiretraceError::EmptyInput);
        }
        let image = image::load_from_memory(bytes)?;
        tracing::debug!("Decoded {}x{} image", image.width(), image.height());
        Ok(to_grayscale(&image))
    }

    /// Load a component list from a JSON file.
    pub fn load_components(path: &Path) -> Result<Vec<DetectedComponent>, WiretraceError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse_components(&text)
    }

    pub fn parse_components(json: &str) -> Result<Vec<DetectedComponent>, WiretraceError> {
        let components = match serde_json::from_str::<ComponentFile>(json)? {
            ComponentFile::List(list) => list,
            ComponentFile::Wrapped { components } => components,
        };
        tracing::debug!("Loaded {} components", components.len());
        Ok(components)
    }

    /// Load and validate a detection config from a JSON file. Missing fields
    /// take their defaults.
    pub fn load_config(path: &Path) -> Result<DetectionConfig, WiretraceError> {
        let text = std::fs::read_to_string(path)?;
        let config: DetectionConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }
}
