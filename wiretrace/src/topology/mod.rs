//! Circuit topology from line geometry and component boxes.
//!
//! Stages run strictly forward: segments are classified, pins located,
//! segments attached to pins, pins grouped into nodes, and finally the
//! component-level adjacency and anomaly report is derived.

pub mod analysis;
pub mod classifier;
pub mod network;
pub mod nodes;
pub mod pins;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::component::DetectedComponent;
use crate::config::DetectionConfig;
use crate::vision::RawSegment;

pub use analysis::{
    CircuitComplexity, ConnectivityMatrix, IssueKind, Severity, TopologyAnalyzer, TopologyIssue,
};
pub use classifier::{ClassifiedConnection, ConnectionClassifier, ConnectionKind, SegmentProperties};
pub use network::{Connection, ConnectionNetworkBuilder};
pub use nodes::{ElectricalNode, NodeResolver};
pub use pins::{Pin, PinLocator};

/// Everything known about the circuit's wiring.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TopologyResult {
    pub pins: Vec<Pin>,
    pub connections: Vec<Connection>,
    pub nodes: Vec<ElectricalNode>,
    pub connectivity_matrix: ConnectivityMatrix,
    pub complexity: CircuitComplexity,
    pub potential_issues: Vec<TopologyIssue>,
}

impl TopologyResult {
    /// Connections at or above `threshold` confidence.
    pub fn confident_connections(&self, threshold: f64) -> Vec<&Connection> {
        self.connections
            .iter()
            .filter(|c| c.confidence >= threshold)
            .collect()
    }

    pub fn node_of_pin(&self, pin_id: &str) -> Option<&ElectricalNode> {
        self.nodes.iter().find(|n| n.contains_pin(pin_id))
    }

    pub fn has_issue(&self, kind: IssueKind) -> bool {
        self.potential_issues.iter().any(|i| i.issue_type == kind)
    }
}

pub struct TopologyBuilder;

impl TopologyBuilder {
    /// Run classification through analysis over already-extracted segments.
    /// Component ids must be unique; `WiretraceCore` checks this first.
    pub fn build(
        segments: &[RawSegment],
        gray: &GrayImage,
        components: &[DetectedComponent],
        config: &DetectionConfig,
    ) -> TopologyResult {
        let classified = ConnectionClassifier::classify(segments, gray, config);
        let pins = PinLocator::locate_all(components, config);
        let connections = ConnectionNetworkBuilder::build(&classified, &pins, config);
        let nodes = NodeResolver::resolve(&connections, &pins);

        let connectivity_matrix = TopologyAnalyzer::connectivity_matrix(&connections, components);
        let complexity = TopologyAnalyzer::complexity(&connections, &nodes, components.len());
        let potential_issues =
            TopologyAnalyzer::potential_issues(&connections, &nodes, &connectivity_matrix, config);

        tracing::info!(
            "Topology: {} connections, {} nodes, {} issues",
            connections.len(),
            nodes.len(),
            potential_issues.len()
        );

        TopologyResult {
            pins,
            connections,
            nodes,
            connectivity_matrix,
            complexity,
            potential_issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{BoundingBox, ComponentType};
    use crate::geometry::Point;

    fn series() -> Vec<DetectedComponent> {
        vec![
            DetectedComponent::new("R1", BoundingBox::new(50.0, 90.0, 150.0, 110.0), ComponentType::Resistor),
            DetectedComponent::new("R2", BoundingBox::new(250.0, 90.0, 350.0, 110.0), ComponentType::Resistor),
        ]
    }

    #[test]
    fn test_series_pair_end_to_end() {
        let gray = GrayImage::from_pixel(400, 200, image::Luma([255]));
        let segment = RawSegment::new(Point::new(152, 100), Point::new(248, 100));
        let result = TopologyBuilder::build(&[segment], &gray, &series(), &DetectionConfig::default());

        assert_eq!(result.pins.len(), 4);
        assert_eq!(result.connections.len(), 1);
        assert_eq!(result.connections[0].connected_components, vec!["R1", "R2"]);
        assert_eq!(result.nodes.len(), 3);
        assert_eq!(result.node_of_pin("R2_pin_0").map(|n| n.node_id.as_str()), Some("node_1"));
        assert!(result.connectivity_matrix.isolated_components.is_empty());
        assert!(result.potential_issues.is_empty());
    }

    #[test]
    fn test_confident_connections_filter() {
        let gray = GrayImage::from_pixel(400, 200, image::Luma([255]));
        let segment = RawSegment::new(Point::new(152, 100), Point::new(248, 100));
        let result = TopologyBuilder::build(&[segment], &gray, &series(), &DetectionConfig::default());
        // Axis aligned and long on blank paper: 0.7 + 0.2 + 0.1.
        assert_eq!(result.confident_connections(0.6).len(), 1);
        assert!(result.confident_connections(1.01).is_empty());
    }

    #[test]
    fn test_no_components_no_topology() {
        let gray = GrayImage::from_pixel(50, 50, image::Luma([255]));
        let segment = RawSegment::new(Point::new(0, 10), Point::new(40, 10));
        let result = TopologyBuilder::build(&[segment], &gray, &[], &DetectionConfig::default());
        assert!(result.connections.is_empty());
        assert!(result.nodes.is_empty());
        assert!(!result.has_issue(IssueKind::Isolation));
    }
}
