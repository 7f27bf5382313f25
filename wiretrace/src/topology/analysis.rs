//! Topology Analyzer: adjacency, complexity ratios and anomaly checks.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::component::DetectedComponent;
use crate::config::DetectionConfig;
use crate::topology::network::Connection;
use crate::topology::nodes::ElectricalNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Isolation,
    HighConnectivity,
    ShortConnections,
    DanglingConnection,
}

/// A structural anomaly worth showing to the user. Never fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyIssue {
    #[serde(rename = "type")]
    pub issue_type: IssueKind,
    pub severity: Severity,
    pub message: String,
    /// Components (or connection ids, for connection-level issues) involved.
    pub components: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConnectivityMatrix {
    /// Row/column labels, in component-list order.
    pub component_ids: Vec<String>,
    pub adjacency: Vec<Vec<bool>>,
    /// `"A-B"` -> strongest confidence of any connection joining A and B.
    pub connection_strengths: BTreeMap<String, f64>,
    pub isolated_components: Vec<String>,
}

impl ConnectivityMatrix {
    pub fn are_connected(&self, a: &str, b: &str) -> bool {
        let i = self.component_ids.iter().position(|c| c == a);
        let j = self.component_ids.iter().position(|c| c == b);
        match (i, j) {
            (Some(i), Some(j)) => self.adjacency[i][j],
            _ => false,
        }
    }

    pub fn degree(&self, component_id: &str) -> usize {
        self.component_ids
            .iter()
            .position(|c| c == component_id)
            .map(|i| self.adjacency[i].iter().filter(|&&v| v).count())
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CircuitComplexity {
    pub total_connections: usize,
    pub total_nodes: usize,
    pub total_components: usize,
    pub component_density: f64,
    pub node_complexity: f64,
    pub connection_ratio: f64,
    pub average_node_degree: f64,
}

pub struct TopologyAnalyzer;

impl TopologyAnalyzer {
    pub fn connectivity_matrix(
        connections: &[Connection],
        components: &[DetectedComponent],
    ) -> ConnectivityMatrix {
        let n = components.len();
        let mut index_of: HashMap<&str, usize> = HashMap::new();
        for (i, c) in components.iter().enumerate() {
            index_of.entry(c.id.as_str()).or_insert(i);
        }

        let mut adjacency = vec![vec![false; n]; n];
        let mut connection_strengths: BTreeMap<String, f64> = BTreeMap::new();

        for connection in connections {
            let indices: Vec<usize> = connection
                .connected_components
                .iter()
                .filter_map(|id| index_of.get(id.as_str()).copied())
                .collect();
            for (k, &a) in indices.iter().enumerate() {
                for &b in &indices[k + 1..] {
                    if a == b {
                        continue;
                    }
                    adjacency[a][b] = true;
                    adjacency[b][a] = true;

                    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
                    let key = format!("{}-{}", components[lo].id, components[hi].id);
                    let strength = connection_strengths.entry(key).or_insert(0.0);
                    *strength = strength.max(connection.confidence);
                }
            }
        }

        let isolated_components = adjacency
            .iter()
            .enumerate()
            .filter(|(_, row)| !row.iter().any(|&v| v))
            .map(|(i, _)| components[i].id.clone())
            .collect();

        ConnectivityMatrix {
            component_ids: components.iter().map(|c| c.id.clone()).collect(),
            adjacency,
            connection_strengths,
            isolated_components,
        }
    }

    pub fn complexity(
        connections: &[Connection],
        nodes: &[ElectricalNode],
        component_count: usize,
    ) -> CircuitComplexity {
        let n_connections = connections.len() as f64;
        let n_nodes = nodes.len() as f64;
        let n_components = component_count as f64;
        let pin_total: usize = nodes.iter().map(|n| n.connection_count).sum();

        CircuitComplexity {
            total_connections: connections.len(),
            total_nodes: nodes.len(),
            total_components: component_count,
            component_density: n_connections / n_components.max(1.0),
            node_complexity: n_nodes / n_components.max(1.0),
            connection_ratio: n_connections / (n_components - 1.0).max(1.0),
            average_node_degree: pin_total as f64 / n_nodes.max(1.0),
        }
    }

    /// Run every anomaly check. The checks are independent; an empty list
    /// means nothing looked suspicious.
    pub fn potential_issues(
        connections: &[Connection],
        nodes: &[ElectricalNode],
        matrix: &ConnectivityMatrix,
        config: &DetectionConfig,
    ) -> Vec<TopologyIssue> {
        let mut issues = Vec::new();

        if !matrix.isolated_components.is_empty() {
            issues.push(TopologyIssue {
                issue_type: IssueKind::Isolation,
                severity: Severity::Warning,
                message: format!(
                    "Found {} isolated components: {}",
                    matrix.isolated_components.len(),
                    matrix.isolated_components.join(", ")
                ),
                components: matrix.isolated_components.clone(),
            });
        }

        let high_degree: Vec<&ElectricalNode> = nodes
            .iter()
            .filter(|n| n.connection_count > config.high_degree_threshold)
            .collect();
        if !high_degree.is_empty() {
            let mut involved: Vec<String> = Vec::new();
            for node in &high_degree {
                for c in &node.connected_components {
                    if !involved.contains(c) {
                        involved.push(c.clone());
                    }
                }
            }
            issues.push(TopologyIssue {
                issue_type: IssueKind::HighConnectivity,
                severity: Severity::Info,
                message: format!(
                    "Found {} nodes with high connectivity (>{} connections)",
                    high_degree.len(),
                    config.high_degree_threshold
                ),
                components: involved,
            });
        }

        let short: Vec<String> = connections
            .iter()
            .filter(|c| c.start.distance_to(&c.end) < config.short_connection_length)
            .map(|c| c.id.clone())
            .collect();
        if !short.is_empty() {
            issues.push(TopologyIssue {
                issue_type: IssueKind::ShortConnections,
                severity: Severity::Info,
                message: format!("Found {} very short connections (possible noise)", short.len()),
                components: short,
            });
        }

        let dangling: Vec<&Connection> = connections.iter().filter(|c| c.is_dangling()).collect();
        if !dangling.is_empty() {
            issues.push(TopologyIssue {
                issue_type: IssueKind::DanglingConnection,
                severity: Severity::Info,
                message: format!(
                    "Found {} connections attached to a single component: {}",
                    dangling.len(),
                    dangling.iter().map(|c| c.id.as_str()).collect::<Vec<_>>().join(", ")
                ),
                components: dangling.iter().map(|c| c.id.clone()).collect(),
            });
        }

        for issue in &issues {
            tracing::debug!("{:?} ({:?}): {}", issue.issue_type, issue.severity, issue.message);
        }
        issues
    }
}
