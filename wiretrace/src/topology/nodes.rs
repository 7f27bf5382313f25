//! Electrical Node Resolver
//!
//! Pins are vertices of an undirected graph; every connection links the pins
//! it touches. Each connected component of that graph is one equipotential
//! node, so the result is always a partition of the pin list.

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::Bfs;
use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::topology::network::Connection;
use crate::topology::pins::Pin;

/// A maximal set of pins at the same potential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricalNode {
    pub node_id: String,
    /// Mean position of the member pins.
    pub position: Point,
    pub connected_components: Vec<String>,
    /// Number of pins folded into this node.
    pub connection_count: usize,
    pub pin_ids: Vec<String>,
}

impl ElectricalNode {
    pub fn contains_pin(&self, pin_id: &str) -> bool {
        self.pin_ids.iter().any(|p| p == pin_id)
    }
}

pub struct NodeResolver;

impl NodeResolver {
    /// Group pins into nodes. Node ids are `node_<k>` in order of each node's
    /// first pin in `pins`, so identical input yields identical numbering.
    pub fn resolve(connections: &[Connection], pins: &[Pin]) -> Vec<ElectricalNode> {
        let mut graph: UnGraph<usize, ()> = UnGraph::new_undirected();
        let mut index_of: HashMap<&str, NodeIndex> = HashMap::new();
        for (i, pin) in pins.iter().enumerate() {
            let idx = graph.add_node(i);
            index_of.insert(pin.pin_id.as_str(), idx);
        }

        for connection in connections {
            let members: Vec<NodeIndex> = connection
                .connected_pins
                .iter()
                .filter_map(|id| index_of.get(id.as_str()).copied())
                .collect();
            // A chain is enough to make every member reachable.
            for pair in members.windows(2) {
                graph.update_edge(pair[0], pair[1], ());
            }
        }

        let mut visited = vec![false; pins.len()];
        let mut nodes = Vec::new();

        for start in graph.node_indices() {
            if visited[start.index()] {
                continue;
            }
            let mut members = Vec::new();
            let mut bfs = Bfs::new(&graph, start);
            while let Some(nx) = bfs.next(&graph) {
                visited[nx.index()] = true;
                members.push(graph[nx]);
            }
            members.sort_unstable();

            let node = Self::make_node(nodes.len(), &members, pins);
            tracing::debug!(
                "{}: {} pins, components {:?}",
                node.node_id,
                node.connection_count,
                node.connected_components
            );
            nodes.push(node);
        }

        tracing::info!("Resolved {} electrical nodes from {} pins", nodes.len(), pins.len());
        nodes
    }

    fn make_node(ordinal: usize, members: &[usize], pins: &[Pin]) -> ElectricalNode {
        let count = members.len();
        let (sum_x, sum_y) = members.iter().fold((0i64, 0i64), |(sx, sy), &i| {
            let p = pins[i].position;
            (sx + i64::from(p.x), sy + i64::from(p.y))
        });
        let position = Point::new(
            (sum_x as f64 / count as f64) as i32,
            (sum_y as f64 / count as f64) as i32,
        );

        let mut connected_components: Vec<String> = Vec::new();
        for &i in members {
            if !connected_components.contains(&pins[i].component_id) {
                connected_components.push(pins[i].component_id.clone());
            }
        }

        ElectricalNode {
            node_id: format!("node_{}", ordinal),
            position,
            connected_components,
            connection_count: count,
            pin_ids: members.iter().map(|&i| pins[i].pin_id.clone()).collect(),
        }
    }

    /// Pin id -> node id lookup.
    pub fn membership(nodes: &[ElectricalNode]) -> HashMap<String, String> {
        nodes
            .iter()
            .flat_map(|n| n.pin_ids.iter().map(move |p| (p.clone(), n.node_id.clone())))
            .collect()
    }
}
