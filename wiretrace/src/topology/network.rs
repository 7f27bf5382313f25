//! Connection Network Builder
//!
//! Attaches classified segments to the pins near their endpoints. A segment
//! touching no pin is not a connection and is dropped; one touching a single
//! component is kept as a dangling connection.
//!
//! Component adjacency counts every pin within reach of an endpoint, but
//! each endpoint is wired to its nearest pin only. Neighbouring pins of an
//! IC closer together than the proximity threshold stay separate nodes.

use serde::{Deserialize, Serialize};

use crate::config::DetectionConfig;
use crate::geometry::Point;
use crate::topology::classifier::{ClassifiedConnection, ConnectionKind};
use crate::topology::pins::Pin;

/// A classified segment attached to one or more component pins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub start: Point,
    pub end: Point,
    pub path: Vec<Point>,
    pub kind: ConnectionKind,
    pub confidence: f64,
    pub length: f64,
    /// Owning components of the touched pins, first-seen order, no repeats.
    pub connected_components: Vec<String>,
    /// The nearest in-reach pin of each endpoint, in pin order, at most two.
    pub connected_pins: Vec<String>,
}

impl Connection {
    /// Touches the pins of a single component only.
    pub fn is_dangling(&self) -> bool {
        self.connected_components.len() == 1
    }

    pub fn touches(&self, component_id: &str) -> bool {
        self.connected_components.iter().any(|c| c == component_id)
    }
}

pub struct ConnectionNetworkBuilder;

impl ConnectionNetworkBuilder {
    pub fn build(
        classified: &[ClassifiedConnection],
        pins: &[Pin],
        config: &DetectionConfig,
    ) -> Vec<Connection> {
        let threshold = config.proximity_threshold;
        let mut connections = Vec::new();

        for candidate in classified {
            let mut connected_components: Vec<String> = Vec::new();
            for pin in pins {
                let near = candidate.start.distance_to(&pin.position) < threshold
                    || candidate.end.distance_to(&pin.position) < threshold;
                if near && !connected_components.contains(&pin.component_id) {
                    connected_components.push(pin.component_id.clone());
                }
            }

            if connected_components.is_empty() {
                tracing::debug!("{} touches no pin, dropped", candidate.id);
                continue;
            }

            let mut attached: Vec<usize> = [candidate.start, candidate.end]
                .iter()
                .filter_map(|endpoint| nearest_pin(endpoint, pins, threshold))
                .collect();
            attached.sort_unstable();
            attached.dedup();
            let connected_pins = attached
                .into_iter()
                .map(|idx| pins[idx].pin_id.clone())
                .collect();

            connections.push(Connection {
                id: candidate.id.clone(),
                start: candidate.start,
                end: candidate.end,
                path: vec![candidate.start, candidate.end],
                kind: candidate.kind,
                confidence: candidate.confidence,
                length: candidate.properties.length,
                connected_components,
                connected_pins,
            });
        }

        tracing::info!(
            "Built {} connections from {} candidate segments",
            connections.len(),
            classified.len()
        );
        connections
    }
}

/// Index of the closest pin strictly inside `threshold`; the earlier pin
/// wins a tie.
fn nearest_pin(endpoint: &Point, pins: &[Pin], threshold: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, pin) in pins.iter().enumerate() {
        let d = endpoint.distance_to(&pin.position);
        if d >= threshold {
            continue;
        }
        if best.map_or(true, |(_, best_d)| d < best_d) {
            best = Some((idx, d));
        }
    }
    best.map(|(idx, _)| idx)
}
