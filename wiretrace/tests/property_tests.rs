//! Structural properties of node resolution over many generated layouts.

use std::collections::{HashMap, HashSet};

use wiretrace::config::DetectionConfig;
use wiretrace::topology::classifier::{ClassifiedConnection, ConnectionKind, SegmentProperties};
use wiretrace::topology::{ConnectionNetworkBuilder, NodeResolver, PinLocator};
use wiretrace::{BoundingBox, ComponentType, DetectedComponent, Point};

/// Small deterministic generator so failures reproduce.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

const TYPES: [&str; 7] = [
    "resistor",
    "capacitor",
    "voltage_source",
    "ground",
    "transistor",
    "op_amp",
    "diode",
];

fn layout(rng: &mut Lcg) -> Vec<DetectedComponent> {
    let count = 1 + rng.below(8) as usize;
    (0..count)
        .map(|i| {
            let x = rng.below(400) as f64;
            let y = rng.below(300) as f64;
            let w = 10.0 + rng.below(80) as f64;
            let h = 10.0 + rng.below(80) as f64;
            let label = TYPES[rng.below(TYPES.len() as u64) as usize];
            DetectedComponent::new(
                format!("c{}", i),
                BoundingBox::new(x, y, x + w, y + h),
                ComponentType::from_label(label),
            )
        })
        .collect()
}

fn wires(rng: &mut Lcg, pins: &[wiretrace::Pin]) -> Vec<ClassifiedConnection> {
    let count = rng.below(10) as usize;
    (0..count)
        .map(|i| {
            // Start near a random pin half of the time, anywhere otherwise.
            let start = if !pins.is_empty() && rng.below(2) == 0 {
                pins[rng.below(pins.len() as u64) as usize].position
            } else {
                Point::new(rng.below(500) as i32, rng.below(400) as i32)
            };
            let end = if !pins.is_empty() && rng.below(2) == 0 {
                pins[rng.below(pins.len() as u64) as usize].position
            } else {
                Point::new(rng.below(500) as i32, rng.below(400) as i32)
            };
            ClassifiedConnection {
                id: format!("conn_{}", i),
                start,
                end,
                kind: ConnectionKind::Wire,
                confidence: 0.8,
                properties: SegmentProperties {
                    length: start.distance_to(&end),
                    angle_degrees: 0.0,
                    thickness_px: 1.0,
                    continuity_ratio: 1.0,
                },
            }
        })
        .collect()
}

#[test]
fn test_nodes_partition_pins_and_respect_connections() {
    let config = DetectionConfig::default();
    let mut rng = Lcg(0x5eed);

    for _ in 0..200 {
        let components = layout(&mut rng);
        let pins = PinLocator::locate_all(&components, &config);
        let classified = wires(&mut rng, &pins);
        let connections = ConnectionNetworkBuilder::build(&classified, &pins, &config);
        let nodes = NodeResolver::resolve(&connections, &pins);

        // Partition: every pin in exactly one node.
        let mut owner: HashMap<&str, &str> = HashMap::new();
        for node in &nodes {
            assert_eq!(node.connection_count, node.pin_ids.len());
            for pin in &node.pin_ids {
                assert!(
                    owner.insert(pin.as_str(), node.node_id.as_str()).is_none(),
                    "pin {} in two nodes",
                    pin
                );
            }
        }
        assert_eq!(owner.len(), pins.len());

        // Closure: pins sharing a connection share a node; chaining two
        // connections through a common pin keeps them together.
        for connection in &connections {
            let first = owner[connection.connected_pins[0].as_str()];
            for pin in &connection.connected_pins {
                assert_eq!(owner[pin.as_str()], first);
            }
        }

        // At most one pin per endpoint, and a pin no connection names is a
        // node on its own even when a wire ends close to it.
        let mut wired: HashSet<&str> = HashSet::new();
        for connection in &connections {
            assert!(connection.connected_pins.len() <= 2);
            wired.extend(connection.connected_pins.iter().map(String::as_str));
        }
        for node in &nodes {
            if node.pin_ids.len() > 1 {
                assert!(node.pin_ids.iter().all(|p| wired.contains(p.as_str())));
            }
        }

        // Each node's components are exactly the owners of its pins.
        for node in &nodes {
            for pin_id in &node.pin_ids {
                let pin = pins.iter().find(|p| &p.pin_id == pin_id).unwrap();
                assert!(node.connected_components.contains(&pin.component_id));
            }
        }
    }
}

#[test]
fn test_unwired_ic_pins_stay_separate() {
    let config = DetectionConfig::default();
    let components = vec![DetectedComponent::new(
        "u1",
        BoundingBox::new(100.0, 100.0, 140.0, 160.0),
        ComponentType::OpAmp,
    )];
    let pins = PinLocator::locate_all(&components, &config);
    assert_eq!(pins.len(), 6);

    // Every endpoint lands within reach of several pins on the 15px pitch.
    for pin in &pins {
        let outward = if pin.position.x == 100 { -1 } else { 1 };
        let end = Point::new(pin.position.x + 2 * outward, pin.position.y);
        let start = Point::new(end.x + 50 * outward, end.y);
        let classified = vec![ClassifiedConnection {
            id: "conn_0".to_string(),
            start,
            end,
            kind: ConnectionKind::Wire,
            confidence: 0.8,
            properties: SegmentProperties {
                length: start.distance_to(&end),
                angle_degrees: 0.0,
                thickness_px: 1.0,
                continuity_ratio: 1.0,
            },
        }];
        let connections = ConnectionNetworkBuilder::build(&classified, &pins, &config);
        let nodes = NodeResolver::resolve(&connections, &pins);
        assert_eq!(nodes.len(), 6, "wire to {} merged pins", pin.pin_id);
        assert_eq!(connections[0].connected_pins, vec![pin.pin_id.clone()]);
    }
}

#[test]
fn test_node_ids_reproducible() {
    let config = DetectionConfig::default();
    let mut rng = Lcg(42);
    for _ in 0..50 {
        let components = layout(&mut rng);
        let pins = PinLocator::locate_all(&components, &config);
        let classified = wires(&mut rng, &pins);
        let connections = ConnectionNetworkBuilder::build(&classified, &pins, &config);

        let a = NodeResolver::resolve(&connections, &pins);
        let b = NodeResolver::resolve(&connections, &pins);
        assert_eq!(a, b);
        for (k, node) in a.iter().enumerate() {
            assert_eq!(node.node_id, format!("node_{}", k));
        }
    }
}

#[test]
fn test_adjacency_matrix_symmetric() {
    let config = DetectionConfig::default();
    let mut rng = Lcg(7);
    for _ in 0..100 {
        let components = layout(&mut rng);
        let pins = PinLocator::locate_all(&components, &config);
        let classified = wires(&mut rng, &pins);
        let connections = ConnectionNetworkBuilder::build(&classified, &pins, &config);
        let matrix =
            wiretrace::topology::TopologyAnalyzer::connectivity_matrix(&connections, &components);

        let n = components.len();
        for i in 0..n {
            assert!(!matrix.adjacency[i][i]);
            for j in 0..n {
                assert_eq!(matrix.adjacency[i][j], matrix.adjacency[j][i]);
            }
            let isolated = matrix.isolated_components.contains(&components[i].id);
            assert_eq!(isolated, !matrix.adjacency[i].iter().any(|&v| v));
        }
    }
}
