//! Pin Locator: terminal positions derived from a bounding box and type.

use serde::{Deserialize, Serialize};

use crate::component::{BoundingBox, ComponentType, DetectedComponent};
use crate::config::DetectionConfig;
use crate::geometry::Point;

/// A component terminal where a wire may attach.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pin {
    pub pin_id: String,
    pub component_id: String,
    pub position: Point,
    /// 1-based ordinal within the owning component.
    pub pin_number: usize,
    pub component_type: ComponentType,
}

pub struct PinLocator;

impl PinLocator {
    /// Locate the pins of every component, in component order.
    pub fn locate_all(components: &[DetectedComponent], config: &DetectionConfig) -> Vec<Pin> {
        let mut pins = Vec::new();
        for component in components {
            if component.bbox.area() <= 0.0 {
                tracing::warn!(
                    "Component {} has a zero-area bounding box; pins are degenerate",
                    component.id
                );
            }
            let positions =
                Self::pin_positions(&component.bbox, &component.component_type, config.pin_pitch);
            for (idx, position) in positions.into_iter().enumerate() {
                pins.push(Pin {
                    pin_id: format!("{}_pin_{}", component.id, idx),
                    component_id: component.id.clone(),
                    position,
                    pin_number: idx + 1,
                    component_type: component.component_type.clone(),
                });
            }
        }
        tracing::info!("Located {} pins on {} components", pins.len(), components.len());
        pins
    }

    /// Pin coordinates for one component.
    ///
    /// | type                           | pins                                  |
    /// |--------------------------------|---------------------------------------|
    /// | resistor, capacitor, inductor  | left-mid, right-mid                   |
    /// | voltage / current source       | top-mid, bottom-mid                   |
    /// | ground                         | top-mid                               |
    /// | transistor, op-amp, IC         | `long side / pitch` per edge, 2..=64  |
    /// | anything else                  | left-mid, right-mid                   |
    ///
    /// Multi-terminal devices wider than tall get pins on the top and bottom
    /// edges, otherwise on the left and right edges; pins on opposite edges
    /// alternate (`top0, bottom0, top1, bottom1, ...`).
    pub fn pin_positions(bbox: &BoundingBox, component_type: &ComponentType, pitch: f64) -> Vec<Point> {
        let b = bbox.normalized();
        let (cx, cy) = b.center();
        let at = |x: f64, y: f64| clamp_to_box(&b, x, y);

        match component_type {
            ComponentType::VoltageSource | ComponentType::CurrentSource => {
                vec![at(cx, b.y1), at(cx, b.y2)]
            }
            ComponentType::Ground => vec![at(cx, b.y1)],
            t if t.is_multi_terminal() => {
                let (width, height) = (b.width(), b.height());
                let mut pins = Vec::new();
                if width > height {
                    let n = per_edge_count(width, pitch);
                    for i in 0..n {
                        let x = b.x1 + (i + 1) as f64 * width / (n + 1) as f64;
                        pins.push(at(x, b.y1));
                        pins.push(at(x, b.y2));
                    }
                } else {
                    let n = per_edge_count(height, pitch);
                    for i in 0..n {
                        let y = b.y1 + (i + 1) as f64 * height / (n + 1) as f64;
                        pins.push(at(b.x1, y));
                        pins.push(at(b.x2, y));
                    }
                }
                pins
            }
            _ => vec![at(b.x1, cy), at(b.x2, cy)],
        }
    }
}

/// Upper limit on pins per edge, whatever the box size.
const MAX_PINS_PER_EDGE: usize = 64;

fn per_edge_count(span: f64, pitch: f64) -> usize {
    if pitch <= 0.0 {
        return 2;
    }
    ((span / pitch) as usize).clamp(2, MAX_PINS_PER_EDGE)
}

/// Truncate to pixels, then keep the pin on the box.
fn clamp_to_box(b: &BoundingBox, x: f64, y: f64) -> Point {
    let (min_x, max_x) = (b.x1 as i32, b.x2 as i32);
    let (min_y, max_y) = (b.y1 as i32, b.y2 as i32);
    Point::new(
        (x as i32).clamp(min_x.min(max_x), max_x.max(min_x)),
        (y as i32).clamp(min_y.min(max_y), max_y.max(min_y)),
    )
}
