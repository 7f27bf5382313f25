//! Detected component list consumed from the symbol detector and OCR.
//!
//! Each entry carries a bounding box in image pixels, a declared type and
//! whatever designation/value/tolerance strings OCR attached to it. The JSON
//! shape matches what the detector emits:
//!
//! ```json
//! { "id": "yolo_0", "bbox": [80, 180, 120, 220], "component_type": "resistor",
//!   "designation": "R1", "value": "10kΩ" }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned bounding box `(x1, y1, x2, y2)` in image pixels.
///
/// Serialized as a four-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Same box with corners ordered so that `x1 <= x2` and `y1 <= y2`.
    pub fn normalized(&self) -> Self {
        Self {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }

    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).abs()
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).abs()
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// Declared component type as reported by the symbol detector.
///
/// Parsing is case-insensitive; labels that match nothing are kept verbatim
/// in [`ComponentType::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComponentType {
    Resistor,
    Capacitor,
    Inductor,
    VoltageSource,
    CurrentSource,
    Diode,
    Transistor,
    OpAmp,
    Ic,
    Ground,
    Unknown(String),
}

impl ComponentType {
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "resistor" | "r" => ComponentType::Resistor,
            "capacitor" | "c" => ComponentType::Capacitor,
            "inductor" | "l" => ComponentType::Inductor,
            "voltage_source" | "battery" | "vsource" => ComponentType::VoltageSource,
            "current_source" | "isource" => ComponentType::CurrentSource,
            "diode" | "led" => ComponentType::Diode,
            "transistor" | "bjt" | "mosfet" => ComponentType::Transistor,
            "op_amp" | "opamp" => ComponentType::OpAmp,
            "ic" | "integrated_circuit" => ComponentType::Ic,
            "ground" | "gnd" => ComponentType::Ground,
            _ => ComponentType::Unknown(label.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ComponentType::Resistor => "resistor",
            ComponentType::Capacitor => "capacitor",
            ComponentType::Inductor => "inductor",
            ComponentType::VoltageSource => "voltage_source",
            ComponentType::CurrentSource => "current_source",
            ComponentType::Diode => "diode",
            ComponentType::Transistor => "transistor",
            ComponentType::OpAmp => "op_amp",
            ComponentType::Ic => "ic",
            ComponentType::Ground => "ground",
            ComponentType::Unknown(label) => label.as_str(),
        }
    }

    /// Transistors, op-amps and ICs get their pin count from the box size.
    pub fn is_multi_terminal(&self) -> bool {
        matches!(
            self,
            ComponentType::Transistor | ComponentType::OpAmp | ComponentType::Ic
        )
    }

    pub fn is_source(&self) -> bool {
        matches!(self, ComponentType::VoltageSource | ComponentType::CurrentSource)
    }
}

impl Default for ComponentType {
    fn default() -> Self {
        ComponentType::Unknown("unknown".to_string())
    }
}

impl From<String> for ComponentType {
    fn from(label: String) -> Self {
        ComponentType::from_label(&label)
    }
}

impl From<ComponentType> for String {
    fn from(t: ComponentType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A component found by the detector, optionally annotated by OCR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedComponent {
    #[serde(alias = "component_id")]
    pub id: String,
    #[serde(alias = "bounding_box")]
    pub bbox: BoundingBox,
    #[serde(default)]
    pub component_type: ComponentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
    #[serde(default, alias = "value_string", skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, alias = "tolerance_string", skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<String>,
}

impl DetectedComponent {
    pub fn new(id: impl Into<String>, bbox: BoundingBox, component_type: ComponentType) -> Self {
        Self {
            id: id.into(),
            bbox,
            component_type,
            designation: None,
            value: None,
            tolerance: None,
        }
    }

    pub fn with_designation(mut self, designation: impl Into<String>) -> Self {
        self.designation = Some(designation.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_tolerance(mut self, tolerance: impl Into<String>) -> Self {
        self.tolerance = Some(tolerance.into());
        self
    }
}
