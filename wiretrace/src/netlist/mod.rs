//! SPICE netlist synthesis.
//!
//! [`NetlistSynthesizer`] turns detected components plus their resolved
//! electrical nodes into a textual SPICE deck. Synthesis never fails from
//! the caller's point of view: internal errors produce a minimal skeleton
//! deck with `generation_success = false`.

pub mod generator;
pub mod value;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::component::ComponentType;

pub use generator::{NameAllocator, NetlistSynthesizer};
pub use value::{Value, ValueKind, ValueParser};

/// SPICE element letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    R,
    C,
    L,
    V,
    I,
    D,
    Q,
    X,
}

impl DeviceKind {
    /// Device kind for a component, or `None` for ground symbols which only
    /// pin their node to 0. Unknown types are emitted as resistors.
    pub fn for_component(component_type: &ComponentType) -> Option<Self> {
        Some(match component_type {
            ComponentType::Resistor => DeviceKind::R,
            ComponentType::Capacitor => DeviceKind::C,
            ComponentType::Inductor => DeviceKind::L,
            ComponentType::VoltageSource => DeviceKind::V,
            ComponentType::CurrentSource => DeviceKind::I,
            ComponentType::Diode => DeviceKind::D,
            ComponentType::Transistor => DeviceKind::Q,
            ComponentType::OpAmp | ComponentType::Ic => DeviceKind::X,
            ComponentType::Ground => return None,
            ComponentType::Unknown(_) => DeviceKind::R,
        })
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            DeviceKind::R => "R",
            DeviceKind::C => "C",
            DeviceKind::L => "L",
            DeviceKind::V => "V",
            DeviceKind::I => "I",
            DeviceKind::D => "D",
            DeviceKind::Q => "Q",
            DeviceKind::X => "X",
        }
    }

    /// How many of the component's pins become device terminals; `None`
    /// means all of them.
    pub fn terminal_count(&self) -> Option<usize> {
        match self {
            DeviceKind::Q => Some(3),
            DeviceKind::X => None,
            _ => Some(2),
        }
    }

    pub fn is_reactive(&self) -> bool {
        matches!(self, DeviceKind::C | DeviceKind::L)
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// One device line of the deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpiceComponent {
    pub name: String,
    pub device_kind: DeviceKind,
    /// Electrical node ids, in terminal order.
    pub nodes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}

impl SpiceComponent {
    /// Model name if set, else the value.
    pub fn value_or_model(&self) -> Option<&str> {
        self.model.as_deref().or(self.value.as_deref())
    }
}

/// Parameters kept as metadata and never written into the device line.
pub const METADATA_PARAMETERS: [&str; 4] = ["tolerance", "voltage_rating", "note", "type"];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NetlistResult {
    pub netlist_text: String,
    pub lines: Vec<String>,
    pub devices: Vec<SpiceComponent>,
    /// Electrical node id -> SPICE node number. Ground nodes map to 0.
    pub node_mapping: BTreeMap<String, u32>,
    pub analysis_commands: Vec<String>,
    pub generation_success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NetlistResult {
    pub fn device(&self, name: &str) -> Option<&SpiceComponent> {
        self.devices.iter().find(|d| d.name == name)
    }
}

/// Failures inside synthesis. Reported through [`NetlistResult::error`],
/// never returned to callers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetlistError {
    #[error("pin {pin} of {component} belongs to no electrical node")]
    UnresolvedPin { component: String, pin: String },

    #[error("node {0} has no SPICE node number")]
    MissingNodeMapping(String),

    #[error("{component} needs {expected} terminals but has {found} pins")]
    TooFewPins {
        component: String,
        expected: usize,
        found: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_kind_mapping() {
        assert_eq!(DeviceKind::for_component(&ComponentType::OpAmp), Some(DeviceKind::X));
        assert_eq!(DeviceKind::for_component(&ComponentType::Ground), None);
        assert_eq!(
            DeviceKind::for_component(&ComponentType::from_label("thermistor")),
            Some(DeviceKind::R)
        );
        assert_eq!(DeviceKind::Q.terminal_count(), Some(3));
        assert!(DeviceKind::L.is_reactive());
    }

    #[test]
    fn test_value_or_model_prefers_model() {
        let device = SpiceComponent {
            name: "D1".to_string(),
            device_kind: DeviceKind::D,
            nodes: vec![],
            value: Some("x".to_string()),
            model: Some("1N4148".to_string()),
            parameters: BTreeMap::new(),
        };
        assert_eq!(device.value_or_model(), Some("1N4148"));
    }
}
