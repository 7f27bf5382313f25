//! Netlist Synthesizer
//!
//! Device naming, terminal node assignment, value normalization and deck
//! assembly. All per-run state (name counters) lives in a [`NameAllocator`]
//! created inside each [`NetlistSynthesizer::generate`] call.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::component::{ComponentType, DetectedComponent};
use crate::netlist::value::{ValueKind, ValueParser};
use crate::netlist::{
    DeviceKind, NetlistError, NetlistResult, SpiceComponent, METADATA_PARAMETERS,
};
use crate::topology::nodes::{ElectricalNode, NodeResolver};
use crate::topology::pins::Pin;

const DEFAULT_DIODE_MODEL: &str = "1N4148";
const DEFAULT_TRANSISTOR_MODEL: &str = "2N2222";
const DEFAULT_OPAMP_MODEL: &str = "UA741";
const LM358_MODEL: &str = "LM358";
const DEFAULT_IC_MODEL: &str = "GENERIC_IC";

/// Hands out device names for one synthesis run.
///
/// Human designations longer than one character are reused uppercased,
/// with the device letter prepended when they do not already start with it
/// (`LM358-A` on an op-amp becomes `XLM358-A`). They are reserved up front
/// so synthesized `<prefix><n>` names never collide with them. A repeated
/// designation is only honoured once; later holders get a synthesized name.
#[derive(Debug, Default)]
pub struct NameAllocator {
    reserved: HashSet<String>,
    used: HashSet<String>,
    counters: HashMap<&'static str, usize>,
}

impl NameAllocator {
    pub fn new(components: &[DetectedComponent]) -> Self {
        let reserved = components
            .iter()
            .filter_map(|c| {
                let kind = DeviceKind::for_component(&c.component_type)?;
                Self::designation(c, kind)
            })
            .collect();
        Self {
            reserved,
            ..Self::default()
        }
    }

    fn designation(component: &DetectedComponent, kind: DeviceKind) -> Option<String> {
        let name = component
            .designation
            .as_deref()
            .map(str::trim)
            .filter(|d| d.chars().count() > 1)
            .map(str::to_uppercase)?;
        if name.starts_with(kind.prefix()) {
            Some(name)
        } else {
            Some(format!("{}{}", kind.prefix(), name))
        }
    }

    pub fn allocate(&mut self, component: &DetectedComponent, kind: DeviceKind) -> String {
        if let Some(name) = Self::designation(component, kind) {
            if self.used.insert(name.clone()) {
                return name;
            }
            tracing::warn!(
                "Designation {} is used by more than one component; renaming {}",
                name,
                component.id
            );
        }

        let prefix = kind.prefix();
        let counter = self.counters.entry(prefix).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{}{}", prefix, counter);
            if !self.reserved.contains(&candidate) && self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

pub struct NetlistSynthesizer;

impl NetlistSynthesizer {
    /// Build the SPICE deck. Never fails: on an internal error the result is
    /// the header + `.op` + `.end` skeleton with `generation_success = false`.
    pub fn generate(
        components: &[DetectedComponent],
        pins: &[Pin],
        nodes: &[ElectricalNode],
        title: &str,
    ) -> NetlistResult {
        if components.is_empty() {
            tracing::info!("No components; emitting skeleton netlist");
            return Self::skeleton(title, true, None);
        }

        match Self::try_generate(components, pins, nodes, title) {
            Ok(result) => {
                tracing::info!(
                    "Generated netlist with {} devices and {} nodes",
                    result.devices.len(),
                    result.node_mapping.len()
                );
                result
            }
            Err(e) => {
                tracing::warn!("Netlist generation failed: {}", e);
                Self::skeleton(title, false, Some(e.to_string()))
            }
        }
    }

    fn try_generate(
        components: &[DetectedComponent],
        pins: &[Pin],
        nodes: &[ElectricalNode],
        title: &str,
    ) -> Result<NetlistResult, NetlistError> {
        let membership = NodeResolver::membership(nodes);
        let node_mapping = Self::node_mapping(components, nodes);

        let mut names = NameAllocator::new(components);
        let mut devices = Vec::new();
        for component in components {
            let Some(kind) = DeviceKind::for_component(&component.component_type) else {
                continue;
            };
            let name = names.allocate(component, kind);
            let terminals = Self::terminal_nodes(component, kind, pins, &membership)?;
            devices.push(Self::build_device(component, kind, name, terminals));
        }

        let mut device_lines = Vec::with_capacity(devices.len());
        for device in &devices {
            device_lines.push(Self::device_line(device, &node_mapping)?);
        }
        let analysis_commands = Self::analysis_commands(&devices);

        let mut lines = Self::header(title);
        lines.push(String::new());
        lines.push("* Circuit Components".to_string());
        lines.extend(device_lines);
        lines.push(String::new());
        lines.push("* Analysis Commands".to_string());
        lines.extend(analysis_commands.iter().cloned());
        lines.push(String::new());
        lines.push("* Control Commands".to_string());
        for control in [".control", "run", "print all", ".endc"] {
            lines.push(control.to_string());
        }
        lines.push(String::new());
        lines.push(".end".to_string());

        Ok(NetlistResult {
            netlist_text: lines.join("\n"),
            lines,
            devices,
            node_mapping,
            analysis_commands,
            generation_success: true,
            error: None,
        })
    }

    fn header(title: &str) -> Vec<String> {
        vec![
            format!("* SPICE Netlist Generated by {}", title),
            "* Generated from schematic analysis".to_string(),
        ]
    }

    fn skeleton(title: &str, success: bool, error: Option<String>) -> NetlistResult {
        let mut lines = Self::header(title);
        lines.push(String::new());
        lines.push(".op".to_string());
        lines.push(".end".to_string());
        NetlistResult {
            netlist_text: lines.join("\n"),
            lines,
            devices: Vec::new(),
            node_mapping: BTreeMap::new(),
            analysis_commands: vec![".op".to_string()],
            generation_success: success,
            error,
        }
    }

    /// Ground nodes get 0; every other node the next free positive number in
    /// node order.
    pub fn node_mapping(
        components: &[DetectedComponent],
        nodes: &[ElectricalNode],
    ) -> BTreeMap<String, u32> {
        let grounds: HashSet<&str> = components
            .iter()
            .filter(|c| c.component_type == ComponentType::Ground)
            .map(|c| c.id.as_str())
            .collect();

        let mut mapping = BTreeMap::new();
        let mut next = 1u32;
        for node in nodes {
            let is_ground = node
                .connected_components
                .iter()
                .any(|c| grounds.contains(c.as_str()));
            if is_ground {
                mapping.insert(node.node_id.clone(), 0);
            } else {
                mapping.insert(node.node_id.clone(), next);
                next += 1;
            }
        }

        if !nodes.is_empty() && !mapping.values().any(|&n| n == 0) {
            tracing::warn!("No ground symbol found; no node is mapped to 0");
        }
        mapping
    }

    fn terminal_nodes(
        component: &DetectedComponent,
        kind: DeviceKind,
        pins: &[Pin],
        membership: &HashMap<String, String>,
    ) -> Result<Vec<String>, NetlistError> {
        let own: Vec<&Pin> = pins.iter().filter(|p| p.component_id == component.id).collect();
        let wanted = kind.terminal_count().unwrap_or(own.len());
        if own.len() < wanted {
            return Err(NetlistError::TooFewPins {
                component: component.id.clone(),
                expected: wanted,
                found: own.len(),
            });
        }

        own.iter()
            .take(wanted)
            .map(|pin| {
                membership
                    .get(&pin.pin_id)
                    .cloned()
                    .ok_or_else(|| NetlistError::UnresolvedPin {
                        component: component.id.clone(),
                        pin: pin.pin_id.clone(),
                    })
            })
            .collect()
    }

    fn build_device(
        component: &DetectedComponent,
        kind: DeviceKind,
        name: String,
        nodes: Vec<String>,
    ) -> SpiceComponent {
        let raw_value = component.value.as_deref();
        let explicit_model = raw_value.map(str::trim).filter(|v| !v.is_empty());
        let mut parameters = BTreeMap::new();
        let mut value = None;
        let mut model = None;

        match &component.component_type {
            ComponentType::Resistor => {
                value = Some(ValueParser::parse(ValueKind::Resistance, raw_value).spice);
                if let Some(tolerance) = &component.tolerance {
                    parameters.insert("tolerance".to_string(), tolerance.clone());
                }
            }
            ComponentType::Capacitor => {
                value = Some(ValueParser::parse(ValueKind::Capacitance, raw_value).spice);
                parameters.insert(
                    "voltage_rating".to_string(),
                    estimate_voltage_rating(raw_value).to_string(),
                );
            }
            ComponentType::Inductor => {
                value = Some(ValueParser::parse(ValueKind::Inductance, raw_value).spice);
            }
            ComponentType::VoltageSource => {
                value = Some(ValueParser::parse(ValueKind::Voltage, raw_value).spice);
                parameters.insert("type".to_string(), "DC".to_string());
            }
            ComponentType::CurrentSource => {
                value = Some(ValueParser::parse(ValueKind::Current, raw_value).spice);
                parameters.insert("type".to_string(), "DC".to_string());
            }
            ComponentType::Diode => {
                model = Some(explicit_model.unwrap_or(DEFAULT_DIODE_MODEL).to_string());
                parameters.insert("area".to_string(), "1".to_string());
            }
            ComponentType::Transistor => {
                model = Some(explicit_model.unwrap_or(DEFAULT_TRANSISTOR_MODEL).to_string());
                parameters.insert("type".to_string(), "transistor".to_string());
            }
            ComponentType::OpAmp => {
                let chosen = match explicit_model {
                    Some(m) => m.to_string(),
                    None => opamp_model(component.designation.as_deref()).to_string(),
                };
                model = Some(chosen);
                parameters.insert("type".to_string(), "op_amp".to_string());
            }
            ComponentType::Ic => {
                model = Some(explicit_model.unwrap_or(DEFAULT_IC_MODEL).to_string());
                parameters.insert("type".to_string(), "ic".to_string());
            }
            ComponentType::Unknown(label) => {
                value = Some(ValueKind::Resistance.default_text().to_string());
                parameters.insert("note".to_string(), format!("Unknown component type: {}", label));
            }
            ComponentType::Ground => {}
        }

        tracing::debug!("{} ({}) -> nodes {:?}", name, component.id, nodes);
        SpiceComponent {
            name,
            device_kind: kind,
            nodes,
            value,
            model,
            parameters,
        }
    }

    fn device_line(
        device: &SpiceComponent,
        node_mapping: &BTreeMap<String, u32>,
    ) -> Result<String, NetlistError> {
        let mut parts = vec![device.name.clone()];
        for node in &device.nodes {
            let number = node_mapping
                .get(node)
                .ok_or_else(|| NetlistError::MissingNodeMapping(node.clone()))?;
            parts.push(number.to_string());
        }
        if let Some(v) = device.value_or_model() {
            parts.push(v.to_string());
        }
        for (key, value) in &device.parameters {
            if !METADATA_PARAMETERS.contains(&key.as_str()) {
                parts.push(format!("{}={}", key, value));
            }
        }
        Ok(parts.join(" "))
    }

    /// `.op` always; `.dc` over the first voltage source; `.ac` when any C or
    /// L is present; `.tran` always.
    pub fn analysis_commands(devices: &[SpiceComponent]) -> Vec<String> {
        let mut commands = vec![".op".to_string()];
        if let Some(source) = devices.iter().find(|d| d.device_kind == DeviceKind::V) {
            commands.push(format!(".dc {} 0 10 0.1", source.name));
        }
        if devices.iter().any(|d| d.device_kind.is_reactive()) {
            commands.push(".ac dec 10 1 1meg".to_string());
        }
        commands.push(".tran 1n 1u".to_string());
        commands
    }
}

/// Rough working-voltage guess from the capacitance prefix.
fn estimate_voltage_rating(raw_value: Option<&str>) -> &'static str {
    let Some(text) = raw_value.filter(|v| !v.trim().is_empty()) else {
        return "16V";
    };
    if text.contains(['μ', 'µ', 'u']) {
        "16V"
    } else if text.contains('n') {
        "50V"
    } else if text.contains('p') {
        "100V"
    } else {
        "25V"
    }
}

fn opamp_model(designation: Option<&str>) -> &'static str {
    match designation {
        Some(d) if d.to_lowercase().contains("lm358") => LM358_MODEL,
        _ => DEFAULT_OPAMP_MODEL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::BoundingBox;
    use crate::geometry::Point;

    fn comp(id: &str, t: ComponentType) -> DetectedComponent {
        DetectedComponent::new(id, BoundingBox::new(0.0, 0.0, 10.0, 10.0), t)
    }

    fn pin(component: &str, idx: usize) -> Pin {
        Pin {
            pin_id: format!("{}_pin_{}", component, idx),
            component_id: component.to_string(),
            position: Point::new(0, 0),
            pin_number: idx + 1,
            component_type: ComponentType::Resistor,
        }
    }

    fn node(id: &str, pin_ids: &[&str]) -> ElectricalNode {
        let mut components: Vec<String> = Vec::new();
        for p in pin_ids {
            let owner = p.split("_pin_").next().unwrap_or_default().to_string();
            if !components.contains(&owner) {
                components.push(owner);
            }
        }
        ElectricalNode {
            node_id: id.to_string(),
            position: Point::new(0, 0),
            connected_components: components,
            connection_count: pin_ids.len(),
            pin_ids: pin_ids.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_empty_components_skeleton() {
        let result = NetlistSynthesizer::generate(&[], &[], &[], "wiretrace");
        assert!(result.generation_success);
        assert!(result.devices.is_empty());
        assert_eq!(
            result.lines,
            vec![
                "* SPICE Netlist Generated by wiretrace",
                "* Generated from schematic analysis",
                "",
                ".op",
                ".end"
            ]
        );
    }

    #[test]
    fn test_series_resistors() {
        let components = vec![
            comp("R1", ComponentType::Resistor).with_designation("R1").with_value("10kΩ"),
            comp("R2", ComponentType::Resistor).with_designation("R2").with_value("4k7"),
        ];
        let pins = vec![pin("R1", 0), pin("R1", 1), pin("R2", 0), pin("R2", 1)];
        let nodes = vec![
            node("node_0", &["R1_pin_0"]),
            node("node_1", &["R1_pin_1", "R2_pin_0"]),
            node("node_2", &["R2_pin_1"]),
        ];
        let result = NetlistSynthesizer::generate(&components, &pins, &nodes, "wiretrace");

        assert!(result.generation_success);
        assert!(result.lines.contains(&"R1 1 2 10k".to_string()));
        assert!(result.lines.contains(&"R2 2 3 4.7k".to_string()));
        assert_eq!(result.node_mapping["node_1"], 2);
        assert_eq!(result.analysis_commands, vec![".op", ".tran 1n 1u"]);
        assert_eq!(result.lines.last().map(String::as_str), Some(".end"));
    }

    #[test]
    fn test_ground_maps_to_zero_and_source_directives() {
        let components = vec![
            comp("src", ComponentType::VoltageSource).with_value("9V"),
            comp("c", ComponentType::Capacitor).with_value("100nF"),
            comp("gnd", ComponentType::Ground),
        ];
        let pins = vec![pin("src", 0), pin("src", 1), pin("c", 0), pin("c", 1), pin("gnd", 0)];
        let nodes = vec![
            node("node_0", &["src_pin_0", "c_pin_0"]),
            node("node_1", &["src_pin_1", "c_pin_1", "gnd_pin_0"]),
        ];
        let result = NetlistSynthesizer::generate(&components, &pins, &nodes, "wiretrace");

        assert_eq!(result.node_mapping["node_0"], 1);
        assert_eq!(result.node_mapping["node_1"], 0);
        assert_eq!(result.devices.len(), 2);
        assert!(result.lines.contains(&"V1 1 0 9".to_string()));
        assert!(result.lines.contains(&"C1 1 0 100n".to_string()));
        assert_eq!(
            result.analysis_commands,
            vec![".op", ".dc V1 0 10 0.1", ".ac dec 10 1 1meg", ".tran 1n 1u"]
        );
        let c1 = result.device("C1").map(|d| d.parameters["voltage_rating"].clone());
        assert_eq!(c1.as_deref(), Some("50V"));
    }

    #[test]
    fn test_models_and_parameters() {
        let components = vec![
            comp("d", ComponentType::Diode),
            comp("q", ComponentType::Transistor),
            comp("u", ComponentType::OpAmp).with_designation("LM358-A"),
            comp("x", ComponentType::from_label("fuse")),
        ];
        let mut pins = vec![pin("d", 0), pin("d", 1), pin("x", 0), pin("x", 1)];
        pins.extend((0..4).map(|i| pin("q", i)));
        pins.extend((0..4).map(|i| pin("u", i)));
        let nodes: Vec<ElectricalNode> = pins
            .iter()
            .enumerate()
            .map(|(i, p)| node(&format!("node_{}", i), &[p.pin_id.as_str()]))
            .collect();
        let result = NetlistSynthesizer::generate(&components, &pins, &nodes, "wiretrace");

        assert!(result.generation_success);
        let d1 = result.device("D1").map(|d| d.device_kind);
        assert_eq!(d1, Some(DeviceKind::D));
        assert!(result.lines.contains(&"D1 1 2 1N4148 area=1".to_string()));
        let q = result.device("Q1").map(|d| (d.nodes.len(), d.model.clone()));
        assert_eq!(q, Some((3, Some("2N2222".to_string()))));
        assert!(result.device("LM358-A").is_none());
        let u = result.device("XLM358-A").map(|d| (d.nodes.len(), d.model.clone()));
        assert_eq!(u, Some((4, Some("LM358".to_string()))));
        let r = result.device("R1").map(|d| (d.value.clone(), d.parameters.contains_key("note")));
        assert_eq!(r, Some((Some("1k".to_string()), true)));
    }

    #[test]
    fn test_name_allocation_skips_designations() {
        let components = vec![
            comp("a", ComponentType::Resistor),
            comp("b", ComponentType::Resistor).with_designation("r1"),
            comp("c", ComponentType::Resistor).with_designation("R"),
        ];
        let mut names = NameAllocator::new(&components);
        assert_eq!(names.allocate(&components[0], DeviceKind::R), "R2");
        assert_eq!(names.allocate(&components[1], DeviceKind::R), "R1");
        assert_eq!(names.allocate(&components[2], DeviceKind::R), "R3");
    }

    #[test]
    fn test_designation_gets_device_letter() {
        let components = vec![
            comp("c", ComponentType::Capacitor).with_designation("R5"),
            comp("u", ComponentType::OpAmp).with_designation("u3"),
            comp("l", ComponentType::Inductor).with_designation("L2"),
        ];
        let mut names = NameAllocator::new(&components);
        assert_eq!(names.allocate(&components[0], DeviceKind::C), "CR5");
        assert_eq!(names.allocate(&components[1], DeviceKind::X), "XU3");
        assert_eq!(names.allocate(&components[2], DeviceKind::L), "L2");
    }

    #[test]
    fn test_repeated_designation_is_renamed() {
        let components = vec![
            comp("a", ComponentType::Resistor).with_designation("R1"),
            comp("b", ComponentType::Resistor).with_designation("R1"),
            comp("c", ComponentType::Resistor),
        ];
        let mut names = NameAllocator::new(&components);
        assert_eq!(names.allocate(&components[0], DeviceKind::R), "R1");
        assert_eq!(names.allocate(&components[1], DeviceKind::R), "R2");
        assert_eq!(names.allocate(&components[2], DeviceKind::R), "R3");
    }

    #[test]
    fn test_repeated_designation_netlist_names_unique() {
        let components = vec![
            comp("a", ComponentType::Resistor).with_designation("R1"),
            comp("b", ComponentType::Resistor).with_designation("R1"),
        ];
        let pins = vec![pin("a", 0), pin("a", 1), pin("b", 0), pin("b", 1)];
        let nodes = vec![
            node("node_0", &["a_pin_0"]),
            node("node_1", &["a_pin_1", "b_pin_0"]),
            node("node_2", &["b_pin_1"]),
        ];
        let result = NetlistSynthesizer::generate(&components, &pins, &nodes, "wiretrace");

        let names: HashSet<&str> = result.devices.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(result.lines.contains(&"R1 1 2 1k".to_string()));
        assert!(result.lines.contains(&"R2 2 3 1k".to_string()));
    }

    #[test]
    fn test_allocators_are_independent_per_run() {
        let components = vec![comp("a", ComponentType::Capacitor)];
        let mut first = NameAllocator::new(&components);
        let mut second = NameAllocator::new(&components);
        assert_eq!(first.allocate(&components[0], DeviceKind::C), "C1");
        assert_eq!(second.allocate(&components[0], DeviceKind::C), "C1");
    }

    #[test]
    fn test_unresolved_pin_downgrades_to_skeleton() {
        let components = vec![comp("R1", ComponentType::Resistor)];
        let pins = vec![pin("R1", 0), pin("R1", 1)];
        let result = NetlistSynthesizer::generate(&components, &pins, &[], "wiretrace");

        assert!(!result.generation_success);
        assert!(result.devices.is_empty());
        assert_eq!(result.lines.last().map(String::as_str), Some(".end"));
        assert!(result.error.as_deref().unwrap_or_default().contains("R1_pin_0"));
    }

    #[test]
    fn test_voltage_rating_estimate() {
        assert_eq!(estimate_voltage_rating(Some("10uF")), "16V");
        assert_eq!(estimate_voltage_rating(Some("22pF")), "100V");
        assert_eq!(estimate_voltage_rating(Some("1F")), "25V");
        assert_eq!(estimate_voltage_rating(None), "16V");
    }
}
