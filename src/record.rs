//! Flat, serializable form of placed geometry.
//!
//! Every wire, junction marker and component is saved as one [`ComponentRecord`] tagged
//! with a numeric type id. The full document layer lives elsewhere; [`CircuitDocument`] is
//! the minimal JSON container the demo binary and tests use.

use crate::{
    cells::LogicState,
    components::{
        Circuit, ClockConfig, Component, ComponentKind, ConnectionType, FlipFlopStyle,
        JunctionMarker, Orientation, Point, WireSegment,
    },
    consts::{
        COMPATIBLE_VERSION, CURRENT_VERSION, DEFAULT_GATE_INPUT_COUNT, MAX_BIT_WIDTH,
        MAX_GATE_INPUT_COUNT, MIN_GATE_INPUT_COUNT,
    },
    error::{DocumentError, RecordError},
};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    io::{Read, Write},
};
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SwVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SwVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        SwVersion {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for SwVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VersionCheck {
    Compatible,
    /// Saved by a newer version, but loadable by this one.
    NewerCompatible(SwVersion),
    /// Needs at least the carried version.
    NewerIncompatible(SwVersion),
}

/// Compares a document's version and compatibility floor with [`CURRENT_VERSION`].
pub fn check_version(saved: SwVersion, compatible_floor: SwVersion) -> VersionCheck {
    check_version_against(CURRENT_VERSION, saved, compatible_floor)
}

fn check_version_against(
    current: SwVersion,
    saved: SwVersion,
    compatible_floor: SwVersion,
) -> VersionCheck {
    if compatible_floor > current {
        VersionCheck::NewerIncompatible(compatible_floor)
    } else if saved > current {
        VersionCheck::NewerCompatible(saved)
    } else {
        VersionCheck::Compatible
    }
}

pub mod type_id {
    pub const AND_GATE: u32 = 0;
    pub const OR_GATE: u32 = 1;
    pub const XOR_GATE: u32 = 2;
    pub const NOT_GATE: u32 = 3;
    pub const BUFFER_GATE: u32 = 4;
    pub const WIRE: u32 = 5;
    pub const JUNCTION: u32 = 6;
    pub const TEXT_LABEL: u32 = 7;
    pub const INPUT: u32 = 8;
    pub const CONSTANT: u32 = 9;
    pub const BUTTON: u32 = 10;
    pub const CLOCK: u32 = 11;
    pub const OUTPUT: u32 = 12;
    pub const HALF_ADDER: u32 = 13;
    pub const FULL_ADDER: u32 = 14;
    pub const RS_FLIPFLOP: u32 = 15;
    pub const D_FLIPFLOP: u32 = 16;
    pub const D_MS_FLIPFLOP: u32 = 17;
    pub const T_FLIPFLOP: u32 = 18;
    pub const JK_FLIPFLOP: u32 = 19;
    pub const JK_MS_FLIPFLOP: u32 = 20;
    pub const RS_MS_FLIPFLOP: u32 = 21;
    pub const RS_CLOCKED_FLIPFLOP: u32 = 22;
    pub const MULTIPLEXER: u32 = 23;
    pub const DEMULTIPLEXER: u32 = 24;
    pub const DECODER: u32 = 25;
    pub const ENCODER: u32 = 26;
    pub const SHIFT_REGISTER: u32 = 27;
    pub const COUNTER: u32 = 28;
}

/// One saved element. Fields not used by a type are left out.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentRecord {
    #[serde(rename = "type")]
    pub type_id: u32,
    pub x: i32,
    pub y: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_width: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<LogicState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clock: Option<ClockConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub input_inverted: Vec<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub output_inverted: Vec<bool>,
}

/// What a record turns back into.
#[derive(Clone, Debug, PartialEq)]
pub enum Element {
    Segment(WireSegment),
    Marker(JunctionMarker),
    Component(Component),
    /// Annotation without simulated behavior.
    Label,
}

fn gate_inputs(record: &ComponentRecord) -> Result<u8, RecordError> {
    let inputs = record.inputs.unwrap_or(DEFAULT_GATE_INPUT_COUNT);
    if !(MIN_GATE_INPUT_COUNT..=MAX_GATE_INPUT_COUNT).contains(&inputs) {
        return Err(RecordError::invalid(
            record.type_id,
            "inputs",
            format!("{} outside {}..={}", inputs, MIN_GATE_INPUT_COUNT, MAX_GATE_INPUT_COUNT),
        ));
    }
    Ok(inputs)
}

fn width(record: &ComponentRecord, field: &'static str, value: Option<u8>) -> Result<u8, RecordError> {
    let value = value.ok_or_else(|| RecordError::missing(record.type_id, field))?;
    if value == 0 || value > MAX_BIT_WIDTH {
        return Err(RecordError::invalid(
            record.type_id,
            field,
            format!("{} outside 1..={}", value, MAX_BIT_WIDTH),
        ));
    }
    Ok(value)
}

fn inversion(
    record: &ComponentRecord,
    field: &'static str,
    saved: &[bool],
    count: usize,
) -> Result<Vec<bool>, RecordError> {
    match saved.len() {
        0 => Ok(vec![false; count]),
        len if len == count => Ok(saved.to_vec()),
        len => Err(RecordError::invalid(
            record.type_id,
            field,
            format!("{} flags for {} pins", len, count),
        )),
    }
}

impl ComponentRecord {
    fn at(type_id: u32, position: Point) -> Self {
        ComponentRecord {
            type_id,
            x: position.x,
            y: position.y,
            ..Default::default()
        }
    }

    pub fn segment(segment: &WireSegment) -> Self {
        ComponentRecord {
            orientation: Some(segment.orientation),
            length: Some(segment.length),
            ..Self::at(type_id::WIRE, segment.anchor)
        }
    }

    pub fn marker(marker: &JunctionMarker) -> Self {
        ComponentRecord {
            connection: Some(marker.connection),
            ..Self::at(type_id::JUNCTION, marker.position)
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    fn component_kind(&self) -> Result<ComponentKind, RecordError> {
        use self::type_id::*;

        let kind = match self.type_id {
            AND_GATE => ComponentKind::AndGate {
                inputs: gate_inputs(self)?,
            },
            OR_GATE => ComponentKind::OrGate {
                inputs: gate_inputs(self)?,
            },
            XOR_GATE => ComponentKind::XorGate {
                inputs: gate_inputs(self)?,
            },
            NOT_GATE => ComponentKind::NotGate,
            BUFFER_GATE => ComponentKind::BufferGate,
            INPUT => ComponentKind::Input {
                state: self.state.unwrap_or_default(),
            },
            CONSTANT => ComponentKind::Constant {
                state: self
                    .state
                    .ok_or_else(|| RecordError::missing(self.type_id, "state"))?,
            },
            BUTTON => ComponentKind::Button,
            CLOCK => ComponentKind::Clock(self.clock.unwrap_or_default()),
            OUTPUT => ComponentKind::Output,
            HALF_ADDER => ComponentKind::HalfAdder,
            FULL_ADDER => ComponentKind::FullAdder,
            RS_FLIPFLOP => ComponentKind::RsFlipFlop(FlipFlopStyle::Latch),
            RS_CLOCKED_FLIPFLOP => ComponentKind::RsFlipFlop(FlipFlopStyle::Clocked),
            RS_MS_FLIPFLOP => ComponentKind::RsFlipFlop(FlipFlopStyle::MasterSlave),
            D_FLIPFLOP => ComponentKind::DFlipFlop {
                master_slave: false,
            },
            D_MS_FLIPFLOP => ComponentKind::DFlipFlop { master_slave: true },
            T_FLIPFLOP => ComponentKind::TFlipFlop,
            JK_FLIPFLOP => ComponentKind::JkFlipFlop {
                master_slave: false,
            },
            JK_MS_FLIPFLOP => ComponentKind::JkFlipFlop { master_slave: true },
            MULTIPLEXER => ComponentKind::Multiplexer {
                bit_width: width(self, "bit_width", self.bit_width)?,
            },
            DEMULTIPLEXER => ComponentKind::Demultiplexer {
                bit_width: width(self, "bit_width", self.bit_width)?,
            },
            DECODER => ComponentKind::Decoder {
                inputs: width(self, "inputs", self.inputs)?,
            },
            ENCODER => ComponentKind::Encoder {
                outputs: width(self, "outputs", self.outputs)?,
            },
            SHIFT_REGISTER => ComponentKind::ShiftRegister {
                bit_width: width(self, "bit_width", self.bit_width)?,
            },
            COUNTER => ComponentKind::Counter {
                bit_width: width(self, "bit_width", self.bit_width)?,
            },
            other => return Err(RecordError::NotRecognized(other)),
        };
        Ok(kind)
    }

    pub fn to_element(&self) -> Result<Element, RecordError> {
        match self.type_id {
            type_id::WIRE => {
                let orientation = self
                    .orientation
                    .ok_or_else(|| RecordError::missing(self.type_id, "orientation"))?;
                let length = self
                    .length
                    .ok_or_else(|| RecordError::missing(self.type_id, "length"))?;
                if length < 0 {
                    return Err(RecordError::invalid(self.type_id, "length", "negative"));
                }
                Ok(Element::Segment(WireSegment::new(
                    orientation,
                    self.position(),
                    length,
                )))
            }
            type_id::JUNCTION => Ok(Element::Marker(JunctionMarker {
                position: self.position(),
                connection: self.connection.unwrap_or(ConnectionType::Full),
            })),
            type_id::TEXT_LABEL => Ok(Element::Label),
            _ => {
                let kind = self.component_kind()?;
                let mut component = Component::new(kind, self.position());
                component.input_inverted = inversion(
                    self,
                    "input_inverted",
                    &self.input_inverted,
                    kind.input_count(),
                )?;
                component.output_inverted = inversion(
                    self,
                    "output_inverted",
                    &self.output_inverted,
                    kind.output_count(),
                )?;
                Ok(Element::Component(component))
            }
        }
    }
}

impl Component {
    /// The saved form of this component, including its configuration and pin inversion.
    pub fn to_record(&self) -> ComponentRecord {
        use self::type_id::*;

        let mut record = ComponentRecord::at(0, self.position);
        record.type_id = match self.kind {
            ComponentKind::AndGate { inputs } => {
                record.inputs = Some(inputs);
                AND_GATE
            }
            ComponentKind::OrGate { inputs } => {
                record.inputs = Some(inputs);
                OR_GATE
            }
            ComponentKind::XorGate { inputs } => {
                record.inputs = Some(inputs);
                XOR_GATE
            }
            ComponentKind::NotGate => NOT_GATE,
            ComponentKind::BufferGate => BUFFER_GATE,
            ComponentKind::Input { state } => {
                record.state = Some(state);
                INPUT
            }
            ComponentKind::Constant { state } => {
                record.state = Some(state);
                CONSTANT
            }
            ComponentKind::Button => BUTTON,
            ComponentKind::Clock(config) => {
                record.clock = Some(config);
                CLOCK
            }
            ComponentKind::Output => OUTPUT,
            ComponentKind::HalfAdder => HALF_ADDER,
            ComponentKind::FullAdder => FULL_ADDER,
            ComponentKind::RsFlipFlop(FlipFlopStyle::Latch) => RS_FLIPFLOP,
            ComponentKind::RsFlipFlop(FlipFlopStyle::Clocked) => RS_CLOCKED_FLIPFLOP,
            ComponentKind::RsFlipFlop(FlipFlopStyle::MasterSlave) => RS_MS_FLIPFLOP,
            ComponentKind::DFlipFlop { master_slave } => {
                if master_slave {
                    D_MS_FLIPFLOP
                } else {
                    D_FLIPFLOP
                }
            }
            ComponentKind::TFlipFlop => T_FLIPFLOP,
            ComponentKind::JkFlipFlop { master_slave } => {
                if master_slave {
                    JK_MS_FLIPFLOP
                } else {
                    JK_FLIPFLOP
                }
            }
            ComponentKind::Multiplexer { bit_width } => {
                record.bit_width = Some(bit_width);
                MULTIPLEXER
            }
            ComponentKind::Demultiplexer { bit_width } => {
                record.bit_width = Some(bit_width);
                DEMULTIPLEXER
            }
            ComponentKind::Decoder { inputs } => {
                record.inputs = Some(inputs);
                DECODER
            }
            ComponentKind::Encoder { outputs } => {
                record.outputs = Some(outputs);
                ENCODER
            }
            ComponentKind::ShiftRegister { bit_width } => {
                record.bit_width = Some(bit_width);
                SHIFT_REGISTER
            }
            ComponentKind::Counter { bit_width } => {
                record.bit_width = Some(bit_width);
                COUNTER
            }
        };

        if self.input_inverted.iter().any(|i| *i) {
            record.input_inverted = self.input_inverted.clone();
        }
        if self.output_inverted.iter().any(|i| *i) {
            record.output_inverted = self.output_inverted.clone();
        }
        record
    }
}

impl Circuit {
    /// Rebuilds a circuit from saved records. Records that cannot be read are logged and
    /// skipped; the rest of the circuit still loads.
    pub fn from_records(records: &[ComponentRecord]) -> Self {
        let mut circuit = Circuit::new();
        for (index, record) in records.iter().enumerate() {
            match record.to_element() {
                Ok(Element::Segment(segment)) => circuit.segments.push(segment),
                Ok(Element::Marker(marker)) => {
                    circuit.add_marker(marker);
                }
                Ok(Element::Component(component)) => {
                    circuit.add_component(component);
                }
                Ok(Element::Label) => {}
                Err(err) => warn!(record = index, error = %err, "skipping component record"),
            }
        }
        circuit
    }

    pub fn to_records(&self) -> Vec<ComponentRecord> {
        self.segments
            .iter()
            .map(ComponentRecord::segment)
            .chain(self.markers.iter().map(ComponentRecord::marker))
            .chain(self.components.iter().map(Component::to_record))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CircuitDocument {
    pub version: SwVersion,
    pub compatible_version: SwVersion,
    #[serde(default)]
    pub components: Vec<ComponentRecord>,
}

impl CircuitDocument {
    pub fn from_circuit(circuit: &Circuit) -> Self {
        CircuitDocument {
            version: CURRENT_VERSION,
            compatible_version: COMPATIBLE_VERSION,
            components: circuit.to_records(),
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DocumentError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), DocumentError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn check_version(&self) -> VersionCheck {
        check_version(self.version, self.compatible_version)
    }

    /// Loads the circuit, refusing documents that need a newer simulator.
    pub fn into_circuit(self) -> Result<Circuit, DocumentError> {
        match self.check_version() {
            VersionCheck::NewerIncompatible(version) => {
                return Err(DocumentError::NewerIncompatible(version))
            }
            VersionCheck::NewerCompatible(version) => {
                warn!(%version, "circuit was saved by a newer version")
            }
            VersionCheck::Compatible => {}
        }
        Ok(Circuit::from_records(&self.components))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_checks() {
        let current = SwVersion::new(1, 2, 3);
        assert_eq!(
            VersionCheck::Compatible,
            check_version_against(current, SwVersion::new(1, 2, 3), SwVersion::new(1, 0, 0))
        );
        assert_eq!(
            VersionCheck::NewerCompatible(SwVersion::new(1, 3, 0)),
            check_version_against(current, SwVersion::new(1, 3, 0), SwVersion::new(1, 1, 0))
        );
        assert_eq!(
            VersionCheck::NewerIncompatible(SwVersion::new(2, 0, 0)),
            check_version_against(current, SwVersion::new(2, 0, 1), SwVersion::new(2, 0, 0))
        );
        assert_eq!(
            VersionCheck::Compatible,
            check_version(CURRENT_VERSION, COMPATIBLE_VERSION)
        );
    }

    #[test]
    fn unknown_type_is_not_recognized() {
        let record = ComponentRecord {
            type_id: 99,
            ..Default::default()
        };
        assert_eq!(Err(RecordError::NotRecognized(99)), record.to_element());
    }

    #[test]
    fn bad_records_are_reported() {
        let wire = ComponentRecord {
            type_id: type_id::WIRE,
            orientation: Some(Orientation::Vertical),
            ..Default::default()
        };
        assert_eq!(
            Err(RecordError::missing(type_id::WIRE, "length")),
            wire.to_element()
        );

        let gate = ComponentRecord {
            type_id: type_id::AND_GATE,
            inputs: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            gate.to_element(),
            Err(RecordError::InvalidValue { field: "inputs", .. })
        ));

        let counter = ComponentRecord {
            type_id: type_id::COUNTER,
            ..Default::default()
        };
        assert_eq!(
            Err(RecordError::missing(type_id::COUNTER, "bit_width")),
            counter.to_element()
        );

        let not = ComponentRecord {
            type_id: type_id::NOT_GATE,
            input_inverted: vec![true, false],
            ..Default::default()
        };
        assert!(not.to_element().is_err());
    }

    #[test]
    fn bulk_load_skips_bad_records() {
        let records = vec![
            ComponentRecord::segment(&WireSegment::horizontal(0, 0, 4)),
            ComponentRecord {
                type_id: 1000,
                ..Default::default()
            },
            ComponentRecord {
                type_id: type_id::TEXT_LABEL,
                text: Some("note".to_string()),
                ..Default::default()
            },
            Component::new(ComponentKind::NotGate, Point::new(1, 1)).to_record(),
        ];

        let circuit = Circuit::from_records(&records);
        assert_eq!(vec![WireSegment::horizontal(0, 0, 4)], circuit.segments);
        assert_eq!(1, circuit.components.len());
        assert_eq!(ComponentKind::NotGate, circuit.components[0].kind);
    }

    #[test]
    fn document_json_round_trip() {
        let mut circuit = Circuit::new();
        circuit.add_segment(WireSegment::horizontal(0, 0, 6));
        circuit.add_segment(WireSegment::vertical(3, 0, 4));
        circuit.set_marker_connection(0, ConnectionType::BridgeX);
        circuit.add_component(
            Component::new(ComponentKind::XorGate { inputs: 3 }, Point::new(-2, 0))
                .with_inverted_input(1),
        );
        circuit.add_component(Component::new(
            ComponentKind::Clock(ClockConfig::default()),
            Point::new(6, 0),
        ));
        circuit.add_component(Component::new(
            ComponentKind::JkFlipFlop { master_slave: true },
            Point::new(10, 10),
        ));
        circuit.add_component(
            Component::new(ComponentKind::Counter { bit_width: 4 }, Point::new(0, 9))
                .with_inverted_output(3),
        );

        let mut json = Vec::new();
        CircuitDocument::from_circuit(&circuit)
            .to_writer(&mut json)
            .unwrap();

        let document = CircuitDocument::from_reader(json.as_slice()).unwrap();
        assert_eq!(VersionCheck::Compatible, document.check_version());
        assert_eq!(circuit, document.into_circuit().unwrap());
    }

    #[test]
    fn newer_incompatible_document_is_refused() {
        let json = r#"{
            "version": { "major": 99, "minor": 0, "patch": 0 },
            "compatible_version": { "major": 99, "minor": 0, "patch": 0 },
            "components": []
        }"#;

        let document = CircuitDocument::from_reader(json.as_bytes()).unwrap();
        match document.into_circuit() {
            Err(DocumentError::NewerIncompatible(version)) => {
                assert_eq!(SwVersion::new(99, 0, 0), version)
            }
            other => panic!("unexpected load result: {:?}", other),
        }
    }

    #[test]
    fn newer_compatible_document_loads() {
        let json = r#"{
            "version": { "major": 99, "minor": 0, "patch": 0 },
            "compatible_version": { "major": 0, "minor": 0, "patch": 1 },
            "components": [ { "type": 12, "x": 4, "y": 2 } ]
        }"#;

        let document = CircuitDocument::from_reader(json.as_bytes()).unwrap();
        assert_eq!(
            VersionCheck::NewerCompatible(SwVersion::new(99, 0, 0)),
            document.check_version()
        );
        let circuit = document.into_circuit().unwrap();
        assert_eq!(
            vec![Component::new(ComponentKind::Output, Point::new(4, 2))],
            circuit.components
        );
    }

    #[test]
    fn master_slave_toggle() {
        let mut kind = ComponentKind::DFlipFlop {
            master_slave: false,
        };
        assert!(kind.has_master_slave());
        kind.set_master_slave(true);
        assert_eq!(type_id::D_MS_FLIPFLOP, Component::new(kind, Point::default()).to_record().type_id);
    }

    #[test]
    #[should_panic]
    fn master_slave_toggle_on_gate_panics() {
        ComponentKind::AndGate { inputs: 2 }.set_master_slave(true);
    }
}
