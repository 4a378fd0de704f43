use crate::{
    cells::LogicState,
    consts::{
        COMPONENT_WIDTH, DEFAULT_CLOCK_PULSE_TICKS, DEFAULT_CLOCK_TOGGLE_TICKS, MAX_BIT_WIDTH,
        MAX_GATE_INPUT_COUNT, MIN_GATE_INPUT_COUNT, PIN_SPACING,
    },
    preprocessor::{merge_segments, t_crossing_points},
};
use serde::{Deserialize, Serialize};
use std::ops::Add;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// An axis-aligned piece of wire. `anchor` is the left end of a horizontal segment and the top
/// end of a vertical one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WireSegment {
    pub orientation: Orientation,
    pub anchor: Point,
    pub length: i32,
}

impl WireSegment {
    pub fn new(orientation: Orientation, anchor: Point, length: i32) -> Self {
        assert!(length >= 0, "wire segment with negative length {}", length);
        WireSegment {
            orientation,
            anchor,
            length,
        }
    }

    pub fn horizontal(x: i32, y: i32, length: i32) -> Self {
        Self::new(Orientation::Horizontal, Point::new(x, y), length)
    }

    pub fn vertical(x: i32, y: i32, length: i32) -> Self {
        Self::new(Orientation::Vertical, Point::new(x, y), length)
    }

    /// Builds the segment spanning `from` to `to` along `orientation`, in either direction.
    pub fn spanning(orientation: Orientation, offset: i32, from: i32, to: i32) -> Self {
        let (start, end) = if from <= to { (from, to) } else { (to, from) };
        match orientation {
            Orientation::Horizontal => Self::horizontal(start, offset, end - start),
            Orientation::Vertical => Self::vertical(offset, start, end - start),
        }
    }

    pub fn start(&self) -> Point {
        self.anchor
    }

    pub fn end(&self) -> Point {
        match self.orientation {
            Orientation::Horizontal => Point::new(self.anchor.x + self.length, self.anchor.y),
            Orientation::Vertical => Point::new(self.anchor.x, self.anchor.y + self.length),
        }
    }

    /// The coordinate that stays fixed along the segment.
    pub fn offset(&self) -> i32 {
        match self.orientation {
            Orientation::Horizontal => self.anchor.y,
            Orientation::Vertical => self.anchor.x,
        }
    }

    /// Inclusive start and end coordinates along the segment's axis.
    pub fn span(&self) -> (i32, i32) {
        let start = match self.orientation {
            Orientation::Horizontal => self.anchor.x,
            Orientation::Vertical => self.anchor.y,
        };
        (start, start + self.length)
    }

    fn axis_coordinates(&self, point: Point) -> (i32, i32) {
        match self.orientation {
            Orientation::Horizontal => (point.y, point.x),
            Orientation::Vertical => (point.x, point.y),
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        let (offset, along) = self.axis_coordinates(point);
        let (start, end) = self.span();
        offset == self.offset() && along >= start && along <= end
    }

    pub fn is_endpoint(&self, point: Point) -> bool {
        point == self.start() || point == self.end()
    }

    pub fn contains_strictly(&self, point: Point) -> bool {
        self.contains(point) && !self.is_endpoint(point)
    }

    /// True if `other` lies completely on this segment.
    pub fn covers(&self, other: &WireSegment) -> bool {
        self.orientation == other.orientation
            && self.contains(other.start())
            && self.contains(other.end())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionType {
    /// Crossing wires are joined into one net.
    Full,
    /// Vertical wire drives the horizontal wire, which passes over.
    BridgeX,
    /// Horizontal wire drives the vertical wire, which passes over.
    BridgeY,
}

impl ConnectionType {
    /// `(input side, output side)` orientations of a bridge, `None` for a full joint.
    pub fn bridge_orientations(self) -> Option<(Orientation, Orientation)> {
        match self {
            ConnectionType::Full => None,
            ConnectionType::BridgeX => Some((Orientation::Vertical, Orientation::Horizontal)),
            ConnectionType::BridgeY => Some((Orientation::Horizontal, Orientation::Vertical)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JunctionMarker {
    pub position: Point,
    pub connection: ConnectionType,
}

impl JunctionMarker {
    pub fn full(position: Point) -> Self {
        JunctionMarker {
            position,
            connection: ConnectionType::Full,
        }
    }

    pub fn bridge_x(position: Point) -> Self {
        JunctionMarker {
            position,
            connection: ConnectionType::BridgeX,
        }
    }

    pub fn bridge_y(position: Point) -> Self {
        JunctionMarker {
            position,
            connection: ConnectionType::BridgeY,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockMode {
    #[default]
    Toggle,
    Pulse,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockConfig {
    pub mode: ClockMode,
    pub toggle_ticks: u32,
    pub pulse_ticks: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        ClockConfig {
            mode: ClockMode::Toggle,
            toggle_ticks: DEFAULT_CLOCK_TOGGLE_TICKS,
            pulse_ticks: DEFAULT_CLOCK_PULSE_TICKS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlipFlopStyle {
    Latch,
    Clocked,
    MasterSlave,
}

/// Everything the simulation needs to know about a placed, non-wire component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentKind {
    AndGate { inputs: u8 },
    OrGate { inputs: u8 },
    XorGate { inputs: u8 },
    NotGate,
    BufferGate,
    Input { state: LogicState },
    Constant { state: LogicState },
    Button,
    Clock(ClockConfig),
    Output,
    HalfAdder,
    FullAdder,
    RsFlipFlop(FlipFlopStyle),
    DFlipFlop { master_slave: bool },
    TFlipFlop,
    JkFlipFlop { master_slave: bool },
    Multiplexer { bit_width: u8 },
    Demultiplexer { bit_width: u8 },
    Decoder { inputs: u8 },
    Encoder { outputs: u8 },
    ShiftRegister { bit_width: u8 },
    Counter { bit_width: u8 },
}

impl ComponentKind {
    /// Panics if a gate input count or a bit width lies outside the supported range.
    pub fn assert_bounds(&self) {
        match *self {
            ComponentKind::AndGate { inputs }
            | ComponentKind::OrGate { inputs }
            | ComponentKind::XorGate { inputs } => assert!(
                (MIN_GATE_INPUT_COUNT..=MAX_GATE_INPUT_COUNT).contains(&inputs),
                "gate input count {} outside {}..={}",
                inputs,
                MIN_GATE_INPUT_COUNT,
                MAX_GATE_INPUT_COUNT
            ),
            ComponentKind::Multiplexer { bit_width: width }
            | ComponentKind::Demultiplexer { bit_width: width }
            | ComponentKind::Decoder { inputs: width }
            | ComponentKind::Encoder { outputs: width }
            | ComponentKind::ShiftRegister { bit_width: width }
            | ComponentKind::Counter { bit_width: width } => assert!(
                (1..=MAX_BIT_WIDTH).contains(&width),
                "bit width {} of {:?} outside 1..={}",
                width,
                self,
                MAX_BIT_WIDTH
            ),
            _ => {}
        }
    }

    pub fn input_count(&self) -> usize {
        match *self {
            ComponentKind::AndGate { inputs }
            | ComponentKind::OrGate { inputs }
            | ComponentKind::XorGate { inputs } => usize::from(inputs),
            ComponentKind::NotGate | ComponentKind::BufferGate | ComponentKind::Output => 1,
            ComponentKind::Input { .. }
            | ComponentKind::Constant { .. }
            | ComponentKind::Button
            | ComponentKind::Clock(_) => 0,
            ComponentKind::HalfAdder => 2,
            ComponentKind::FullAdder => 3,
            ComponentKind::RsFlipFlop(FlipFlopStyle::Latch) => 2,
            ComponentKind::RsFlipFlop(_) => 3,
            ComponentKind::DFlipFlop { .. } | ComponentKind::TFlipFlop => 2,
            ComponentKind::JkFlipFlop { .. } => 3,
            ComponentKind::Multiplexer { bit_width } => {
                usize::from(bit_width) + (1 << bit_width)
            }
            ComponentKind::Demultiplexer { bit_width } => usize::from(bit_width) + 1,
            ComponentKind::Decoder { inputs } => usize::from(inputs),
            ComponentKind::Encoder { outputs } => 1 << outputs,
            ComponentKind::ShiftRegister { .. } | ComponentKind::Counter { .. } => 2,
        }
    }

    pub fn output_count(&self) -> usize {
        match *self {
            ComponentKind::Output => 0,
            ComponentKind::AndGate { .. }
            | ComponentKind::OrGate { .. }
            | ComponentKind::XorGate { .. }
            | ComponentKind::NotGate
            | ComponentKind::BufferGate
            | ComponentKind::Input { .. }
            | ComponentKind::Constant { .. }
            | ComponentKind::Button
            | ComponentKind::Clock(_)
            | ComponentKind::Multiplexer { .. } => 1,
            ComponentKind::HalfAdder
            | ComponentKind::FullAdder
            | ComponentKind::RsFlipFlop(_)
            | ComponentKind::DFlipFlop { .. }
            | ComponentKind::TFlipFlop
            | ComponentKind::JkFlipFlop { .. } => 2,
            ComponentKind::Demultiplexer { bit_width } => 1 << bit_width,
            ComponentKind::Decoder { inputs } => 1 << inputs,
            ComponentKind::Encoder { outputs } => usize::from(outputs) + 1,
            ComponentKind::ShiftRegister { bit_width } | ComponentKind::Counter { bit_width } => {
                usize::from(bit_width)
            }
        }
    }

    pub fn has_master_slave(&self) -> bool {
        matches!(
            self,
            ComponentKind::DFlipFlop { .. } | ComponentKind::JkFlipFlop { .. }
        )
    }

    /// Switches a D or JK flip-flop between its plain and master-slave form.
    ///
    /// Panics for every other family.
    pub fn set_master_slave(&mut self, enabled: bool) {
        match self {
            ComponentKind::DFlipFlop { master_slave }
            | ComponentKind::JkFlipFlop { master_slave } => *master_slave = enabled,
            other => panic!("master-slave toggled for unapplicable component {:?}", other),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    pub kind: ComponentKind,
    pub position: Point,
    /// Pin points relative to `position`.
    pub input_pins: Vec<Point>,
    pub output_pins: Vec<Point>,
    pub input_inverted: Vec<bool>,
    pub output_inverted: Vec<bool>,
}

impl Component {
    /// Creates a component with the default layout: inputs stacked in the left column,
    /// outputs stacked `COMPONENT_WIDTH` to the right. Sources without inputs put their
    /// outputs on the left column.
    ///
    /// Panics if `kind` is out of bounds, see [`ComponentKind::assert_bounds`].
    pub fn new(kind: ComponentKind, position: Point) -> Self {
        kind.assert_bounds();
        let input_count = kind.input_count();
        let output_count = kind.output_count();
        let output_column = if input_count == 0 { 0 } else { COMPONENT_WIDTH };

        Component {
            kind,
            position,
            input_pins: (0..input_count)
                .map(|i| Point::new(0, i as i32 * PIN_SPACING))
                .collect(),
            output_pins: (0..output_count)
                .map(|i| Point::new(output_column, i as i32 * PIN_SPACING))
                .collect(),
            input_inverted: vec![false; input_count],
            output_inverted: vec![false; output_count],
        }
    }

    pub fn with_pins(mut self, input_pins: Vec<Point>, output_pins: Vec<Point>) -> Self {
        assert_eq!(input_pins.len(), self.kind.input_count());
        assert_eq!(output_pins.len(), self.kind.output_count());
        self.input_pins = input_pins;
        self.output_pins = output_pins;
        self
    }

    pub fn with_inverted_input(mut self, input: usize) -> Self {
        self.input_inverted[input] = true;
        self
    }

    pub fn with_inverted_output(mut self, output: usize) -> Self {
        self.output_inverted[output] = true;
        self
    }

    pub fn input_pin(&self, input: usize) -> Point {
        self.position + self.input_pins[input]
    }

    pub fn output_pin(&self, output: usize) -> Point {
        self.position + self.output_pins[output]
    }
}

/// The placed geometry handed over by the editing layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Circuit {
    pub segments: Vec<WireSegment>,
    pub markers: Vec<JunctionMarker>,
    pub components: Vec<Component>,
}

impl Circuit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_component(&mut self, component: Component) -> usize {
        self.components.push(component);
        self.components.len() - 1
    }

    pub fn add_marker(&mut self, marker: JunctionMarker) -> usize {
        self.markers.push(marker);
        self.markers.len() - 1
    }

    /// Places a wire the way the editor does: collinear wires touching or overlapping the new
    /// one are merged into it, and every T-crossing the merged wire forms gets a FULL marker
    /// unless one already sits there.
    pub fn add_segment(&mut self, segment: WireSegment) {
        self.segments.push(segment);
        self.segments = merge_segments(&self.segments);

        let placed = match self.segments.iter().find(|s| s.covers(&segment)) {
            Some(placed) => *placed,
            None => return,
        };

        for point in t_crossing_points(&self.segments, &placed) {
            if !self.markers.iter().any(|m| m.position == point) {
                self.markers.push(JunctionMarker::full(point));
            }
        }
    }

    pub fn set_marker_connection(&mut self, marker: usize, connection: ConnectionType) {
        self.markers[marker].connection = connection;
    }
}
