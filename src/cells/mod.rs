//! Logic cells: the unit of simulated behavior.
//!
//! A [`LogicCell`] carries what every cell shares (latched inputs, outputs, pin inversion, fan-out
//! edges, the Active flag) and a [`CellKind`] that owns the type-specific state machine. The
//! engine only ever talks to `LogicCell`; the kind is reached through the [`CellLogic`] trait.

mod flip_flops;
mod gates;
mod inputs;
mod net;
mod sequential;


pub use self::{
    flip_flops::{
        DFlipFlop, DMasterSlaveFlipFlop, JkFlipFlop, JkMasterSlaveFlipFlop, RsClockedFlipFlop,
        RsLatch, RsMasterSlaveFlipFlop, TFlipFlop,
    },
    gates::{Decoder, Demultiplexer, Encoder, FullAdder, Gate, GateOp, HalfAdder, Multiplexer},
    inputs::{Bridge, Button, Clock, Constant, Lamp, Switch},
    net::WireNet,
    sequential::{Counter, ShiftRegister},
};

use crate::components::{ComponentKind, FlipFlopStyle};
use serde::{Deserialize, Serialize};
use std::{fmt, ops::Not};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicState {
    #[default]
    Low,
    High,
}

impl LogicState {
    pub fn from_bool(high: bool) -> Self {
        if high {
            LogicState::High
        } else {
            LogicState::Low
        }
    }

    pub fn is_high(self) -> bool {
        self == LogicState::High
    }

    /// Applies an inversion flag.
    pub fn inverted_if(self, inverted: bool) -> Self {
        if inverted {
            !self
        } else {
            self
        }
    }
}

impl Not for LogicState {
    type Output = LogicState;

    fn not(self) -> LogicState {
        match self {
            LogicState::Low => LogicState::High,
            LogicState::High => LogicState::Low,
        }
    }
}

impl From<bool> for LogicState {
    fn from(high: bool) -> Self {
        LogicState::from_bool(high)
    }
}

/// Index of a cell inside the engine's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(usize);

impl CellId {
    pub fn new(index: usize) -> Self {
        CellId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell#{}", self.0)
    }
}

/// A fan-out edge: one input of another cell. The target is referenced by index only and is
/// never assumed to outlive the edge; shutdown severs edges explicitly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub target: CellId,
    pub input: usize,
}

/// Type-specific behavior of a cell.
pub trait CellLogic {
    /// Computes the next outputs and internal state from the latched inputs.
    ///
    /// Returns true if internal state worth repainting changed even though no output did.
    fn logic_function(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) -> bool;

    /// Restores the reset state on wake-up. `inputs` already hold the woken baseline.
    fn reset(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) {
        let _ = inputs;
        for output in outputs.iter_mut() {
            *output = LogicState::Low;
        }
    }
}

/// The reset level of the `(Q, !Q)` pair every flip-flop shares.
pub(crate) fn reset_q_pair(outputs: &mut [LogicState]) {
    outputs[0] = LogicState::Low;
    outputs[1] = LogicState::High;
}

pub(crate) fn set_q_pair(outputs: &mut [LogicState], q: LogicState) {
    outputs[0] = q;
    outputs[1] = !q;
}

/// Edge detector fed with one clock sample per tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClockSampler {
    previous: LogicState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockEdge {
    None,
    Rising,
    Falling,
}

impl ClockSampler {
    pub fn reset(&mut self, baseline: LogicState) {
        self.previous = baseline;
    }

    pub fn sample(&mut self, clock: LogicState) -> ClockEdge {
        let edge = match (self.previous, clock) {
            (LogicState::Low, LogicState::High) => ClockEdge::Rising,
            (LogicState::High, LogicState::Low) => ClockEdge::Falling,
            _ => ClockEdge::None,
        };
        self.previous = clock;
        edge
    }
}

#[derive(Clone, Debug)]
pub enum CellKind {
    Gate(Gate),
    HalfAdder(HalfAdder),
    FullAdder(FullAdder),
    Encoder(Encoder),
    Decoder(Decoder),
    Multiplexer(Multiplexer),
    Demultiplexer(Demultiplexer),
    RsLatch(RsLatch),
    RsClocked(RsClockedFlipFlop),
    RsMasterSlave(RsMasterSlaveFlipFlop),
    D(DFlipFlop),
    DMasterSlave(DMasterSlaveFlipFlop),
    T(TFlipFlop),
    Jk(JkFlipFlop),
    JkMasterSlave(JkMasterSlaveFlipFlop),
    ShiftRegister(ShiftRegister),
    Counter(Counter),
    Switch(Switch),
    Constant(Constant),
    Button(Button),
    Clock(Clock),
    Lamp(Lamp),
    Bridge(Bridge),
    Net(WireNet),
}

impl CellKind {
    pub fn from_component(kind: &ComponentKind) -> Self {
        match *kind {
            ComponentKind::AndGate { .. } => CellKind::Gate(Gate::new(GateOp::And)),
            ComponentKind::OrGate { .. } => CellKind::Gate(Gate::new(GateOp::Or)),
            ComponentKind::XorGate { .. } => CellKind::Gate(Gate::new(GateOp::Xor)),
            ComponentKind::NotGate => CellKind::Gate(Gate::new(GateOp::Not)),
            ComponentKind::BufferGate => CellKind::Gate(Gate::new(GateOp::Buffer)),
            ComponentKind::Input { state } => CellKind::Switch(Switch::new(state)),
            ComponentKind::Constant { state } => CellKind::Constant(Constant::new(state)),
            ComponentKind::Button => CellKind::Button(Button::default()),
            ComponentKind::Clock(config) => CellKind::Clock(Clock::new(config)),
            ComponentKind::Output => CellKind::Lamp(Lamp::default()),
            ComponentKind::HalfAdder => CellKind::HalfAdder(HalfAdder),
            ComponentKind::FullAdder => CellKind::FullAdder(FullAdder),
            ComponentKind::RsFlipFlop(FlipFlopStyle::Latch) => CellKind::RsLatch(RsLatch),
            ComponentKind::RsFlipFlop(FlipFlopStyle::Clocked) => {
                CellKind::RsClocked(RsClockedFlipFlop::default())
            }
            ComponentKind::RsFlipFlop(FlipFlopStyle::MasterSlave) => {
                CellKind::RsMasterSlave(RsMasterSlaveFlipFlop::default())
            }
            ComponentKind::DFlipFlop {
                master_slave: false,
            } => CellKind::D(DFlipFlop::default()),
            ComponentKind::DFlipFlop { master_slave: true } => {
                CellKind::DMasterSlave(DMasterSlaveFlipFlop::default())
            }
            ComponentKind::TFlipFlop => CellKind::T(TFlipFlop::default()),
            ComponentKind::JkFlipFlop {
                master_slave: false,
            } => CellKind::Jk(JkFlipFlop::default()),
            ComponentKind::JkFlipFlop { master_slave: true } => {
                CellKind::JkMasterSlave(JkMasterSlaveFlipFlop::default())
            }
            ComponentKind::Multiplexer { bit_width } => {
                CellKind::Multiplexer(Multiplexer::new(bit_width))
            }
            ComponentKind::Demultiplexer { bit_width } => {
                CellKind::Demultiplexer(Demultiplexer::new(bit_width))
            }
            ComponentKind::Decoder { .. } => CellKind::Decoder(Decoder),
            ComponentKind::Encoder { .. } => CellKind::Encoder(Encoder::default()),
            ComponentKind::ShiftRegister { .. } => {
                CellKind::ShiftRegister(ShiftRegister::default())
            }
            ComponentKind::Counter { .. } => CellKind::Counter(Counter::default()),
        }
    }

    fn logic(&mut self) -> &mut dyn CellLogic {
        match self {
            CellKind::Gate(c) => c,
            CellKind::HalfAdder(c) => c,
            CellKind::FullAdder(c) => c,
            CellKind::Encoder(c) => c,
            CellKind::Decoder(c) => c,
            CellKind::Multiplexer(c) => c,
            CellKind::Demultiplexer(c) => c,
            CellKind::RsLatch(c) => c,
            CellKind::RsClocked(c) => c,
            CellKind::RsMasterSlave(c) => c,
            CellKind::D(c) => c,
            CellKind::DMasterSlave(c) => c,
            CellKind::T(c) => c,
            CellKind::Jk(c) => c,
            CellKind::JkMasterSlave(c) => c,
            CellKind::ShiftRegister(c) => c,
            CellKind::Counter(c) => c,
            CellKind::Switch(c) => c,
            CellKind::Constant(c) => c,
            CellKind::Button(c) => c,
            CellKind::Clock(c) => c,
            CellKind::Lamp(c) => c,
            CellKind::Bridge(c) => c,
            CellKind::Net(c) => c,
        }
    }
}

/// The outcome of one tick for a single cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Advance {
    /// The cell raised its aggregate "changed" event.
    pub changed: bool,
}

#[derive(Clone, Debug)]
pub struct LogicCell {
    kind: CellKind,
    inputs: Vec<LogicState>,
    outputs: Vec<LogicState>,
    /// Outputs as of the end of the previous tick, used to find what needs propagating.
    published: Vec<LogicState>,
    input_inverted: Vec<bool>,
    output_inverted: Vec<bool>,
    fanout: Vec<Vec<Edge>>,
    active: bool,
    dirty: bool,
}

impl LogicCell {
    pub fn new(kind: CellKind, input_count: usize, output_count: usize) -> Self {
        LogicCell {
            kind,
            inputs: vec![LogicState::Low; input_count],
            outputs: vec![LogicState::Low; output_count],
            published: vec![LogicState::Low; output_count],
            input_inverted: vec![false; input_count],
            output_inverted: vec![false; output_count],
            fanout: vec![Vec::new(); output_count],
            active: false,
            dirty: false,
        }
    }

    pub fn from_component(kind: &ComponentKind) -> Self {
        kind.assert_bounds();
        Self::new(
            CellKind::from_component(kind),
            kind.input_count(),
            kind.output_count(),
        )
    }

    pub fn net() -> Self {
        Self::new(CellKind::Net(WireNet), 0, 1)
    }

    pub fn bridge() -> Self {
        Self::new(CellKind::Bridge(Bridge), 1, 1)
    }

    pub fn with_inversion(mut self, input_inverted: &[bool], output_inverted: &[bool]) -> Self {
        assert_eq!(input_inverted.len(), self.inputs.len());
        assert_eq!(output_inverted.len(), self.outputs.len());
        self.input_inverted = input_inverted.to_vec();
        self.output_inverted = output_inverted.to_vec();
        self
    }

    pub fn kind(&self) -> &CellKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut CellKind {
        &mut self.kind
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_input_inverted(&self, input: usize) -> bool {
        self.input_inverted[input]
    }

    pub fn is_output_inverted(&self, output: usize) -> bool {
        self.output_inverted[output]
    }

    pub fn fanout(&self, output: usize) -> &[Edge] {
        &self.fanout[output]
    }

    /// Records a directed edge from `output` of this cell to `input` of `target`.
    pub fn connect_output(&mut self, target: CellId, input: usize, output: usize) {
        assert!(
            output < self.outputs.len(),
            "output {} out of range, cell has {} outputs",
            output,
            self.outputs.len()
        );
        self.fanout[output].push(Edge { target, input });
    }

    /// Grows the input vector by one driving slot and returns its index. Only nets have a
    /// dynamic input count.
    pub fn add_input_slot(&mut self) -> usize {
        assert!(
            matches!(self.kind, CellKind::Net(_)),
            "input slots can only be added to nets"
        );
        self.inputs.push(LogicState::Low);
        self.input_inverted.push(false);
        self.inputs.len() - 1
    }

    /// Appends a fan-out target to a net's single output.
    pub fn append_output(&mut self, target: CellId, input: usize) {
        assert!(
            matches!(self.kind, CellKind::Net(_)),
            "fan-out targets can only be appended to nets"
        );
        self.connect_output(target, input, 0);
    }

    /// The value LogicFunction sees for `input` during the current tick.
    pub fn input_state(&self, input: usize) -> LogicState {
        assert!(
            input < self.inputs.len(),
            "input {} out of range, cell has {} inputs",
            input,
            self.inputs.len()
        );
        self.inputs[input]
    }

    /// The level `state` would be latched as, after input inversion.
    pub fn incoming_state(&self, input: usize, state: LogicState) -> LogicState {
        assert!(
            input < self.inputs.len(),
            "input {} out of range, cell has {} inputs",
            input,
            self.inputs.len()
        );
        state.inverted_if(self.active && self.input_inverted[input])
    }

    /// Makes a reported level visible to the next LogicFunction call.
    pub(crate) fn latch_input(&mut self, input: usize, state: LogicState) {
        self.inputs[input] = self.incoming_state(input, state);
    }

    pub fn output_state(&self, output: usize) -> LogicState {
        assert!(
            output < self.outputs.len(),
            "output {} out of range, cell has {} outputs",
            output,
            self.outputs.len()
        );
        self.outputs[output].inverted_if(self.active && self.output_inverted[output])
    }

    /// Runs LogicFunction and hands every output that changed since the previous tick (every
    /// output on the first tick after wake-up) to `notify`, already inverted.
    pub fn on_simulation_advance<F>(&mut self, mut notify: F) -> Advance
    where
        F: FnMut(Edge, LogicState),
    {
        if !self.active {
            return Advance::default();
        }

        let repaint = self.kind.logic().logic_function(&self.inputs, &mut self.outputs);
        let dirty = std::mem::replace(&mut self.dirty, false);

        if !dirty && !repaint && self.outputs == self.published {
            return Advance::default();
        }

        for output in 0..self.outputs.len() {
            if dirty || self.outputs[output] != self.published[output] {
                self.notify_successor(output, &mut notify);
            }
        }
        self.published.copy_from_slice(&self.outputs);

        Advance { changed: true }
    }

    fn notify_successor<F>(&self, output: usize, notify: &mut F)
    where
        F: FnMut(Edge, LogicState),
    {
        let state = self.output_state(output);
        for edge in &self.fanout[output] {
            notify(*edge, state);
        }
    }

    pub fn on_wake_up(&mut self) {
        for (input, inverted) in self.inputs.iter_mut().zip(self.input_inverted.iter()) {
            *input = LogicState::Low.inverted_if(*inverted);
        }
        self.kind.logic().reset(&self.inputs, &mut self.outputs);
        self.published.copy_from_slice(&self.outputs);
        self.dirty = true;
        self.active = true;
    }

    pub fn on_shutdown(&mut self) {
        for edges in self.fanout.iter_mut() {
            edges.clear();
        }
        for state in self.inputs.iter_mut() {
            *state = LogicState::Low;
        }
        self.kind.logic().reset(&self.inputs, &mut self.outputs);
        for state in self.outputs.iter_mut().chain(self.published.iter_mut()) {
            *state = LogicState::Low;
        }
        self.active = false;
        self.dirty = false;
    }
}
