//! Tick-based simulation of digital logic circuits.
//!
//! Placed geometry ([`Circuit`]) is turned into a graph of logic cells when a [`Simulation`]
//! is entered: every component becomes one cell, every electrically connected group of wire
//! segments becomes one net cell. The session then advances the graph one tick at a time,
//! with exactly one tick of latency per hop.

mod cells;
mod changed_cells;
mod components;
mod consts;
mod engine;
mod error;
mod latch_swap_list;
mod preprocessor;
mod record;

#[cfg(test)]
mod tests;

pub use crate::{
    cells::{
        Advance, CellId, CellKind, CellLogic, ClockEdge, ClockSampler, Edge, LogicCell,
        LogicState,
    },
    components::{
        Circuit, ClockConfig, ClockMode, Component, ComponentKind, ConnectionType,
        FlipFlopStyle, JunctionMarker, Orientation, Point, WireSegment,
    },
    consts::*,
    engine::Engine,
    error::{DocumentError, RecordError},
    preprocessor::{
        build_network, classify_crossing, classify_point, collision_point, is_l_crossing,
        is_t_crossing, is_x_crossing, merge_segments, t_crossing_points, Crossing, Net,
        PinConnections, PointKind, WireNetwork,
    },
    record::{
        check_version, type_id, CircuitDocument, ComponentRecord, Element, SwVersion,
        VersionCheck,
    },
};

use std::{cell::Cell, rc::Rc};
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationMode {
    /// Ticks only happen on an explicit step.
    Stopped,
    /// The periodic driver's timer ticks are honored.
    Running,
}

/// Raised while a session builds its cell graph. Clones share one flag; a host holding a clone
/// sees it raised from inside a heartbeat and must not mutate the geometry or start another
/// build until it drops.
#[derive(Clone, Debug, Default)]
pub struct ProcessingFlag(Rc<Cell<bool>>);

impl ProcessingFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_raised(&self) -> bool {
        self.0.get()
    }

    fn set(&self, raised: bool) {
        self.0.set(raised);
    }
}

/// One simulation session over a fixed snapshot of the circuit geometry.
///
/// The cell graph is built when the session is entered and discarded when it is left; any
/// change to the geometry needs a new session.
pub struct Simulation {
    engine: Engine,
    network: WireNetwork,
    component_cells: Vec<CellId>,
    bridge_cells: Vec<(usize, CellId)>,
    mode: SimulationMode,
    processing: ProcessingFlag,
}

impl Simulation {
    pub fn enter(circuit: &Circuit) -> Self {
        Self::enter_with_heartbeat(circuit, ProcessingFlag::new(), &mut || {})
    }

    /// Enters simulation, calling `heartbeat` at checkpoints of the graph build so an embedding
    /// host can stay responsive. `processing` is raised for the duration of every build this
    /// session runs.
    pub fn enter_with_heartbeat(
        circuit: &Circuit,
        processing: ProcessingFlag,
        heartbeat: &mut dyn FnMut(),
    ) -> Self {
        let mut sim = Simulation {
            engine: Engine::new(),
            network: WireNetwork::default(),
            component_cells: Vec::new(),
            bridge_cells: Vec::new(),
            mode: SimulationMode::Stopped,
            processing,
        };
        sim.build(circuit, heartbeat);
        sim
    }

    fn build(&mut self, circuit: &Circuit, heartbeat: &mut dyn FnMut()) {
        self.processing.set(true);

        let mut engine = Engine::new();
        let component_cells = circuit
            .components
            .iter()
            .map(|component| {
                engine.add_cell(
                    LogicCell::from_component(&component.kind)
                        .with_inversion(&component.input_inverted, &component.output_inverted),
                )
            })
            .collect::<Vec<_>>();

        let bridge_cells = circuit
            .markers
            .iter()
            .enumerate()
            .filter(|(_, marker)| marker.connection != ConnectionType::Full)
            .map(|(index, _)| (index, engine.add_cell(LogicCell::bridge())))
            .collect::<Vec<_>>();
        debug!(
            components = component_cells.len(),
            bridges = bridge_cells.len(),
            "created component cells"
        );

        let components = component_cells
            .iter()
            .copied()
            .zip(circuit.components.iter())
            .collect::<Vec<_>>();
        let bridges = bridge_cells
            .iter()
            .map(|(marker, cell)| (*cell, circuit.markers[*marker]))
            .collect::<Vec<_>>();

        let network = build_network(
            &circuit.segments,
            &circuit.markers,
            &components,
            &bridges,
            &mut engine,
            heartbeat,
        );
        engine.wake_all();

        info!(
            cells = engine.cell_count(),
            nets = network.nets().len(),
            "entered simulation"
        );

        self.engine = engine;
        self.network = network;
        self.component_cells = component_cells;
        self.bridge_cells = bridge_cells;
        self.mode = SimulationMode::Stopped;
        self.processing.set(false);
    }

    /// Shuts every cell down and ends the session.
    pub fn leave(mut self) {
        self.shutdown();
        info!(ticks = self.engine.tick(), "left simulation");
    }

    fn shutdown(&mut self) {
        self.mode = SimulationMode::Stopped;
        self.engine.shutdown_all();
    }

    /// Leaves and re-enters on `circuit`, restoring every cell to its reset state. Does nothing
    /// while the processing flag is raised.
    pub fn reset(&mut self, circuit: &Circuit) {
        self.reset_with_heartbeat(circuit, &mut || {})
    }

    pub fn reset_with_heartbeat(&mut self, circuit: &Circuit, heartbeat: &mut dyn FnMut()) {
        if self.processing.is_raised() {
            debug!("reset skipped while processing");
            return;
        }
        self.shutdown();
        self.build(circuit, heartbeat);
    }

    pub fn mode(&self) -> SimulationMode {
        self.mode
    }

    /// True while a build sharing this session's processing flag is running.
    pub fn is_processing(&self) -> bool {
        self.processing.is_raised()
    }

    pub fn processing_flag(&self) -> ProcessingFlag {
        self.processing.clone()
    }

    pub fn advance(&mut self) {
        self.engine.advance();
    }

    /// Runs a single tick regardless of mode.
    pub fn step(&mut self) {
        self.advance();
    }

    pub fn run(&mut self) {
        self.mode = SimulationMode::Running;
    }

    pub fn pause(&mut self) {
        self.mode = SimulationMode::Stopped;
    }

    /// Entry point for the periodic driver. Advances one tick while running and returns
    /// whether it did.
    pub fn on_timer(&mut self) -> bool {
        if self.mode == SimulationMode::Running {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn tick(&self) -> u64 {
        self.engine.tick()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn network(&self) -> &WireNetwork {
        &self.network
    }

    /// The cell simulating component `component` of the entered circuit.
    pub fn component_cell(&self, component: usize) -> CellId {
        self.component_cells[component]
    }

    /// The bridge cell created for junction marker `marker`, if it is a bridge.
    pub fn bridge_cell(&self, marker: usize) -> Option<CellId> {
        self.bridge_cells
            .iter()
            .find(|(index, _)| *index == marker)
            .map(|(_, cell)| *cell)
    }

    pub fn output_state(&self, component: usize, output: usize) -> LogicState {
        self.engine
            .output_state(self.component_cell(component), output)
    }

    /// Level of segment `segment` of the normalized geometry in [`WireNetwork::segments`].
    pub fn segment_state(&self, segment: usize) -> LogicState {
        self.engine
            .output_state(self.network.net_of_segment(segment).cell, 0)
    }

    /// Level of the wire passing through `point`, if any.
    pub fn wire_state_at(&self, point: Point) -> Option<LogicState> {
        self.network
            .net_at(point)
            .map(|net| self.engine.output_state(net.cell, 0))
    }

    /// Cells whose state changed since the last call, for repainting.
    pub fn take_changed(&mut self) -> Vec<CellId> {
        self.engine.take_changed()
    }

    pub fn toggle_input(&mut self, component: usize) {
        let cell = self.component_cell(component);
        self.engine.toggle_input(cell);
    }

    pub fn press_button(&mut self, component: usize) {
        let cell = self.component_cell(component);
        self.engine.press_button(cell);
    }

    pub fn set_clock_config(&mut self, component: usize, config: ClockConfig) {
        let cell = self.component_cell(component);
        self.engine.set_clock_config(cell, config);
    }

    pub fn lamp_state(&self, component: usize) -> LogicState {
        self.engine.lamp_state(self.component_cell(component))
    }
}
