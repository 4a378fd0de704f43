//! Tick scheduler.
//!
//! The engine owns every cell of a session in an arena and advances each active cell exactly
//! once per tick. Input reports never reach a cell during the tick they were produced in: they
//! are queued in a [`LatchSwapList`] and committed when the next tick starts. Running the cells
//! one after another is therefore indistinguishable from updating all of them at once.

use crate::{
    cells::{CellId, CellKind, LogicCell, LogicState},
    changed_cells::ChangedCellSet,
    components::ClockConfig,
    latch_swap_list::{LatchSwapList, PendingInput},
};
use tracing::trace;

pub struct Engine {
    cells: Vec<LogicCell>,
    latches: LatchSwapList,
    changed: ChangedCellSet,
    tick: u64,
}

impl Engine {
    pub fn new() -> Self {
        Engine {
            cells: Vec::new(),
            latches: LatchSwapList::new(),
            changed: ChangedCellSet::new(0),
            tick: 0,
        }
    }

    pub fn add_cell(&mut self, cell: LogicCell) -> CellId {
        self.cells.push(cell);
        self.changed.resize(self.cells.len());
        CellId::new(self.cells.len() - 1)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn cell(&self, id: CellId) -> &LogicCell {
        &self.cells[id.index()]
    }

    /// Number of ticks run since the engine was created.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Connects `output` of `source` to `input` of `target`.
    ///
    /// Panics if either pin index is out of range.
    pub fn connect_output(&mut self, source: CellId, output: usize, target: CellId, input: usize) {
        let input_count = self.cells[target.index()].input_count();
        assert!(
            input < input_count,
            "input {} of {} out of range, cell has {} inputs",
            input,
            target,
            input_count
        );
        self.cells[source.index()].connect_output(target, input, output);
    }

    /// Adds a driving slot to `net` and returns its input index.
    pub fn add_input_slot(&mut self, net: CellId) -> usize {
        self.cells[net.index()].add_input_slot()
    }

    /// Adds `input` of `target` to the fan-out of `net`.
    pub fn append_output(&mut self, net: CellId, target: CellId, input: usize) {
        self.connect_output(net, 0, target, input);
    }

    /// Reports a new level on one input of `target`. The level becomes visible to the target's
    /// LogicFunction on the next tick; a "changed" event is raised right away if it differs
    /// from the level visible now.
    ///
    /// Panics if `input` is out of range, whether or not the target is active.
    pub fn input_ready(&mut self, target: CellId, input: usize, state: LogicState) {
        let cell = &self.cells[target.index()];
        let incoming = cell.incoming_state(input, state);
        if cell.is_active() && cell.input_state(input) != incoming {
            self.changed.set(target);
        }
        self.latches.push_next_list(PendingInput {
            cell: target,
            input,
            state,
        });
    }

    pub fn output_state(&self, id: CellId, output: usize) -> LogicState {
        self.cells[id.index()].output_state(output)
    }

    pub fn input_state(&self, id: CellId, input: usize) -> LogicState {
        self.cells[id.index()].input_state(input)
    }

    pub fn wake_cell(&mut self, id: CellId) {
        self.cells[id.index()].on_wake_up();
        self.changed.set(id);
    }

    pub fn shutdown_cell(&mut self, id: CellId) {
        self.cells[id.index()].on_shutdown();
        self.changed.set(id);
    }

    pub fn wake_all(&mut self) {
        for index in 0..self.cells.len() {
            self.wake_cell(CellId::new(index));
        }
    }

    pub fn shutdown_all(&mut self) {
        self.latches.clear();
        for index in 0..self.cells.len() {
            self.shutdown_cell(CellId::new(index));
        }
    }

    /// Runs one tick.
    pub fn advance(&mut self) {
        self.tick += 1;
        self.latches.swap();

        let Engine {
            cells,
            latches,
            changed,
            ..
        } = self;

        for pending in latches.cur_list() {
            let cell = &mut cells[pending.cell.index()];
            if cell.is_active() {
                cell.latch_input(pending.input, pending.state);
            }
        }

        let mut changed_count = 0;
        for (index, cell) in cells.iter_mut().enumerate() {
            let advance = cell.on_simulation_advance(|edge, state| {
                latches.push_next_list(PendingInput {
                    cell: edge.target,
                    input: edge.input,
                    state,
                })
            });
            if advance.changed {
                changed.set(CellId::new(index));
                changed_count += 1;
            }
        }

        for pending in latches.next_list() {
            let cell = &cells[pending.cell.index()];
            if cell.is_active()
                && cell.input_state(pending.input)
                    != cell.incoming_state(pending.input, pending.state)
            {
                changed.set(pending.cell);
            }
        }

        trace!(
            tick = self.tick,
            changed = changed_count,
            pending = self.latches.next_list().len(),
            "advanced"
        );
    }

    /// True while reports are waiting for the next tick.
    pub fn has_pending_inputs(&self) -> bool {
        !self.latches.is_next_list_empty()
    }

    pub fn is_changed(&self, id: CellId) -> bool {
        self.changed.contains(id)
    }

    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Collects the cells that raised "changed" since the last call, in arena order.
    pub fn take_changed(&mut self) -> Vec<CellId> {
        self.changed.drain()
    }

    pub fn toggle_input(&mut self, id: CellId) {
        match self.cells[id.index()].kind_mut() {
            CellKind::Switch(switch) => switch.request_toggle(),
            other => panic!("{} is not an input switch: {:?}", id, other),
        }
        self.changed.set(id);
    }

    pub fn press_button(&mut self, id: CellId) {
        match self.cells[id.index()].kind_mut() {
            CellKind::Button(button) => button.press(),
            other => panic!("{} is not a button: {:?}", id, other),
        }
        self.changed.set(id);
    }

    /// The new configuration takes effect on the clock's next evaluated tick.
    pub fn set_clock_config(&mut self, id: CellId, config: ClockConfig) {
        match self.cells[id.index()].kind_mut() {
            CellKind::Clock(clock) => clock.set_config(config),
            other => panic!("{} is not a clock: {:?}", id, other),
        }
    }

    pub fn lamp_state(&self, id: CellId) -> LogicState {
        match self.cells[id.index()].kind() {
            CellKind::Lamp(lamp) => lamp.state(),
            other => panic!("{} is not an output lamp: {:?}", id, other),
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
