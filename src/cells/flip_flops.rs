//! Latches and flip-flops.
//!
//! Edge-triggered types see only one clock level per tick; rising and falling edges are
//! reconstructed by a [`ClockSampler`] comparing this tick's sample with the previous one.
//! All of them drive the pair `(Q, !Q)` and reset to `Q = LOW`.

use super::{reset_q_pair, set_q_pair, CellLogic, ClockEdge, ClockSampler, LogicState};

const CLOCK: usize = 1;

/// Applies set then reset, so reset wins when both are asserted.
fn set_reset(q: LogicState, set: LogicState, reset: LogicState) -> LogicState {
    let mut next = q;
    if set.is_high() {
        next = LogicState::High;
    }
    if reset.is_high() {
        next = LogicState::Low;
    }
    next
}

fn jk(q: LogicState, j: LogicState, k: LogicState) -> LogicState {
    match (j.is_high(), k.is_high()) {
        (true, true) => !q,
        (true, false) => LogicState::High,
        (false, true) => LogicState::Low,
        (false, false) => q,
    }
}

/// Unclocked level-triggered RS latch. Inputs: S, R.
#[derive(Clone, Debug)]
pub struct RsLatch;

impl CellLogic for RsLatch {
    fn logic_function(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) -> bool {
        let q = set_reset(outputs[0], inputs[0], inputs[1]);
        set_q_pair(outputs, q);
        false
    }

    fn reset(&mut self, _inputs: &[LogicState], outputs: &mut [LogicState]) {
        reset_q_pair(outputs);
    }
}

/// RS flip-flop sampling S and R on the rising clock edge. Inputs: S, Clk, R.
#[derive(Clone, Debug, Default)]
pub struct RsClockedFlipFlop {
    clock: ClockSampler,
}

impl CellLogic for RsClockedFlipFlop {
    fn logic_function(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) -> bool {
        if self.clock.sample(inputs[CLOCK]) == ClockEdge::Rising {
            let q = set_reset(outputs[0], inputs[0], inputs[2]);
            set_q_pair(outputs, q);
        }
        false
    }

    fn reset(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) {
        self.clock.reset(inputs[CLOCK]);
        reset_q_pair(outputs);
    }
}

/// Master captures S/R on the rising edge, slave publishes on the falling edge.
/// Inputs: S, Clk, R.
#[derive(Clone, Debug, Default)]
pub struct RsMasterSlaveFlipFlop {
    clock: ClockSampler,
    master: LogicState,
}

impl CellLogic for RsMasterSlaveFlipFlop {
    fn logic_function(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) -> bool {
        match self.clock.sample(inputs[CLOCK]) {
            ClockEdge::Rising => {
                let master = set_reset(self.master, inputs[0], inputs[2]);
                let changed = master != self.master;
                self.master = master;
                changed
            }
            ClockEdge::Falling => {
                set_q_pair(outputs, self.master);
                false
            }
            ClockEdge::None => false,
        }
    }

    fn reset(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) {
        self.clock.reset(inputs[CLOCK]);
        self.master = LogicState::Low;
        reset_q_pair(outputs);
    }
}

/// Rising-edge D flip-flop. Inputs: D, Clk.
#[derive(Clone, Debug, Default)]
pub struct DFlipFlop {
    clock: ClockSampler,
}

impl CellLogic for DFlipFlop {
    fn logic_function(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) -> bool {
        if self.clock.sample(inputs[CLOCK]) == ClockEdge::Rising {
            set_q_pair(outputs, inputs[0]);
        }
        false
    }

    fn reset(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) {
        self.clock.reset(inputs[CLOCK]);
        reset_q_pair(outputs);
    }
}

/// D is captured on the rising edge and published on the falling edge. Inputs: D, Clk.
#[derive(Clone, Debug, Default)]
pub struct DMasterSlaveFlipFlop {
    clock: ClockSampler,
    master: LogicState,
}

impl CellLogic for DMasterSlaveFlipFlop {
    fn logic_function(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) -> bool {
        match self.clock.sample(inputs[CLOCK]) {
            ClockEdge::Rising => {
                self.master = inputs[0];
                true
            }
            ClockEdge::Falling => {
                set_q_pair(outputs, self.master);
                true
            }
            ClockEdge::None => false,
        }
    }

    fn reset(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) {
        self.clock.reset(inputs[CLOCK]);
        self.master = LogicState::Low;
        reset_q_pair(outputs);
    }
}

/// Toggles on the rising edge while T is asserted. Inputs: T, Clk.
#[derive(Clone, Debug, Default)]
pub struct TFlipFlop {
    clock: ClockSampler,
}

impl CellLogic for TFlipFlop {
    fn logic_function(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) -> bool {
        if self.clock.sample(inputs[CLOCK]) == ClockEdge::Rising && inputs[0].is_high() {
            let q = !outputs[0];
            set_q_pair(outputs, q);
        }
        false
    }

    fn reset(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) {
        self.clock.reset(inputs[CLOCK]);
        reset_q_pair(outputs);
    }
}

/// Rising-edge JK flip-flop. Inputs: J, Clk, K.
#[derive(Clone, Debug, Default)]
pub struct JkFlipFlop {
    clock: ClockSampler,
}

impl CellLogic for JkFlipFlop {
    fn logic_function(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) -> bool {
        if self.clock.sample(inputs[CLOCK]) == ClockEdge::Rising {
            let q = jk(outputs[0], inputs[0], inputs[2]);
            set_q_pair(outputs, q);
        }
        false
    }

    fn reset(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) {
        self.clock.reset(inputs[CLOCK]);
        reset_q_pair(outputs);
    }
}

/// JK evaluated against the published Q on the rising edge, published on the falling edge.
/// Inputs: J, Clk, K.
#[derive(Clone, Debug, Default)]
pub struct JkMasterSlaveFlipFlop {
    clock: ClockSampler,
    master: LogicState,
}

impl CellLogic for JkMasterSlaveFlipFlop {
    fn logic_function(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) -> bool {
        match self.clock.sample(inputs[CLOCK]) {
            ClockEdge::Rising => {
                self.master = jk(outputs[0], inputs[0], inputs[2]);
                true
            }
            ClockEdge::Falling => {
                set_q_pair(outputs, self.master);
                true
            }
            ClockEdge::None => false,
        }
    }

    fn reset(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) {
        self.clock.reset(inputs[CLOCK]);
        self.master = LogicState::Low;
        reset_q_pair(outputs);
    }
}
