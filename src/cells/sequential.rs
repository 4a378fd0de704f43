use super::{CellLogic, ClockEdge, ClockSampler, LogicState};

/// Serial-in parallel-out shift register. Inputs: D, Clk.
#[derive(Clone, Debug, Default)]
pub struct ShiftRegister {
    clock: ClockSampler,
}

impl CellLogic for ShiftRegister {
    fn logic_function(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) -> bool {
        if self.clock.sample(inputs[1]) == ClockEdge::Rising && !outputs.is_empty() {
            outputs.rotate_right(1);
            outputs[0] = inputs[0];
        }
        false
    }

    fn reset(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) {
        self.clock.reset(inputs[1]);
        for output in outputs.iter_mut() {
            *output = LogicState::Low;
        }
    }
}

/// Binary up counter wrapping at `2^width`. Inputs: Clk, Clear. Clear is level-sensitive and
/// overrides the count.
#[derive(Clone, Debug, Default)]
pub struct Counter {
    clock: ClockSampler,
    value: u32,
}

impl Counter {
    pub fn value(&self) -> u32 {
        self.value
    }
}

impl CellLogic for Counter {
    fn logic_function(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) -> bool {
        let modulus = 1u32 << outputs.len();

        if self.clock.sample(inputs[0]) == ClockEdge::Rising {
            self.value = (self.value + 1) % modulus;
        }
        if inputs[1].is_high() {
            self.value = 0;
        }

        for (bit, output) in outputs.iter_mut().enumerate() {
            *output = LogicState::from_bool(self.value & (1 << bit) > 0);
        }
        false
    }

    fn reset(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) {
        self.clock.reset(inputs[0]);
        self.value = 0;
        for output in outputs.iter_mut() {
            *output = LogicState::Low;
        }
    }
}
