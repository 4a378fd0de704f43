use super::{CellLogic, LogicState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateOp {
    And,
    Or,
    /// Odd parity over all inputs.
    Xor,
    Not,
    Buffer,
}

#[derive(Clone, Debug)]
pub struct Gate {
    op: GateOp,
}

impl Gate {
    pub fn new(op: GateOp) -> Self {
        Gate { op }
    }
}

impl CellLogic for Gate {
    fn logic_function(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) -> bool {
        let high = match self.op {
            GateOp::And => inputs.iter().all(|i| i.is_high()),
            GateOp::Or => inputs.iter().any(|i| i.is_high()),
            GateOp::Xor => inputs.iter().filter(|i| i.is_high()).count() % 2 == 1,
            GateOp::Not => !inputs[0].is_high(),
            GateOp::Buffer => inputs[0].is_high(),
        };
        outputs[0] = LogicState::from_bool(high);
        false
    }

    fn reset(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) {
        self.logic_function(inputs, outputs);
    }
}

#[derive(Clone, Debug)]
pub struct HalfAdder;

impl CellLogic for HalfAdder {
    fn logic_function(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) -> bool {
        let (a, b) = (inputs[0].is_high(), inputs[1].is_high());
        outputs[0] = LogicState::from_bool(a ^ b);
        outputs[1] = LogicState::from_bool(a && b);
        false
    }
}

#[derive(Clone, Debug)]
pub struct FullAdder;

impl CellLogic for FullAdder {
    fn logic_function(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) -> bool {
        let (a, b, carry) = (
            inputs[0].is_high(),
            inputs[1].is_high(),
            inputs[2].is_high(),
        );
        outputs[0] = LogicState::from_bool(a ^ b ^ carry);
        outputs[1] = LogicState::from_bool((a && b) || (carry && (a ^ b)));
        false
    }
}

/// Reads `inputs` as an unsigned binary number, least significant bit first.
fn binary_value(inputs: &[LogicState]) -> usize {
    inputs
        .iter()
        .enumerate()
        .filter(|(_, state)| state.is_high())
        .fold(0, |value, (bit, _)| value | (1 << bit))
}

fn write_binary(outputs: &mut [LogicState], value: usize) {
    for (bit, output) in outputs.iter_mut().enumerate() {
        *output = LogicState::from_bool(value & (1 << bit) > 0);
    }
}

/// Priority encoder: the last output is the valid bit, the others carry the index of the
/// highest asserted input.
#[derive(Clone, Debug, Default)]
pub struct Encoder {
    previous: Option<usize>,
}

impl CellLogic for Encoder {
    fn logic_function(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) -> bool {
        let winner = inputs.iter().rposition(|i| i.is_high());

        if winner != self.previous {
            if let Some((valid, code)) = outputs.split_last_mut() {
                *valid = LogicState::from_bool(winner.is_some());
                write_binary(code, winner.unwrap_or(0));
            }
            self.previous = winner;
        }

        false
    }

    fn reset(&mut self, _inputs: &[LogicState], outputs: &mut [LogicState]) {
        self.previous = None;
        for output in outputs.iter_mut() {
            *output = LogicState::Low;
        }
    }
}

/// One-hot decoder of a binary input value.
#[derive(Clone, Debug)]
pub struct Decoder;

impl CellLogic for Decoder {
    fn logic_function(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) -> bool {
        let value = binary_value(inputs);
        for (index, output) in outputs.iter_mut().enumerate() {
            *output = LogicState::from_bool(index == value);
        }
        false
    }

    fn reset(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) {
        self.logic_function(inputs, outputs);
    }
}

/// Inputs are the select lines followed by the data lines.
#[derive(Clone, Debug)]
pub struct Multiplexer {
    bit_width: usize,
}

impl Multiplexer {
    pub fn new(bit_width: u8) -> Self {
        Multiplexer {
            bit_width: usize::from(bit_width),
        }
    }
}

impl CellLogic for Multiplexer {
    fn logic_function(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) -> bool {
        let (select, data) = inputs.split_at(self.bit_width);
        outputs[0] = data[binary_value(select)];
        false
    }
}

/// Inputs are the select lines followed by the single data line.
#[derive(Clone, Debug)]
pub struct Demultiplexer {
    bit_width: usize,
}

impl Demultiplexer {
    pub fn new(bit_width: u8) -> Self {
        Demultiplexer {
            bit_width: usize::from(bit_width),
        }
    }
}

impl CellLogic for Demultiplexer {
    fn logic_function(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) -> bool {
        let (select, data) = inputs.split_at(self.bit_width);
        let selected = binary_value(select);
        for (index, output) in outputs.iter_mut().enumerate() {
            *output = if index == selected {
                data[0]
            } else {
                LogicState::Low
            };
        }
        false
    }
}
