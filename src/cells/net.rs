use super::{CellLogic, LogicState};

/// One electrical node. Every output pin found on the net's wires owns one input slot; the
/// net is HIGH while any of them drives HIGH (wired-OR).
#[derive(Clone, Debug)]
pub struct WireNet;

impl CellLogic for WireNet {
    fn logic_function(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) -> bool {
        outputs[0] = LogicState::from_bool(inputs.iter().any(|i| i.is_high()));
        false
    }
}
