use super::{CellLogic, LogicState};
use crate::{
    components::{ClockConfig, ClockMode},
    consts::BUTTON_HOLD_TICKS,
};

/// A user-toggled input switch.
#[derive(Clone, Debug)]
pub struct Switch {
    initial: LogicState,
    state: LogicState,
    toggle_requested: bool,
}

impl Switch {
    pub fn new(initial: LogicState) -> Self {
        Switch {
            initial,
            state: initial,
            toggle_requested: false,
        }
    }

    /// The toggle takes effect on the next tick.
    pub fn request_toggle(&mut self) {
        self.toggle_requested = !self.toggle_requested;
    }
}

impl CellLogic for Switch {
    fn logic_function(&mut self, _inputs: &[LogicState], outputs: &mut [LogicState]) -> bool {
        if std::mem::replace(&mut self.toggle_requested, false) {
            self.state = !self.state;
        }
        outputs[0] = self.state;
        false
    }

    fn reset(&mut self, _inputs: &[LogicState], outputs: &mut [LogicState]) {
        self.state = self.initial;
        self.toggle_requested = false;
        outputs[0] = self.state;
    }
}

#[derive(Clone, Debug)]
pub struct Constant {
    state: LogicState,
}

impl Constant {
    pub fn new(state: LogicState) -> Self {
        Constant { state }
    }
}

impl CellLogic for Constant {
    fn logic_function(&mut self, _inputs: &[LogicState], outputs: &mut [LogicState]) -> bool {
        outputs[0] = self.state;
        false
    }

    fn reset(&mut self, _inputs: &[LogicState], outputs: &mut [LogicState]) {
        outputs[0] = self.state;
    }
}

/// Push button: a press drives the output HIGH for `BUTTON_HOLD_TICKS` ticks.
#[derive(Clone, Debug, Default)]
pub struct Button {
    remaining: u32,
    press_requested: bool,
}

impl Button {
    pub fn press(&mut self) {
        self.press_requested = true;
    }
}

impl CellLogic for Button {
    fn logic_function(&mut self, _inputs: &[LogicState], outputs: &mut [LogicState]) -> bool {
        if std::mem::replace(&mut self.press_requested, false) {
            self.remaining = BUTTON_HOLD_TICKS;
        }
        outputs[0] = LogicState::from_bool(self.remaining > 0);
        self.remaining = self.remaining.saturating_sub(1);
        false
    }

    fn reset(&mut self, _inputs: &[LogicState], outputs: &mut [LogicState]) {
        self.remaining = 0;
        self.press_requested = false;
        outputs[0] = LogicState::Low;
    }
}

/// Free-running clock source.
///
/// In toggle mode the output flips every `toggle_ticks` ticks. In pulse mode every period of
/// `toggle_ticks` ticks starts with `pulse_ticks` HIGH ticks.
#[derive(Clone, Debug)]
pub struct Clock {
    config: ClockConfig,
    pending: Option<ClockConfig>,
    counter: u32,
    state: LogicState,
}

impl Clock {
    pub fn new(config: ClockConfig) -> Self {
        Clock {
            config,
            pending: None,
            counter: 0,
            state: LogicState::Low,
        }
    }

    /// The configuration in effect after the next tick.
    pub fn config(&self) -> ClockConfig {
        self.pending.unwrap_or(self.config)
    }

    pub fn set_config(&mut self, config: ClockConfig) {
        self.pending = Some(config);
    }
}

impl CellLogic for Clock {
    fn logic_function(&mut self, _inputs: &[LogicState], outputs: &mut [LogicState]) -> bool {
        if let Some(config) = self.pending.take() {
            self.config = config;
        }

        self.counter += 1;
        if self.counter >= self.config.toggle_ticks.max(1) {
            self.counter = 0;
            self.state = match self.config.mode {
                ClockMode::Toggle => !self.state,
                ClockMode::Pulse => LogicState::High,
            };
        } else if self.config.mode == ClockMode::Pulse
            && self.state.is_high()
            && self.counter >= self.config.pulse_ticks
        {
            self.state = LogicState::Low;
        }

        outputs[0] = self.state;
        false
    }

    fn reset(&mut self, _inputs: &[LogicState], outputs: &mut [LogicState]) {
        if let Some(config) = self.pending.take() {
            self.config = config;
        }
        self.counter = 0;
        self.state = LogicState::Low;
        outputs[0] = LogicState::Low;
    }
}

/// Output lamp showing its latched input.
#[derive(Clone, Debug, Default)]
pub struct Lamp {
    state: LogicState,
}

impl Lamp {
    pub fn state(&self) -> LogicState {
        self.state
    }
}

impl CellLogic for Lamp {
    fn logic_function(&mut self, inputs: &[LogicState], _outputs: &mut [LogicState]) -> bool {
        let previous = std::mem::replace(&mut self.state, inputs[0]);
        previous != self.state
    }

    fn reset(&mut self, _inputs: &[LogicState], _outputs: &mut [LogicState]) {
        self.state = LogicState::Low;
    }
}

/// One-way jumper placed by a BRIDGE junction marker.
#[derive(Clone, Debug)]
pub struct Bridge;

impl CellLogic for Bridge {
    fn logic_function(&mut self, inputs: &[LogicState], outputs: &mut [LogicState]) -> bool {
        outputs[0] = inputs[0];
        false
    }
}
