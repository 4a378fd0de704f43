use crate::*;

const L: LogicState = LogicState::Low;
const H: LogicState = LogicState::High;

fn settle(sim: &mut Simulation, ticks: usize) {
    for _ in 0..ticks {
        sim.step();
    }
}

#[test]
fn one_tick_of_latency_per_hop() {
    let mut engine = Engine::new();
    let gates = (0..3)
        .map(|_| engine.add_cell(LogicCell::from_component(&ComponentKind::AndGate { inputs: 1 })))
        .collect::<Vec<_>>();
    engine.connect_output(gates[0], 0, gates[1], 0);
    engine.connect_output(gates[1], 0, gates[2], 0);
    engine.wake_all();
    for _ in 0..4 {
        engine.advance();
    }
    assert!(gates.iter().all(|g| engine.output_state(*g, 0) == L));

    engine.input_ready(gates[0], 0, H);
    let mut seen = Vec::new();
    for _ in 0..3 {
        engine.advance();
        seen.push(
            gates
                .iter()
                .map(|g| engine.output_state(*g, 0))
                .collect::<Vec<_>>(),
        );
    }

    assert_eq!(
        vec![vec![H, L, L], vec![H, H, L], vec![H, H, H]],
        seen
    );
}

#[test]
fn rs_latch_holds_state() {
    let mut engine = Engine::new();
    let latch = engine.add_cell(LogicCell::from_component(&ComponentKind::RsFlipFlop(
        FlipFlopStyle::Latch,
    )));
    engine.wake_all();
    engine.advance();
    assert_eq!(L, engine.output_state(latch, 0));

    engine.input_ready(latch, 0, H);
    engine.input_ready(latch, 1, L);
    engine.advance();
    assert_eq!(H, engine.output_state(latch, 0));
    assert_eq!(L, engine.output_state(latch, 1));

    engine.input_ready(latch, 0, L);
    engine.input_ready(latch, 1, L);
    engine.advance();
    assert_eq!(H, engine.output_state(latch, 0));

    engine.advance();
    assert_eq!(H, engine.output_state(latch, 0));
}

#[test]
fn rs_latch_reset_wins_tie() {
    let mut engine = Engine::new();
    let latch = engine.add_cell(LogicCell::from_component(&ComponentKind::RsFlipFlop(
        FlipFlopStyle::Latch,
    )));
    engine.wake_all();

    engine.input_ready(latch, 0, H);
    engine.advance();
    assert_eq!(H, engine.output_state(latch, 0));

    engine.input_ready(latch, 1, H);
    engine.advance();
    assert_eq!(L, engine.output_state(latch, 0));
    assert_eq!(H, engine.output_state(latch, 1));
}

#[test]
fn first_tick_publishes_reset_outputs() {
    let mut engine = Engine::new();
    let not = engine.add_cell(LogicCell::from_component(&ComponentKind::NotGate));
    let lamp = engine.add_cell(LogicCell::from_component(&ComponentKind::Output));
    engine.connect_output(not, 0, lamp, 0);
    engine.wake_all();
    assert_eq!(L, engine.lamp_state(lamp));

    engine.advance();
    assert!(engine.has_pending_inputs());
    engine.advance();
    assert_eq!(H, engine.lamp_state(lamp));
}

#[test]
fn idle_ticks_raise_nothing() {
    let mut engine = Engine::new();
    let gate = engine.add_cell(LogicCell::from_component(&ComponentKind::OrGate { inputs: 2 }));
    engine.wake_all();
    engine.advance();
    assert_eq!(vec![gate], engine.take_changed());

    engine.advance();
    assert!(engine.take_changed().is_empty());
    assert!(!engine.has_pending_inputs());
}

#[test]
fn input_ready_flags_change_immediately() {
    let mut engine = Engine::new();
    let gate = engine.add_cell(LogicCell::from_component(&ComponentKind::BufferGate));
    engine.wake_all();
    engine.advance();
    engine.take_changed();

    engine.input_ready(gate, 0, L);
    assert!(!engine.has_changes());

    engine.input_ready(gate, 0, H);
    assert!(engine.is_changed(gate));
    assert_eq!(vec![gate], engine.take_changed());
    assert_eq!(L, engine.input_state(gate, 0));
}

#[test]
#[should_panic]
fn connecting_out_of_range_input_panics() {
    let mut engine = Engine::new();
    let a = engine.add_cell(LogicCell::from_component(&ComponentKind::NotGate));
    let b = engine.add_cell(LogicCell::from_component(&ComponentKind::NotGate));
    engine.connect_output(a, 0, b, 1);
}

#[test]
#[should_panic(expected = "input 7 out of range")]
fn reporting_out_of_range_input_to_inactive_cell_panics() {
    let mut engine = Engine::new();
    let not = engine.add_cell(LogicCell::from_component(&ComponentKind::NotGate));
    engine.input_ready(not, 7, H);
}

#[test]
#[should_panic(expected = "bit width 9")]
fn placing_too_wide_multiplexer_panics() {
    Component::new(ComponentKind::Multiplexer { bit_width: 9 }, Point::new(0, 0));
}

/// A switch driving a NOT gate driving a lamp, all joined by wires.
fn inverter_circuit() -> Circuit {
    let mut circuit = Circuit::new();
    circuit.add_component(Component::new(
        ComponentKind::Input { state: L },
        Point::new(0, 0),
    ));
    circuit.add_component(Component::new(ComponentKind::NotGate, Point::new(5, 0)));
    circuit.add_component(Component::new(ComponentKind::Output, Point::new(10, 0)));
    circuit.add_segment(WireSegment::horizontal(0, 0, 5));
    circuit.add_segment(WireSegment::horizontal(7, 0, 3));
    circuit
}

#[test]
fn signal_travels_through_wires() {
    let circuit = inverter_circuit();
    let mut sim = Simulation::enter(&circuit);
    assert_eq!(2, sim.network().nets().len());

    settle(&mut sim, 6);
    assert_eq!(H, sim.lamp_state(2));
    assert_eq!(Some(L), sim.wire_state_at(Point::new(2, 0)));
    assert_eq!(Some(H), sim.wire_state_at(Point::new(8, 0)));
    assert_eq!(None, sim.wire_state_at(Point::new(6, 0)));

    sim.toggle_input(0);
    settle(&mut sim, 6);
    assert_eq!(L, sim.lamp_state(2));
    assert_eq!(H, sim.segment_state(0));
    assert_eq!(H, sim.output_state(0, 0));

    sim.leave();
}

#[test]
fn changed_cells_are_reported() {
    let circuit = inverter_circuit();
    let mut sim = Simulation::enter(&circuit);
    settle(&mut sim, 6);
    sim.take_changed();

    sim.toggle_input(0);
    let switch = sim.component_cell(0);
    assert_eq!(vec![switch], sim.take_changed());

    sim.step();
    assert!(sim.take_changed().contains(&switch));
}

#[test]
fn wired_or_of_two_drivers() {
    let mut circuit = Circuit::new();
    circuit.add_component(Component::new(
        ComponentKind::Input { state: L },
        Point::new(0, 0),
    ));
    circuit.add_component(Component::new(
        ComponentKind::Input { state: L },
        Point::new(4, 0),
    ));
    circuit.add_component(Component::new(ComponentKind::Output, Point::new(8, 0)));
    circuit.add_segment(WireSegment::horizontal(0, 0, 8));

    let mut sim = Simulation::enter(&circuit);
    settle(&mut sim, 4);
    assert_eq!(L, sim.lamp_state(2));

    sim.toggle_input(1);
    settle(&mut sim, 4);
    assert_eq!(H, sim.lamp_state(2));

    sim.toggle_input(0);
    settle(&mut sim, 4);
    assert_eq!(H, sim.lamp_state(2));

    sim.toggle_input(1);
    sim.toggle_input(0);
    settle(&mut sim, 4);
    assert_eq!(L, sim.lamp_state(2));
}

/// A HIGH switch on a vertical wire crossing a horizontal wire with a lamp at its end.
fn crossing_circuit(marker: Option<JunctionMarker>) -> Circuit {
    let mut circuit = Circuit::new();
    circuit.add_component(Component::new(
        ComponentKind::Input { state: H },
        Point::new(5, -5),
    ));
    circuit.add_component(Component::new(ComponentKind::Output, Point::new(10, 0)));
    circuit.add_segment(WireSegment::horizontal(0, 0, 10));
    circuit.add_segment(WireSegment::vertical(5, -5, 10));
    assert!(circuit.markers.is_empty());
    if let Some(marker) = marker {
        circuit.add_marker(marker);
    }
    circuit
}

fn lamp_after_settling(circuit: &Circuit) -> LogicState {
    let mut sim = Simulation::enter(circuit);
    settle(&mut sim, 8);
    sim.lamp_state(1)
}

#[test]
fn crossing_wires_are_insulated() {
    assert_eq!(L, lamp_after_settling(&crossing_circuit(None)));
}

#[test]
fn full_marker_joins_crossing() {
    let marker = JunctionMarker::full(Point::new(5, 0));
    assert_eq!(H, lamp_after_settling(&crossing_circuit(Some(marker))));
}

#[test]
fn bridges_conduct_one_way() {
    let bridge_x = crossing_circuit(Some(JunctionMarker::bridge_x(Point::new(5, 0))));
    assert_eq!(H, lamp_after_settling(&bridge_x));
    assert!(Simulation::enter(&bridge_x).bridge_cell(0).is_some());

    let bridge_y = crossing_circuit(Some(JunctionMarker::bridge_y(Point::new(5, 0))));
    assert_eq!(L, lamp_after_settling(&bridge_y));
}

#[test]
fn clock_drives_counter() {
    let mut circuit = Circuit::new();
    circuit.add_component(Component::new(
        ComponentKind::Clock(ClockConfig {
            mode: ClockMode::Toggle,
            toggle_ticks: 1,
            pulse_ticks: 1,
        }),
        Point::new(0, 0),
    ));
    circuit.add_component(Component::new(
        ComponentKind::Counter { bit_width: 3 },
        Point::new(3, 0),
    ));
    circuit.add_segment(WireSegment::horizontal(0, 0, 3));

    let mut sim = Simulation::enter(&circuit);
    settle(&mut sim, 10);

    let counter = sim.component_cell(1);
    match sim.engine().cell(counter).kind() {
        CellKind::Counter(c) => assert_eq!(4, c.value()),
        other => panic!("unexpected kind {:?}", other),
    }
    assert_eq!(vec![L, L, H], (0..3).map(|o| sim.output_state(1, o)).collect::<Vec<_>>());
}

#[test]
fn button_press_reaches_lamp() {
    let mut circuit = Circuit::new();
    circuit.add_component(Component::new(ComponentKind::Button, Point::new(0, 0)));
    circuit.add_component(Component::new(ComponentKind::Output, Point::new(4, 0)));
    circuit.add_segment(WireSegment::horizontal(0, 0, 4));

    let mut sim = Simulation::enter(&circuit);
    settle(&mut sim, 3);
    sim.press_button(0);
    settle(&mut sim, 3);
    assert_eq!(H, sim.lamp_state(1));

    settle(&mut sim, BUTTON_HOLD_TICKS as usize);
    assert_eq!(L, sim.lamp_state(1));
}

#[test]
fn inverted_pins_in_a_circuit() {
    let mut circuit = Circuit::new();
    circuit.add_component(Component::new(
        ComponentKind::Constant { state: L },
        Point::new(0, 0),
    ));
    circuit.add_component(
        Component::new(ComponentKind::BufferGate, Point::new(3, 0)).with_inverted_input(0),
    );
    circuit.add_component(Component::new(ComponentKind::Output, Point::new(8, 0)));
    circuit.add_segment(WireSegment::horizontal(0, 0, 3));
    circuit.add_segment(WireSegment::horizontal(5, 0, 3));

    let mut sim = Simulation::enter(&circuit);
    settle(&mut sim, 6);
    assert_eq!(H, sim.lamp_state(2));
}

#[test]
fn session_control() {
    let mut beats = 0;
    let circuit = inverter_circuit();
    let mut sim =
        Simulation::enter_with_heartbeat(&circuit, ProcessingFlag::new(), &mut || beats += 1);
    assert!(beats > 0);
    assert!(!sim.is_processing());
    assert_eq!(SimulationMode::Stopped, sim.mode());
    assert_eq!(0, sim.tick());

    assert!(!sim.on_timer());
    assert_eq!(0, sim.tick());

    sim.run();
    assert!(sim.on_timer());
    assert!(sim.on_timer());
    assert_eq!(2, sim.tick());

    sim.pause();
    assert!(!sim.on_timer());
    sim.step();
    assert_eq!(3, sim.tick());
}

#[test]
fn processing_flag_is_raised_during_build() {
    let circuit = inverter_circuit();
    let flag = ProcessingFlag::new();
    let observer = flag.clone();
    let mut raised = Vec::new();
    let mut sim =
        Simulation::enter_with_heartbeat(&circuit, flag, &mut || raised.push(observer.is_raised()));
    assert!(!raised.is_empty());
    assert!(raised.iter().all(|r| *r));
    assert!(!sim.is_processing());
    assert!(!observer.is_raised());

    raised.clear();
    let observer = sim.processing_flag();
    sim.reset_with_heartbeat(&circuit, &mut || raised.push(observer.is_raised()));
    assert!(!raised.is_empty());
    assert!(raised.iter().all(|r| *r));
    assert!(!sim.is_processing());
}

#[test]
fn reset_is_skipped_while_a_shared_build_runs() {
    let circuit = inverter_circuit();
    let flag = ProcessingFlag::new();
    let mut first = Simulation::enter_with_heartbeat(&circuit, flag.clone(), &mut || {});
    settle(&mut first, 3);

    let _second = Simulation::enter_with_heartbeat(&circuit, flag, &mut || first.reset(&circuit));
    assert_eq!(3, first.tick());

    first.reset(&circuit);
    assert_eq!(0, first.tick());
}

#[test]
fn reset_restores_initial_state() {
    let circuit = inverter_circuit();
    let mut sim = Simulation::enter(&circuit);
    settle(&mut sim, 6);
    sim.toggle_input(0);
    settle(&mut sim, 6);
    assert_eq!(L, sim.lamp_state(2));

    sim.run();
    sim.reset(&circuit);
    assert_eq!(SimulationMode::Stopped, sim.mode());
    assert_eq!(0, sim.tick());
    settle(&mut sim, 6);
    assert_eq!(H, sim.lamp_state(2));
}

#[test]
fn loaded_document_simulates() {
    let json = r#"{
        "version": { "major": 0, "minor": 1, "patch": 0 },
        "compatible_version": { "major": 0, "minor": 1, "patch": 0 },
        "components": [
            { "type": 8, "x": 0, "y": 0, "state": "High" },
            { "type": 5, "x": 0, "y": 0, "orientation": "Horizontal", "length": 4 },
            { "type": 3, "x": 4, "y": 0 },
            { "type": 77, "x": 1, "y": 1 },
            { "type": 5, "x": 6, "y": 0, "orientation": "Horizontal", "length": 2 },
            { "type": 12, "x": 8, "y": 0 }
        ]
    }"#;

    let circuit = CircuitDocument::from_reader(json.as_bytes())
        .unwrap()
        .into_circuit()
        .unwrap();
    assert_eq!(3, circuit.components.len());

    let mut sim = Simulation::enter(&circuit);
    settle(&mut sim, 6);
    assert_eq!(L, sim.lamp_state(2));
}
