#[macro_use]
extern crate criterion;

use criterion::Criterion;
use gatesim::{Circuit, ClockConfig, Component, ComponentKind, Point, Simulation, WireSegment};

/// Rows of clocked counters, each counter output feeding an XOR chain through wires.
fn generated_circuit(rows: i32) -> Circuit {
    let mut circuit = Circuit::new();
    for row in 0..rows {
        let y = row * 10;
        circuit.add_component(Component::new(
            ComponentKind::Clock(ClockConfig {
                toggle_ticks: 1 + row as u32 % 3,
                ..ClockConfig::default()
            }),
            Point::new(0, y),
        ));
        circuit.add_segment(WireSegment::horizontal(0, y, 4));
        circuit.add_component(Component::new(
            ComponentKind::Counter { bit_width: 4 },
            Point::new(4, y),
        ));

        for bit in 0..4 {
            circuit.add_segment(WireSegment::horizontal(6, y + bit, 4));
            circuit.add_component(Component::new(
                ComponentKind::XorGate { inputs: 2 },
                Point::new(10, y + bit),
            ));
            circuit.add_segment(WireSegment::horizontal(12, y + bit, 4));
            circuit.add_component(Component::new(ComponentKind::Output, Point::new(16, y + bit)));
        }
    }
    circuit
}

fn criterion_benchmark(c: &mut Criterion) {
    let circuit = generated_circuit(50);
    let mut sim = Simulation::enter(&circuit);
    c.bench_function("100 Ticks", move |b| {
        b.iter(|| {
            for _ in 0..100 {
                sim.advance()
            }
        })
    });

    c.bench_function("Enter Simulation", |b| b.iter(|| Simulation::enter(&circuit)));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
