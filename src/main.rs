use gatesim::{
    Circuit, CircuitDocument, ClockConfig, Component, ComponentKind, DocumentError, LogicState,
    Point, Simulation, VersionCheck, WireSegment, PROPAGATION_DELAY_MS,
};
use std::{env, fs::File, io::BufReader, process, thread, time::Duration};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_TICKS: u64 = 1000;

/// A clock driving a two bit counter whose outputs light two lamps.
fn demo_circuit() -> Circuit {
    let mut circuit = Circuit::new();
    circuit.add_component(Component::new(
        ComponentKind::Clock(ClockConfig {
            toggle_ticks: 10,
            ..ClockConfig::default()
        }),
        Point::new(0, 0),
    ));
    circuit.add_component(Component::new(
        ComponentKind::Counter { bit_width: 2 },
        Point::new(4, 0),
    ));
    circuit.add_component(Component::new(ComponentKind::Output, Point::new(10, 0)));
    circuit.add_component(Component::new(ComponentKind::Output, Point::new(10, 1)));
    circuit.add_segment(WireSegment::horizontal(0, 0, 4));
    circuit.add_segment(WireSegment::horizontal(6, 0, 4));
    circuit.add_segment(WireSegment::horizontal(6, 1, 4));
    circuit
}

fn load(path: &str) -> Result<Circuit, DocumentError> {
    let document = CircuitDocument::from_reader(BufReader::new(File::open(path)?))?;
    if let VersionCheck::NewerCompatible(version) = document.check_version() {
        warn!(%version, "{} was saved by a newer version", path);
    }
    document.into_circuit()
}

fn run() -> Result<(), DocumentError> {
    let mut args = env::args().skip(1);
    let circuit = match args.next() {
        Some(path) => load(&path)?,
        None => demo_circuit(),
    };
    let ticks = args
        .next()
        .and_then(|t| t.parse().ok())
        .unwrap_or(DEFAULT_TICKS);

    let mut sim = Simulation::enter(&circuit);
    sim.run();
    while sim.tick() < ticks && sim.on_timer() {
        thread::sleep(Duration::from_millis(PROPAGATION_DELAY_MS));
    }

    for (index, component) in circuit.components.iter().enumerate() {
        if component.kind == ComponentKind::Output {
            let state = sim.lamp_state(index);
            info!(
                lamp = index,
                x = component.position.x,
                y = component.position.y,
                high = state == LogicState::High,
                "lamp state"
            );
        }
    }

    sim.leave();
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run() {
        error!(error = %err, "simulation failed");
        process::exit(1);
    }
}
