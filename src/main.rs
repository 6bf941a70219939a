use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use ridepool_rust::{
    callbacks::{EventLogCallback, SimulationCallback, SummaryCallback},
    dispatch::BruteForceTotalTravelTimeMinimizingDispatcher,
    requests::RandomRequestGenerator,
    simulation::{FleetState, InitialLocations},
    space::Euclidean2D,
};
use tracing::info;

const N_VEHICLES: u64 = 10;
const SEAT_CAPACITY: u32 = 4;
const REQUEST_RATE: f64 = 10.0;
const T_CUTOFF: f64 = 100.0;
const SEED: u64 = 42;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let space = Arc::new(Euclidean2D::unit(1.0));
    let mut rng = SmallRng::seed_from_u64(SEED);
    let mut fleet = FleetState::new(
        InitialLocations::Random {
            n_vehicles: N_VEHICLES,
            rng: &mut rng,
        },
        SEAT_CAPACITY,
        Arc::clone(&space),
        Arc::new(BruteForceTotalTravelTimeMinimizingDispatcher),
    )?;

    let requests = RandomRequestGenerator::new(Arc::clone(&space), REQUEST_RATE, SEED)
        .with_max_pickup_delay(1.0)
        .with_max_delivery_delay_rel(2.0);

    let run_dir: PathBuf = [
        "logs".to_string(),
        format!("run_{}", Local::now().format("%Y%m%d_%H%M%S")),
    ]
    .iter()
    .collect();
    let mut callbacks: Vec<Box<dyn SimulationCallback<(f64, f64)>>> = vec![
        Box::new(EventLogCallback::new(run_dir.join("events.jsonl"))),
        Box::new(SummaryCallback::new()),
    ];

    info!(
        n_vehicles = N_VEHICLES,
        seat_capacity = SEAT_CAPACITY,
        request_rate = REQUEST_RATE,
        t_cutoff = T_CUTOFF,
        "starting simulation"
    );
    let start = Instant::now();
    let mut n_events = 0usize;
    for event in fleet.simulate(requests, T_CUTOFF) {
        for callback in callbacks.iter_mut() {
            callback.visit_event(&event);
        }
        n_events += 1;
    }
    for callback in callbacks.iter_mut() {
        callback.finalize()?;
    }

    info!(
        n_events,
        elapsed = %humantime::format_duration(start.elapsed()),
        "simulation finished"
    );
    Ok(())
}
