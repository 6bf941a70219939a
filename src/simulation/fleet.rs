use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::ensure;
use ordered_float::OrderedFloat;
use rand::rngs::SmallRng;
use rand::Rng;
use tracing::{debug, info};

use crate::dispatch::Dispatcher;
use crate::model::{
    MapType, Request, Stoplist, TransportationRequest, VehicleId,
};
use crate::space::TransportSpace;

use super::events::Event;
use super::vehicle::VehicleState;

/// Where the vehicles start out: pinned per vehicle, or drawn uniformly
/// from the space with ids `0..n_vehicles`.
pub enum InitialLocations<'a, L, RNG = SmallRng> {
    Deterministic(MapType<VehicleId, L>),
    Random { n_vehicles: u64, rng: &'a mut RNG },
}

/// One capacity for the whole fleet, or one per vehicle.
#[derive(Debug, Clone)]
pub enum SeatCapacities {
    Uniform(u32),
    PerVehicle(MapType<VehicleId, u32>),
}

impl From<u32> for SeatCapacities {
    fn from(capacity: u32) -> Self {
        SeatCapacities::Uniform(capacity)
    }
}

impl SeatCapacities {
    fn for_vehicle(&self, vehicle_id: VehicleId) -> anyhow::Result<u32> {
        match self {
            SeatCapacities::Uniform(capacity) => Ok(*capacity),
            SeatCapacities::PerVehicle(map) => map.get(&vehicle_id).copied().ok_or_else(
                || anyhow::anyhow!("no seat capacity given for vehicle {}", vehicle_id),
            ),
        }
    }
}

/// The whole fleet plus the simulation clock. This is the only mutator in a
/// run: it advances every vehicle, fans each request out to the per-vehicle
/// dispatchers, and commits exactly the cheapest proposal.
pub struct FleetState<S: TransportSpace, D: Dispatcher<S>> {
    vehicles: MapType<VehicleId, VehicleState<S, D>>,
    space: Arc<S>,
    t: f64,
}

impl<S: TransportSpace, D: Dispatcher<S>> FleetState<S, D> {
    pub fn new<RNG: Rng>(
        initial_locations: InitialLocations<'_, S::Loc, RNG>,
        seat_capacities: impl Into<SeatCapacities>,
        space: Arc<S>,
        dispatcher: Arc<D>,
    ) -> anyhow::Result<Self> {
        let locations: MapType<VehicleId, S::Loc> = match initial_locations {
            InitialLocations::Deterministic(map) => map,
            InitialLocations::Random { n_vehicles, rng } => (0..n_vehicles)
                .map(|id| (VehicleId(id), space.random_point(rng)))
                .collect(),
        };
        ensure!(!locations.is_empty(), "a fleet needs at least one vehicle");

        let seat_capacities = seat_capacities.into();
        let mut vehicles = MapType::new();
        for (vehicle_id, location) in locations {
            let vehicle = VehicleState::new(
                vehicle_id,
                Stoplist::new(location),
                Arc::clone(&space),
                Arc::clone(&dispatcher),
                seat_capacities.for_vehicle(vehicle_id)?,
            )?;
            vehicles.insert(vehicle_id, vehicle);
        }
        info!(n_vehicles = vehicles.len(), "created fleet");
        Ok(Self {
            vehicles,
            space,
            t: 0.0,
        })
    }

    /// Assemble a fleet from pre-built vehicle states, e.g. with per-vehicle
    /// stoplists or dispatchers (`D = Box<dyn Dispatcher<S>>`).
    pub fn from_vehicles(
        vehicles: Vec<VehicleState<S, D>>,
        space: Arc<S>,
    ) -> anyhow::Result<Self> {
        ensure!(!vehicles.is_empty(), "a fleet needs at least one vehicle");
        let mut map = MapType::new();
        for vehicle in vehicles {
            let vehicle_id = vehicle.vehicle_id();
            vehicle
                .stoplist()
                .validate(&*space, vehicle.seat_capacity())?;
            ensure!(
                map.insert(vehicle_id, vehicle).is_none(),
                "duplicate vehicle id {}",
                vehicle_id
            );
        }
        Ok(Self {
            vehicles: map,
            space,
            t: 0.0,
        })
    }

    /// Current simulation time.
    pub fn now(&self) -> f64 {
        self.t
    }

    pub fn space(&self) -> &Arc<S> {
        &self.space
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &VehicleState<S, D>> {
        self.vehicles.values()
    }

    pub fn vehicle(&self, vehicle_id: VehicleId) -> Option<&VehicleState<S, D>> {
        self.vehicles.get(&vehicle_id)
    }

    /// Advance the clock to `t` and fast-forward every vehicle. Events from
    /// all vehicles are merged by timestamp; ties keep vehicle-id order.
    pub fn fast_forward(&mut self, t: f64) -> Vec<Event<S::Loc>> {
        assert!(
            t >= self.t,
            "fast-forward must not move backwards: {} < {}",
            t,
            self.t
        );
        self.t = t;
        let mut events: Vec<Event<S::Loc>> = Vec::new();
        for vehicle in self.vehicles.values_mut() {
            events.extend(vehicle.fast_forward_time(t));
        }
        // stable: equal timestamps stay in ascending-vehicle-id order
        events.sort_by_key(|event| OrderedFloat(event.timestamp()));
        events
    }

    /// Dispatch one request across the fleet and commit the outcome: the
    /// candidate of the vehicle with the strictly smallest finite cost
    /// (lowest vehicle id on ties) replaces that vehicle's stoplist.
    /// Dispatchers never see each other's proposals, and losers' candidates
    /// are discarded.
    pub fn handle_transportation_request(
        &mut self,
        request: TransportationRequest<S::Loc>,
    ) -> Event<S::Loc> {
        debug!(request_id = request.request_id, "handling request");

        if request.origin == request.destination {
            debug!(
                request_id = request.request_id,
                "trivial request, rejecting without dispatch"
            );
            return Event::rejection(self.t, request.request_id);
        }

        let request = Arc::new(request);
        let mut best: Option<(VehicleId, f64, crate::dispatch::TimeWindows)> = None;
        for (vehicle_id, vehicle) in self.vehicles.iter_mut() {
            let (cost, windows) =
                vehicle.handle_transportation_request_single_vehicle(&request);
            // strict < keeps the lowest vehicle id on cost ties
            if best.is_none() || cost < best.as_ref().unwrap().1 {
                best = Some((*vehicle_id, cost, windows));
            }
        }

        let (best_vehicle, min_cost, windows) =
            best.expect("a fleet always has at least one vehicle");

        if min_cost.is_infinite() {
            debug!(request_id = request.request_id, "no vehicle found, rejecting");
            for vehicle in self.vehicles.values_mut() {
                vehicle.discard_candidate();
            }
            return Event::rejection(self.t, request.request_id);
        }

        debug!(
            request_id = request.request_id,
            vehicle_id = %best_vehicle,
            min_cost,
            "request accepted"
        );
        for (vehicle_id, vehicle) in self.vehicles.iter_mut() {
            if *vehicle_id == best_vehicle {
                vehicle.select_new_stoplist();
            } else {
                vehicle.discard_candidate();
            }
        }
        Event::acceptance(self.t, &request, windows)
    }

    /// Run the simulation over `requests` (ordered by non-decreasing
    /// creation timestamp), producing the event stream lazily: begin events,
    /// then per request the serviced-stop events up to its creation time
    /// followed by its submission and acceptance/rejection, and finally the
    /// drain up to `min(t_cutoff, last scheduled arrival)` plus end events.
    pub fn simulate<R>(
        &mut self,
        requests: R,
        t_cutoff: f64,
    ) -> Simulation<'_, S, D, R::IntoIter>
    where
        R: IntoIterator<Item = Request<S::Loc>>,
    {
        Simulation {
            fleet: self,
            requests: requests.into_iter(),
            t_cutoff,
            buffer: VecDeque::new(),
            phase: Phase::Begin,
        }
    }
}

enum Phase {
    Begin,
    Stream,
    Wrapup,
    Done,
}

/// Lazy event stream over one simulation run. Dropping it mid-way leaves the
/// fleet at the last processed request.
pub struct Simulation<'a, S, D, R>
where
    S: TransportSpace,
    D: Dispatcher<S>,
    R: Iterator<Item = Request<S::Loc>>,
{
    fleet: &'a mut FleetState<S, D>,
    requests: R,
    t_cutoff: f64,
    buffer: VecDeque<Event<S::Loc>>,
    phase: Phase,
}

impl<S, D, R> Simulation<'_, S, D, R>
where
    S: TransportSpace,
    D: Dispatcher<S>,
    R: Iterator<Item = Request<S::Loc>>,
{
    fn step_request(&mut self, request: Request<S::Loc>) {
        let t = request.creation_timestamp();
        self.buffer.extend(self.fleet.fast_forward(t));
        match request {
            Request::Transportation(request) => {
                self.buffer.push_back(Event::submission(t, &request));
                let response = self.fleet.handle_transportation_request(request);
                self.buffer.push_back(response);
            }
            Request::Internal(request) => {
                // no fleet-level semantics exist for these
                panic!(
                    "internal request {} in the request stream is not dispatchable",
                    request.request_id
                );
            }
        }
    }

    fn wrap_up(&mut self) {
        let last_scheduled = self
            .fleet
            .vehicles
            .values()
            .map(|vehicle| vehicle.stoplist().last().estimated_arrival_time)
            .fold(f64::NEG_INFINITY, f64::max);
        let t_end = last_scheduled.min(self.t_cutoff).max(self.fleet.t);
        let events = self.fleet.fast_forward(t_end);
        self.buffer.extend(events);
        for (vehicle_id, vehicle) in self.fleet.vehicles.iter() {
            self.buffer.push_back(Event::end(
                self.fleet.t,
                *vehicle_id,
                vehicle.stoplist().cpe().location.clone(),
            ));
        }
    }
}

impl<S, D, R> Iterator for Simulation<'_, S, D, R>
where
    S: TransportSpace,
    D: Dispatcher<S>,
    R: Iterator<Item = Request<S::Loc>>,
{
    type Item = Event<S::Loc>;

    fn next(&mut self) -> Option<Event<S::Loc>> {
        loop {
            if let Some(event) = self.buffer.pop_front() {
                return Some(event);
            }
            match self.phase {
                Phase::Begin => {
                    for (vehicle_id, vehicle) in self.fleet.vehicles.iter() {
                        self.buffer.push_back(Event::begin(
                            self.fleet.t,
                            *vehicle_id,
                            vehicle.stoplist().cpe().location.clone(),
                        ));
                    }
                    self.phase = Phase::Stream;
                }
                Phase::Stream => match self.requests.next() {
                    Some(request)
                        if request.creation_timestamp() <= self.t_cutoff =>
                    {
                        self.step_request(request);
                    }
                    _ => self.phase = Phase::Wrapup,
                },
                Phase::Wrapup => {
                    self.wrap_up();
                    self.phase = Phase::Done;
                }
                Phase::Done => return None,
            }
        }
    }
}
