use std::fmt;
use std::sync::Arc;

use anyhow::ensure;
use tracing::{debug, trace};

use crate::dispatch::{Dispatcher, TimeWindows};
use crate::model::{StopAction, Stoplist, TransportationRequest, VehicleId, CPE_REQUEST_ID};
use crate::space::TransportSpace;

use super::events::Event;

/// One vehicle: its stoplist, its dispatcher, and the fast-forward state
/// machine advancing it through event time.
///
/// The dispatcher is a type parameter, so a homogeneous fleet gets static
/// dispatch on the hot path; `D = Box<dyn Dispatcher<S>>` works for mixed
/// fleets.
pub struct VehicleState<S: TransportSpace, D: Dispatcher<S>> {
    vehicle_id: VehicleId,
    stoplist: Stoplist<S::Loc>,
    space: Arc<S>,
    dispatcher: Arc<D>,
    seat_capacity: u32,
    /// Most recent dispatcher proposal, pending fleet-level selection.
    candidate_stoplist: Option<Stoplist<S::Loc>>,
}

impl<S: TransportSpace, D: Dispatcher<S>> fmt::Debug for VehicleState<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VehicleState")
            .field("vehicle_id", &self.vehicle_id)
            .field("stoplist", &self.stoplist)
            .field("seat_capacity", &self.seat_capacity)
            .finish_non_exhaustive()
    }
}

impl<S: TransportSpace, D: Dispatcher<S>> VehicleState<S, D> {
    /// The initial stoplist must be CPE-headed and placed on the space.
    pub fn new(
        vehicle_id: VehicleId,
        initial_stoplist: Stoplist<S::Loc>,
        space: Arc<S>,
        dispatcher: Arc<D>,
        seat_capacity: u32,
    ) -> anyhow::Result<Self> {
        ensure!(seat_capacity > 0, "vehicle {} has no seats", vehicle_id);
        let cpe = initial_stoplist.cpe();
        ensure!(
            cpe.action == StopAction::Internal
                && cpe.request.request_id() == CPE_REQUEST_ID,
            "vehicle {}: initial stoplist does not start with a CPE",
            vehicle_id
        );
        ensure!(
            space.contains(&cpe.location),
            "vehicle {}: initial location {:?} is not a point of the transport space",
            vehicle_id,
            cpe.location
        );
        debug!(%vehicle_id, seat_capacity, "created vehicle state");
        Ok(Self {
            vehicle_id,
            stoplist: initial_stoplist,
            space,
            dispatcher,
            seat_capacity,
            candidate_stoplist: None,
        })
    }

    pub fn vehicle_id(&self) -> VehicleId {
        self.vehicle_id
    }

    pub fn stoplist(&self) -> &Stoplist<S::Loc> {
        &self.stoplist
    }

    pub fn seat_capacity(&self) -> u32 {
        self.seat_capacity
    }

    /// Advance this vehicle to time `t`: service every stop whose departure
    /// time has passed (emitting its event at that departure time), then
    /// move the CPE to the interpolated position at `t`.
    pub fn fast_forward_time(&mut self, t: f64) -> Vec<Event<S::Loc>> {
        let mut events = Vec::new();

        let mut n_serviced = 0;
        while let Some(stop) = self.stoplist.get(1 + n_serviced) {
            let service_time = stop.estimated_departure_time();
            if service_time > t {
                break;
            }
            events.push(match stop.action {
                StopAction::Pickup => Event::PickupEvent {
                    timestamp: service_time,
                    request_id: stop.request.request_id(),
                    vehicle_id: self.vehicle_id,
                },
                StopAction::Dropoff => Event::DeliveryEvent {
                    timestamp: service_time,
                    request_id: stop.request.request_id(),
                    vehicle_id: self.vehicle_id,
                },
                StopAction::Internal => Event::InternalEvent {
                    timestamp: service_time,
                    vehicle_id: self.vehicle_id,
                },
            });
            n_serviced += 1;
        }

        // the stop with the largest departure time <= t; the (possibly
        // outdated) CPE if nothing was serviced
        let last_stop = match self.stoplist.drain_after_cpe(n_serviced) {
            Some(stop) => stop,
            None => self.stoplist.cpe().clone(),
        };

        trace!(
            vehicle_id = %self.vehicle_id,
            t,
            n_serviced,
            remaining = self.stoplist.len() - 1,
            "fast-forwarded vehicle"
        );

        self.stoplist.cpe_mut().occupancy_after_servicing =
            last_stop.occupancy_after_servicing;

        // CPE EAT > t means the vehicle is still mid-jump towards a discrete
        // location; position and EAT stay as interpolated last time.
        if self.stoplist.cpe().estimated_arrival_time <= t {
            if self.stoplist.len() > 1 {
                let (location, jump_time) = self.space.interp_time(
                    &last_stop.location,
                    &self.stoplist[1].location,
                    self.stoplist[1].estimated_arrival_time - t,
                );
                let cpe = self.stoplist.cpe_mut();
                cpe.location = location;
                cpe.estimated_arrival_time = t + jump_time;
            } else {
                // nothing left to do: idle at the last serviced location
                let cpe = self.stoplist.cpe_mut();
                cpe.location = last_stop.location.clone();
                cpe.estimated_arrival_time = t;
            }
        }

        events
    }

    /// Ask this vehicle's dispatcher for a proposal. The proposal is kept as
    /// the candidate stoplist; it only becomes effective through
    /// [`VehicleState::select_new_stoplist`] after the fleet picked a winner.
    pub fn handle_transportation_request_single_vehicle(
        &mut self,
        request: &Arc<TransportationRequest<S::Loc>>,
    ) -> (f64, TimeWindows) {
        let solution = self.dispatcher.dispatch(
            request,
            &self.stoplist,
            &self.space,
            self.seat_capacity,
        );
        let (cost, windows) = (solution.cost, solution.windows);
        self.candidate_stoplist = solution.stoplist;
        (cost, windows)
    }

    /// Commit the pending candidate stoplist. Panics when no dispatch
    /// preceded this call; that is a sequencing bug in the caller.
    pub fn select_new_stoplist(&mut self) {
        self.stoplist = self
            .candidate_stoplist
            .take()
            .expect("select_new_stoplist without a pending candidate stoplist");
    }

    pub fn discard_candidate(&mut self) {
        self.candidate_stoplist = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::BruteForceTotalTravelTimeMinimizingDispatcher;
    use crate::space::{Euclidean1D, Graph};
    use crate::testing::stoplist_from_properties_with_occupancies;

    const INF: f64 = f64::INFINITY;

    type Pooling = BruteForceTotalTravelTimeMinimizingDispatcher;

    fn vehicle_on_line(
        properties: &[(f64, f64, f64, f64, u32)],
    ) -> VehicleState<Euclidean1D, Pooling> {
        VehicleState::new(
            VehicleId(0),
            stoplist_from_properties_with_occupancies(properties),
            Arc::new(Euclidean1D::new((0.0, 100.0), 1.0)),
            Arc::new(BruteForceTotalTravelTimeMinimizingDispatcher),
            4,
        )
        .unwrap()
    }

    #[test]
    fn fast_forward_services_due_stops_in_order() {
        let mut vehicle = vehicle_on_line(&[
            (0.0, 0.0, 0.0, INF, 0),
            (1.0, 1.0, 0.0, INF, 1),
            (2.0, 2.0, 0.0, INF, 2),
            (5.0, 5.0, 0.0, INF, 1),
        ]);
        let events = vehicle.fast_forward_time(3.0);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].timestamp(), 1.0);
        assert_eq!(events[1].timestamp(), 2.0);
        // CPE interpolated towards the remaining stop, occupancy carried over
        assert_eq!(vehicle.stoplist().len(), 2);
        assert_eq!(vehicle.stoplist().cpe().occupancy_after_servicing, 2);
        assert_eq!(vehicle.stoplist().cpe().location, 3.0);
        assert_eq!(vehicle.stoplist().cpe().estimated_arrival_time, 3.0);
    }

    #[test]
    fn fast_forward_respects_lower_windows() {
        // stop arrives at 1 but may only depart at 4
        let mut vehicle = vehicle_on_line(&[
            (0.0, 0.0, 0.0, INF, 0),
            (1.0, 1.0, 4.0, INF, 1),
        ]);
        let events = vehicle.fast_forward_time(3.0);
        assert!(events.is_empty());
        assert_eq!(vehicle.stoplist().len(), 2);

        let events = vehicle.fast_forward_time(4.0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].timestamp(), 4.0);
    }

    #[test]
    fn fast_forward_is_idempotent() {
        let mut vehicle = vehicle_on_line(&[
            (0.0, 0.0, 0.0, INF, 0),
            (1.0, 1.0, 0.0, INF, 1),
            (6.0, 6.0, 0.0, INF, 0),
        ]);
        let first = vehicle.fast_forward_time(2.0);
        assert_eq!(first.len(), 1);
        let snapshot = format!("{:?}", vehicle.stoplist());

        let second = vehicle.fast_forward_time(2.0);
        assert!(second.is_empty());
        assert_eq!(format!("{:?}", vehicle.stoplist()), snapshot);
    }

    #[test]
    fn stepwise_and_direct_fast_forward_agree() {
        let properties = [
            (0.0, 0.0, 0.0, INF, 0),
            (1.0, 1.0, 0.0, INF, 1),
            (3.0, 3.0, 0.0, INF, 0),
            (7.0, 7.0, 0.0, INF, 1),
        ];
        let mut stepwise = vehicle_on_line(&properties);
        let mut direct = vehicle_on_line(&properties);

        let mut stepwise_events = stepwise.fast_forward_time(2.5);
        stepwise_events.extend(stepwise.fast_forward_time(8.0));
        let direct_events = direct.fast_forward_time(8.0);

        assert_eq!(stepwise_events, direct_events);
        assert_eq!(
            format!("{:?}", stepwise.stoplist()),
            format!("{:?}", direct.stoplist())
        );
    }

    #[test]
    fn idle_vehicle_parks_at_its_last_stop() {
        let mut vehicle = vehicle_on_line(&[
            (0.0, 0.0, 0.0, INF, 0),
            (2.0, 2.0, 0.0, INF, 0),
        ]);
        let events = vehicle.fast_forward_time(10.0);
        assert_eq!(events.len(), 1);
        assert_eq!(vehicle.stoplist().len(), 1);
        assert_eq!(vehicle.stoplist().cpe().location, 2.0);
        assert_eq!(vehicle.stoplist().cpe().estimated_arrival_time, 10.0);
    }

    #[test]
    fn mid_jump_cpe_is_left_alone_on_graphs() {
        // 0 -- 1 -- 2, unit edges; stop at node 2 due at t=2
        let space = Arc::new(
            Graph::undirected(vec![0, 1, 2], &[(0, 1, 1.0), (1, 2, 1.0)], 1.0).unwrap(),
        );
        let mut vehicle: VehicleState<Graph, Pooling> = VehicleState::new(
            VehicleId(0),
            stoplist_from_properties_with_occupancies(&[
                (0, 0.0, 0.0, INF, 0),
                (2, 2.0, 0.0, INF, 0),
            ]),
            space,
            Arc::new(BruteForceTotalTravelTimeMinimizingDispatcher),
            4,
        )
        .unwrap();

        // halfway along the first edge: CPE resolves to node 1 at t=1
        let events = vehicle.fast_forward_time(0.5);
        assert!(events.is_empty());
        assert_eq!(vehicle.stoplist().cpe().location, 1);
        assert_eq!(vehicle.stoplist().cpe().estimated_arrival_time, 1.0);

        // still before the jump lands: the CPE must not move
        let events = vehicle.fast_forward_time(0.75);
        assert!(events.is_empty());
        assert_eq!(vehicle.stoplist().cpe().location, 1);
        assert_eq!(vehicle.stoplist().cpe().estimated_arrival_time, 1.0);
    }

    #[test]
    fn candidate_commits_only_on_selection() {
        let mut vehicle = vehicle_on_line(&[(0.0, 0.0, 0.0, INF, 0)]);
        let request = Arc::new(TransportationRequest::unconstrained(1, 0.0, 1.0, 2.0));

        let (cost, _windows) =
            vehicle.handle_transportation_request_single_vehicle(&request);
        assert!(cost.is_finite());
        // not committed yet
        assert_eq!(vehicle.stoplist().len(), 1);

        vehicle.select_new_stoplist();
        assert_eq!(vehicle.stoplist().len(), 3);
    }

    #[test]
    fn misplaced_initial_location_is_rejected() {
        let space = Arc::new(Graph::undirected(vec![0, 1], &[(0, 1, 1.0)], 1.0).unwrap());
        let result: anyhow::Result<VehicleState<Graph, Pooling>> = VehicleState::new(
            VehicleId(9),
            stoplist_from_properties_with_occupancies(&[(7, 0.0, 0.0, INF, 0)]),
            space,
            Arc::new(BruteForceTotalTravelTimeMinimizingDispatcher),
            4,
        );
        assert!(result.is_err());
    }
}
