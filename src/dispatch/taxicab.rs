use std::sync::Arc;

use tracing::debug;

use crate::model::{Request, Stop, StopAction, Stoplist, TransportationRequest};
use crate::space::TransportSpace;

use super::{Dispatcher, DispatcherSolution, TimeWindows};

/// Plain taxi service: the pickup and dropoff are appended to the end of the
/// stoplist, never inserted in the middle. Requires `seat_capacity == 1`.
///
/// No pickup/delivery window feasibility check is performed; with append-only
/// scheduling there is no reordering that could help, so window semantics are
/// the caller's business. Cost is the dropoff arrival time.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaxicabDispatcherDriveFirst;

impl<S: TransportSpace> Dispatcher<S> for TaxicabDispatcherDriveFirst {
    fn dispatch(
        &self,
        request: &Arc<TransportationRequest<S::Loc>>,
        stoplist: &Stoplist<S::Loc>,
        space: &S,
        seat_capacity: u32,
    ) -> DispatcherSolution<S::Loc> {
        assert!(
            seat_capacity == 1,
            "the taxicab dispatcher only handles single-seat vehicles"
        );

        let last = stoplist.last();
        let cpat_pu =
            last.estimated_departure_time() + space.t(&last.location, &request.origin);
        let east_pu = request.pickup_timewindow_min;
        let cpat_do =
            east_pu.max(cpat_pu) + space.t(&request.origin, &request.destination);
        let last_pu = cpat_pu + request.delivery_timewindow_max;
        let east_do = east_pu;
        let last_do = f64::INFINITY;

        debug!(
            request_id = request.request_id,
            cpat_pu, cpat_do, "appending request to stoplist tail"
        );

        let shared: Arc<Request<S::Loc>> =
            Arc::new(Request::Transportation((**request).clone()));
        let mut new_stoplist = stoplist.clone();
        new_stoplist.push(Stop {
            location: request.origin.clone(),
            request: Arc::clone(&shared),
            action: StopAction::Pickup,
            estimated_arrival_time: cpat_pu,
            occupancy_after_servicing: last.occupancy_after_servicing + 1,
            time_window_min: east_pu,
            time_window_max: last_pu,
        });
        new_stoplist.push(Stop {
            location: request.destination.clone(),
            request: shared,
            action: StopAction::Dropoff,
            estimated_arrival_time: cpat_do,
            occupancy_after_servicing: 0,
            time_window_min: east_do,
            time_window_max: last_do,
        });

        DispatcherSolution {
            cost: cpat_do,
            stoplist: Some(new_stoplist),
            windows: TimeWindows {
                pickup_min: east_pu,
                pickup_max: last_pu,
                delivery_min: east_do,
                delivery_max: last_do,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::Euclidean1D;
    use crate::testing::stoplist_from_properties;

    #[test]
    fn appends_pickup_then_dropoff() {
        let space = Euclidean1D::default();
        let stoplist = stoplist_from_properties(&[(0.0, 0.0, 0.0, f64::INFINITY)]);
        let request = Arc::new(TransportationRequest::unconstrained(0, 0.0, 0.0, 1.0));

        let solution =
            TaxicabDispatcherDriveFirst.dispatch(&request, &stoplist, &space, 1);
        let new_stoplist = solution.stoplist.expect("taxi always accepts");
        assert_eq!(new_stoplist.len(), 3);
        assert_eq!(new_stoplist[1].action, StopAction::Pickup);
        assert_eq!(new_stoplist[1].estimated_arrival_time, 0.0);
        assert_eq!(new_stoplist[2].action, StopAction::Dropoff);
        assert_eq!(new_stoplist[2].estimated_arrival_time, 1.0);
        assert_eq!(solution.cost, 1.0);
    }

    #[test]
    fn cost_accounts_for_the_existing_queue() {
        let space = Euclidean1D::default();
        // vehicle still busy until t=5 at location 2
        let stoplist = stoplist_from_properties(&[
            (0.0, 0.0, 0.0, f64::INFINITY),
            (2.0, 5.0, 0.0, f64::INFINITY),
        ]);
        let request = Arc::new(TransportationRequest::unconstrained(1, 0.0, 0.0, 1.0));

        let solution =
            TaxicabDispatcherDriveFirst.dispatch(&request, &stoplist, &space, 1);
        // drive back to 0 (2 time units), then to 1
        assert_eq!(solution.cost, 8.0);
    }

    #[test]
    #[should_panic(expected = "single-seat")]
    fn rejects_multi_seat_vehicles() {
        let space = Euclidean1D::default();
        let stoplist = stoplist_from_properties(&[(0.0, 0.0, 0.0, f64::INFINITY)]);
        let request = Arc::new(TransportationRequest::unconstrained(0, 0.0, 0.0, 1.0));
        TaxicabDispatcherDriveFirst.dispatch(&request, &stoplist, &space, 4);
    }
}
