use std::sync::Arc;

use tracing::debug;

use crate::model::{Stoplist, TransportationRequest};
use crate::space::TransportSpace;

use super::helpers::{
    cpat_of_inserted_stop, insert_request_drive_first, leg_time_to_next_stop,
    time_to_next_stop_after_insertion, violates_time_windows_after,
};
use super::{Dispatcher, DispatcherSolution, TimeWindows};

/// Ride-pooling dispatcher minimizing the total added travel time.
///
/// Enumerates every feasible pair of insertion positions `(i, j)` for the
/// pickup and dropoff, pruning on seat capacity and time windows, and keeps
/// the strictly cheapest one (the first such pair on ties, making the result
/// deterministic). O(L²) in the stoplist length per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceTotalTravelTimeMinimizingDispatcher;

impl<S: TransportSpace> Dispatcher<S> for BruteForceTotalTravelTimeMinimizingDispatcher {
    fn dispatch(
        &self,
        request: &Arc<TransportationRequest<S::Loc>>,
        stoplist: &Stoplist<S::Loc>,
        space: &S,
        seat_capacity: u32,
    ) -> DispatcherSolution<S::Loc> {
        let mut min_cost = f64::INFINITY;
        let mut best_insertion: Option<(usize, usize)> = None;

        for i in 0..stoplist.len() {
            let stop_before_pickup = &stoplist[i];
            // a full vehicle after stop i cannot take the pickup here
            if stop_before_pickup.occupancy_after_servicing == seat_capacity {
                continue;
            }
            let time_to_pickup = space.t(&stop_before_pickup.location, &request.origin);
            let cpat_pu = cpat_of_inserted_stop(stop_before_pickup, time_to_pickup, 0.0);
            if cpat_pu > request.pickup_timewindow_max {
                continue;
            }
            let east_pu = request.pickup_timewindow_min;

            // pickup and dropoff back-to-back after stop i
            let time_to_dropoff = space.t(&request.origin, &request.destination);
            let cpat_do = east_pu.max(cpat_pu) + time_to_dropoff;
            if cpat_do > request.delivery_timewindow_max {
                // any dropoff position arrives no earlier than this one
                continue;
            }

            let time_from_dropoff =
                time_to_next_stop_after_insertion(stoplist, &request.destination, i, space);
            let original_pickup_edge = leg_time_to_next_stop(stoplist, i, space);
            let total_cost =
                time_to_pickup + time_to_dropoff + time_from_dropoff - original_pickup_edge;
            if total_cost < min_cost {
                let cpat_at_next_stop =
                    cpat_do.max(request.delivery_timewindow_min) + time_from_dropoff;
                if !violates_time_windows_after(stoplist, i, cpat_at_next_stop) {
                    best_insertion = Some((i, i));
                    min_cost = total_cost;
                }
            }

            // dropoff somewhere after a later stop j
            let time_from_pickup =
                time_to_next_stop_after_insertion(stoplist, &request.origin, i, space);
            let cpat_at_next_stop = cpat_pu.max(east_pu) + time_from_pickup;
            if violates_time_windows_after(stoplist, i, cpat_at_next_stop) {
                continue;
            }
            let pickup_cost = time_to_pickup + time_from_pickup - original_pickup_edge;

            let mut delta_cpat = match stoplist.get(i + 1) {
                Some(next) => cpat_at_next_stop - next.estimated_arrival_time,
                None => 0.0,
            };

            for j in i + 1..stoplist.len() {
                let stop_before_dropoff = &stoplist[j];
                // the passenger is on board from stop i on; once a stop is at
                // capacity no later dropoff position can work either
                if stop_before_dropoff.occupancy_after_servicing == seat_capacity {
                    break;
                }
                let time_to_dropoff =
                    space.t(&stop_before_dropoff.location, &request.destination);
                let cpat_do =
                    cpat_of_inserted_stop(stop_before_dropoff, time_to_dropoff, delta_cpat);
                if cpat_do > request.delivery_timewindow_max {
                    break;
                }

                let time_from_dropoff = time_to_next_stop_after_insertion(
                    stoplist,
                    &request.destination,
                    j,
                    space,
                );
                let original_dropoff_edge = leg_time_to_next_stop(stoplist, j, space);
                let dropoff_cost =
                    time_to_dropoff + time_from_dropoff - original_dropoff_edge;
                let total_cost = pickup_cost + dropoff_cost;

                if total_cost < min_cost {
                    let cpat_at_next_stop =
                        cpat_do.max(request.delivery_timewindow_min) + time_from_dropoff;
                    if !violates_time_windows_after(stoplist, j, cpat_at_next_stop) {
                        best_insertion = Some((i, j));
                        min_cost = total_cost;
                    }
                }

                // carry the remaining delay past stop j; slack at j may have
                // shrunk it
                let new_departure_time = (stop_before_dropoff.estimated_arrival_time
                    + delta_cpat)
                    .max(stop_before_dropoff.time_window_min);
                delta_cpat =
                    new_departure_time - stop_before_dropoff.estimated_departure_time();
            }
        }

        let Some((pickup_idx, dropoff_idx)) = best_insertion else {
            debug!(request_id = request.request_id, "no feasible insertion");
            return DispatcherSolution::rejected();
        };

        debug!(
            request_id = request.request_id,
            pickup_idx, dropoff_idx, min_cost, "best insertion"
        );

        let new_stoplist =
            insert_request_drive_first(stoplist, request, pickup_idx, dropoff_idx, space);
        let pickup_stop = &new_stoplist[pickup_idx + 1];
        let dropoff_stop = &new_stoplist[dropoff_idx + 2];
        let windows = TimeWindows {
            pickup_min: pickup_stop.time_window_min,
            pickup_max: pickup_stop.time_window_max,
            delivery_min: dropoff_stop.time_window_min,
            delivery_max: dropoff_stop.time_window_max,
        };

        DispatcherSolution {
            cost: min_cost,
            stoplist: Some(new_stoplist),
            windows,
        }
    }
}
