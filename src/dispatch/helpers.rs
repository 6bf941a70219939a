//! Drive-first insertion primitives shared by the dispatchers.

use std::sync::Arc;

use crate::model::{Request, Stop, StopAction, Stoplist, TransportationRequest};
use crate::space::TransportSpace;

/// Arrival time at a stop inserted after `stop_before`, assuming the
/// preceding arrival is already shifted by `delta_cpat`.
pub fn cpat_of_inserted_stop<L>(
    stop_before: &Stop<L>,
    time_from_stop_before: f64,
    delta_cpat: f64,
) -> f64 {
    (stop_before.estimated_arrival_time + delta_cpat).max(stop_before.time_window_min)
        + time_from_stop_before
}

/// Travel time from a stop hypothetically inserted after `index` at
/// `location` to the stop that would follow it. Zero when appending at the
/// end.
pub fn time_to_next_stop_after_insertion<S>(
    stoplist: &Stoplist<S::Loc>,
    location: &S::Loc,
    index: usize,
    space: &S,
) -> f64
where
    S: TransportSpace,
{
    match stoplist.get(index + 1) {
        Some(next) => space.t(location, &next.location),
        None => 0.0,
    }
}

/// Travel time of the existing leg leaving stop `i`. Zero for the last stop.
pub fn leg_time_to_next_stop<S>(stoplist: &Stoplist<S::Loc>, i: usize, space: &S) -> f64
where
    S: TransportSpace,
{
    match stoplist.get(i + 1) {
        Some(next) => space.t(&stoplist[i].location, &next.location),
        None => 0.0,
    }
}

/// Time-window feasibility pre-check for inserting a stop after `idx`, where
/// `est_arrival_first_stop_after_insertion` is the propagated arrival at the
/// stop now following the insertion.
///
/// Walks the tail propagating the delay, which shrinks wherever a stop's
/// lower window forces waiting anyway. Returns `true` only if some stop's
/// upper window ends up violated *and strictly worse than before the
/// insertion*: a stop that was already late and is not delayed further does
/// not count. That tolerance is a deliberate policy choice.
pub fn violates_time_windows_after<L: Clone + PartialEq>(
    stoplist: &Stoplist<L>,
    idx: usize,
    est_arrival_first_stop_after_insertion: f64,
) -> bool {
    // appending at the end: nothing downstream to violate
    if idx + 2 > stoplist.len() {
        return false;
    }

    // the inserted stop incurs no detour for the rest of the list
    if est_arrival_first_stop_after_insertion <= stoplist[idx + 1].estimated_arrival_time {
        return false;
    }

    let mut delta_cpat =
        est_arrival_first_stop_after_insertion - stoplist[idx + 1].estimated_arrival_time;

    for stop in &stoplist.stops()[idx + 1..] {
        let old_leeway = stop.time_window_max - stop.estimated_arrival_time;
        let new_leeway = old_leeway - delta_cpat;

        if new_leeway < 0.0 && new_leeway < old_leeway {
            return true;
        } else if stop.time_window_min >= stop.estimated_arrival_time + delta_cpat {
            // waiting at this stop absorbs the delay entirely
            return false;
        } else {
            delta_cpat = stop
                .time_window_min
                .max(stop.estimated_arrival_time + delta_cpat)
                - stop.estimated_departure_time();
        }
    }

    false
}

/// Insert `stop` after position `idx`, propagating the arrival-time delay
/// into the tail. Propagation ends as soon as slack fully absorbs the delay.
fn insert_stop_drive_first<S>(
    stoplist: &mut Stoplist<S::Loc>,
    mut stop: Stop<S::Loc>,
    idx: usize,
    space: &S,
) where
    S: TransportSpace,
{
    stop.estimated_arrival_time = cpat_of_inserted_stop(
        &stoplist[idx],
        space.t(&stoplist[idx].location, &stop.location),
        0.0,
    );

    if idx + 1 < stoplist.len() {
        let mut delta_cpat = stop.estimated_departure_time()
            + space.t(&stop.location, &stoplist[idx + 1].location)
            - stoplist[idx + 1].estimated_arrival_time;

        for later_stop in stoplist.iter_mut().skip(idx + 1) {
            let old_departure = later_stop.estimated_departure_time();
            later_stop.estimated_arrival_time += delta_cpat;
            delta_cpat = later_stop.estimated_departure_time() - old_departure;
            if delta_cpat == 0.0 {
                break;
            }
        }
    }

    stoplist.insert(idx + 1, stop);
}

/// Produce a new stoplist with the request's pickup inserted after
/// `pickup_idx` and its dropoff after `dropoff_idx` (indices into the input
/// list; equal indices insert the pair back-to-back). The input stoplist is
/// left untouched. Single passenger per request throughout.
pub fn insert_request_drive_first<S>(
    stoplist: &Stoplist<S::Loc>,
    request: &Arc<TransportationRequest<S::Loc>>,
    pickup_idx: usize,
    dropoff_idx: usize,
    space: &S,
) -> Stoplist<S::Loc>
where
    S: TransportSpace,
{
    assert!(
        pickup_idx <= dropoff_idx && dropoff_idx < stoplist.len(),
        "insertion indices ({}, {}) out of bounds for stoplist of length {}",
        pickup_idx,
        dropoff_idx,
        stoplist.len()
    );

    let mut new_stoplist = stoplist.clone();
    let shared: Arc<Request<S::Loc>> =
        Arc::new(Request::Transportation((**request).clone()));

    let stop_before_pickup = &new_stoplist[pickup_idx];
    let pickup_stop = Stop {
        location: request.origin.clone(),
        request: Arc::clone(&shared),
        action: StopAction::Pickup,
        // fixed up by the insertion below
        estimated_arrival_time: 0.0,
        occupancy_after_servicing: stop_before_pickup.occupancy_after_servicing + 1,
        time_window_min: request.pickup_timewindow_min,
        time_window_max: request.pickup_timewindow_max,
    };

    // the stops between pickup and dropoff now carry the extra passenger
    for s in new_stoplist
        .iter_mut()
        .skip(pickup_idx + 1)
        .take(dropoff_idx - pickup_idx)
    {
        s.occupancy_after_servicing += 1;
    }

    insert_stop_drive_first(&mut new_stoplist, pickup_stop, pickup_idx, space);

    // the pickup shifted everything after it by one
    let dropoff_idx = dropoff_idx + 1;
    let stop_before_dropoff = &new_stoplist[dropoff_idx];
    let dropoff_stop = Stop {
        location: request.destination.clone(),
        request: shared,
        action: StopAction::Dropoff,
        estimated_arrival_time: 0.0,
        occupancy_after_servicing: stop_before_dropoff.occupancy_after_servicing - 1,
        time_window_min: request.delivery_timewindow_min,
        time_window_max: request.delivery_timewindow_max,
    };
    insert_stop_drive_first(&mut new_stoplist, dropoff_stop, dropoff_idx, space);

    new_stoplist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::Euclidean2D;
    use crate::testing::stoplist_from_properties;

    fn unconstrained_request(
        origin: (f64, f64),
        destination: (f64, f64),
    ) -> Arc<TransportationRequest<(f64, f64)>> {
        Arc::new(TransportationRequest::unconstrained(
            1,
            0.0,
            origin,
            destination,
        ))
    }

    #[test]
    fn adjacent_insertion_shifts_the_tail() {
        let space = Euclidean2D::unit(1.0);
        let stoplist = stoplist_from_properties(&[
            ((0.0, 0.0), 0.0, 0.0, f64::INFINITY),
            ((0.0, 2.0), 2.0, 0.0, f64::INFINITY),
        ]);
        let request = unconstrained_request((0.0, 1.0), (0.0, 1.5));

        let new_stoplist = insert_request_drive_first(&stoplist, &request, 0, 0, &space);
        assert_eq!(new_stoplist.len(), 4);
        assert_eq!(new_stoplist[1].location, (0.0, 1.0));
        assert_eq!(new_stoplist[1].estimated_arrival_time, 1.0);
        assert_eq!(new_stoplist[2].location, (0.0, 1.5));
        assert_eq!(new_stoplist[2].estimated_arrival_time, 1.5);
        // both new stops lie on the original leg, so the old stop keeps its EAT
        assert_eq!(new_stoplist[3].estimated_arrival_time, 2.0);
        // pickup and dropoff share one request value
        assert!(Arc::ptr_eq(&new_stoplist[1].request, &new_stoplist[2].request));
    }

    #[test]
    fn occupancies_update_between_pickup_and_dropoff() {
        let space = Euclidean2D::unit(1.0);
        let stoplist = stoplist_from_properties(&[
            ((0.0, 0.0), 0.0, 0.0, f64::INFINITY),
            ((0.0, 1.0), 1.0, 0.0, f64::INFINITY),
            ((0.0, 2.0), 2.0, 0.0, f64::INFINITY),
        ]);
        let request = unconstrained_request((0.0, 0.5), (0.0, 1.5));

        let new_stoplist = insert_request_drive_first(&stoplist, &request, 0, 1, &space);
        let occupancies: Vec<u32> = new_stoplist
            .iter()
            .map(|s| s.occupancy_after_servicing)
            .collect();
        assert_eq!(occupancies, vec![0, 1, 1, 0, 0]);
    }

    #[test]
    fn slack_stops_delay_propagation() {
        let space = Euclidean2D::unit(1.0);
        // second stop waits until t=10 anyway, so a small detour before it
        // must not move the third stop
        let stoplist = stoplist_from_properties(&[
            ((0.0, 0.0), 0.0, 0.0, f64::INFINITY),
            ((0.0, 1.0), 1.0, 10.0, f64::INFINITY),
            ((0.0, 2.0), 11.0, 0.0, f64::INFINITY),
        ]);
        let request = unconstrained_request((0.5, 0.0), (0.5, 0.5));
        let new_stoplist = insert_request_drive_first(&stoplist, &request, 0, 0, &space);
        assert_eq!(new_stoplist[4].estimated_arrival_time, 11.0);
    }

    #[test]
    fn precheck_accepts_absorbable_delay() {
        let stoplist = stoplist_from_properties(&[
            ((0.0, 0.0), 0.0, 0.0, f64::INFINITY),
            ((0.0, 1.0), 1.0, 5.0, 6.0),
            ((0.0, 2.0), 6.0, 0.0, 9.0),
        ]);
        // arriving at the next stop by 4.5 is fine: it waits until 5 anyway
        assert!(!violates_time_windows_after(&stoplist, 0, 4.5));
    }

    #[test]
    fn precheck_rejects_worsened_violation() {
        let stoplist = stoplist_from_properties(&[
            ((0.0, 0.0), 0.0, 0.0, f64::INFINITY),
            ((0.0, 1.0), 1.0, 0.0, 3.0),
            ((0.0, 2.0), 2.0, 0.0, 3.0),
        ]);
        assert!(violates_time_windows_after(&stoplist, 0, 3.5));
    }

    #[test]
    fn precheck_tolerates_preexisting_violation() {
        // the second stop is already past its window; an insertion that does
        // not delay it further passes
        let stoplist = stoplist_from_properties(&[
            ((0.0, 0.0), 0.0, 0.0, f64::INFINITY),
            ((0.0, 1.0), 4.0, 0.0, 3.0),
            ((0.0, 2.0), 5.0, 0.0, 9.0),
        ]);
        assert!(!violates_time_windows_after(&stoplist, 0, 4.0));
    }

    #[test]
    fn precheck_at_list_end_never_violates() {
        let stoplist = stoplist_from_properties(&[
            ((0.0, 0.0), 0.0, 0.0, f64::INFINITY),
            ((0.0, 1.0), 1.0, 0.0, 1.0),
        ]);
        assert!(!violates_time_windows_after(&stoplist, 1, 1e9));
    }
}
