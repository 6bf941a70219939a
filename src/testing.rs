//! Shared fixtures for the unit tests.

use std::sync::Arc;

use crate::model::{InternalRequest, Request, Stop, StopAction, Stoplist};

/// Build a stoplist from `(location, EAT, timewindow_min, timewindow_max)`
/// tuples. The first tuple becomes the list head. All stops are internal
/// markers with zero occupancy; use
/// [`stoplist_from_properties_with_occupancies`] where occupancies matter.
pub fn stoplist_from_properties<L: Clone + PartialEq>(
    properties: &[(L, f64, f64, f64)],
) -> Stoplist<L> {
    let with_occupancies: Vec<_> = properties
        .iter()
        .map(|(location, eat, tw_min, tw_max)| (location.clone(), *eat, *tw_min, *tw_max, 0))
        .collect();
    stoplist_from_properties_with_occupancies(&with_occupancies)
}

/// Like [`stoplist_from_properties`], with an explicit
/// `occupancy_after_servicing` per stop.
pub fn stoplist_from_properties_with_occupancies<L: Clone + PartialEq>(
    properties: &[(L, f64, f64, f64, u32)],
) -> Stoplist<L> {
    let stops = properties
        .iter()
        .map(|(location, eat, tw_min, tw_max, occupancy)| Stop {
            location: location.clone(),
            request: Arc::new(Request::Internal(InternalRequest::cpe(location.clone()))),
            action: StopAction::Internal,
            estimated_arrival_time: *eat,
            occupancy_after_servicing: *occupancy,
            time_window_min: *tw_min,
            time_window_max: *tw_max,
        })
        .collect();
    Stoplist::from_stops(stops).expect("test fixture stoplists are CPE-headed")
}
