use std::sync::Arc;

use serde::Serialize;

use super::request::{InternalRequest, Request};

/// What a vehicle does when it services a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopAction {
    Pickup,
    Dropoff,
    Internal,
}

/// A planned action at a location, with the spatio-temporal constraints
/// attached. The pickup and dropoff stop of one transportation request share
/// the same request value.
#[derive(Debug, Clone, Serialize)]
pub struct Stop<L> {
    pub location: L,
    pub request: Arc<Request<L>>,
    pub action: StopAction,
    /// Estimated arrival time under the drive-first strategy.
    pub estimated_arrival_time: f64,
    pub occupancy_after_servicing: u32,
    pub time_window_min: f64,
    pub time_window_max: f64,
}

impl<L> Stop<L> {
    /// Vehicles may wait at a stop until its lower window but never leave
    /// early: departure is `max(EAT, time_window_min)`.
    pub fn estimated_departure_time(&self) -> f64 {
        self.estimated_arrival_time.max(self.time_window_min)
    }
}

impl<L: Clone> Stop<L> {
    /// The current position element heading every stoplist.
    pub fn cpe(location: L, estimated_arrival_time: f64) -> Self {
        Stop {
            request: Arc::new(Request::Internal(InternalRequest::cpe(location.clone()))),
            location,
            action: StopAction::Internal,
            estimated_arrival_time,
            occupancy_after_servicing: 0,
            time_window_min: 0.0,
            time_window_max: f64::INFINITY,
        }
    }
}
