use serde::Serialize;

use crate::dispatch::TimeWindows;
use crate::model::{
    RequestId, TransportationRequest, VehicleId, BEGIN_REQUEST_ID, END_REQUEST_ID,
};

/// Everything the simulator reports: a tagged sum with a shared
/// `{event_type, timestamp}` prefix, serialized with an internal tag so the
/// stream is one self-describing record per event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event_type")]
pub enum Event<L> {
    VehicleStateBeginEvent {
        timestamp: f64,
        vehicle_id: VehicleId,
        location: L,
        request_id: RequestId,
    },
    VehicleStateEndEvent {
        timestamp: f64,
        vehicle_id: VehicleId,
        location: L,
        request_id: RequestId,
    },
    PickupEvent {
        timestamp: f64,
        request_id: RequestId,
        vehicle_id: VehicleId,
    },
    DeliveryEvent {
        timestamp: f64,
        request_id: RequestId,
        vehicle_id: VehicleId,
    },
    InternalEvent {
        timestamp: f64,
        vehicle_id: VehicleId,
    },
    RequestSubmissionEvent {
        timestamp: f64,
        request_id: RequestId,
        origin: L,
        destination: L,
        pickup_timewindow_min: f64,
        pickup_timewindow_max: f64,
        delivery_timewindow_min: f64,
        delivery_timewindow_max: f64,
    },
    RequestAcceptanceEvent {
        timestamp: f64,
        request_id: RequestId,
        origin: L,
        destination: L,
        pickup_timewindow_min: f64,
        pickup_timewindow_max: f64,
        delivery_timewindow_min: f64,
        delivery_timewindow_max: f64,
    },
    RequestRejectionEvent {
        timestamp: f64,
        request_id: RequestId,
    },
}

impl<L: Clone> Event<L> {
    pub fn begin(timestamp: f64, vehicle_id: VehicleId, location: L) -> Self {
        Event::VehicleStateBeginEvent {
            timestamp,
            vehicle_id,
            location,
            request_id: BEGIN_REQUEST_ID,
        }
    }

    pub fn end(timestamp: f64, vehicle_id: VehicleId, location: L) -> Self {
        Event::VehicleStateEndEvent {
            timestamp,
            vehicle_id,
            location,
            request_id: END_REQUEST_ID,
        }
    }

    pub fn submission(timestamp: f64, request: &TransportationRequest<L>) -> Self {
        Event::RequestSubmissionEvent {
            timestamp,
            request_id: request.request_id,
            origin: request.origin.clone(),
            destination: request.destination.clone(),
            pickup_timewindow_min: request.pickup_timewindow_min,
            pickup_timewindow_max: request.pickup_timewindow_max,
            delivery_timewindow_min: request.delivery_timewindow_min,
            delivery_timewindow_max: request.delivery_timewindow_max,
        }
    }

    /// Acceptance carries the windows actually committed on the inserted
    /// stops, not the ones asked for.
    pub fn acceptance(
        timestamp: f64,
        request: &TransportationRequest<L>,
        windows: TimeWindows,
    ) -> Self {
        Event::RequestAcceptanceEvent {
            timestamp,
            request_id: request.request_id,
            origin: request.origin.clone(),
            destination: request.destination.clone(),
            pickup_timewindow_min: windows.pickup_min,
            pickup_timewindow_max: windows.pickup_max,
            delivery_timewindow_min: windows.delivery_min,
            delivery_timewindow_max: windows.delivery_max,
        }
    }

    pub fn rejection(timestamp: f64, request_id: RequestId) -> Self {
        Event::RequestRejectionEvent {
            timestamp,
            request_id,
        }
    }
}

impl<L> Event<L> {
    pub fn timestamp(&self) -> f64 {
        match self {
            Event::VehicleStateBeginEvent { timestamp, .. }
            | Event::VehicleStateEndEvent { timestamp, .. }
            | Event::PickupEvent { timestamp, .. }
            | Event::DeliveryEvent { timestamp, .. }
            | Event::InternalEvent { timestamp, .. }
            | Event::RequestSubmissionEvent { timestamp, .. }
            | Event::RequestAcceptanceEvent { timestamp, .. }
            | Event::RequestRejectionEvent { timestamp, .. } => *timestamp,
        }
    }

    /// The vehicle this event concerns, if any. Request-level events belong
    /// to the fleet as a whole.
    pub fn vehicle_id(&self) -> Option<VehicleId> {
        match self {
            Event::VehicleStateBeginEvent { vehicle_id, .. }
            | Event::VehicleStateEndEvent { vehicle_id, .. }
            | Event::PickupEvent { vehicle_id, .. }
            | Event::DeliveryEvent { vehicle_id, .. }
            | Event::InternalEvent { vehicle_id, .. } => Some(*vehicle_id),
            _ => None,
        }
    }

    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            Event::VehicleStateBeginEvent { request_id, .. }
            | Event::VehicleStateEndEvent { request_id, .. }
            | Event::PickupEvent { request_id, .. }
            | Event::DeliveryEvent { request_id, .. }
            | Event::RequestSubmissionEvent { request_id, .. }
            | Event::RequestAcceptanceEvent { request_id, .. }
            | Event::RequestRejectionEvent { request_id, .. } => Some(*request_id),
            Event::InternalEvent { .. } => None,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Event::VehicleStateBeginEvent { .. } => "VehicleStateBeginEvent",
            Event::VehicleStateEndEvent { .. } => "VehicleStateEndEvent",
            Event::PickupEvent { .. } => "PickupEvent",
            Event::DeliveryEvent { .. } => "DeliveryEvent",
            Event::InternalEvent { .. } => "InternalEvent",
            Event::RequestSubmissionEvent { .. } => "RequestSubmissionEvent",
            Event::RequestAcceptanceEvent { .. } => "RequestAcceptanceEvent",
            Event::RequestRejectionEvent { .. } => "RequestRejectionEvent",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_an_internal_tag() {
        let event: Event<(f64, f64)> = Event::rejection(1.5, 42);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "RequestRejectionEvent");
        assert_eq!(json["timestamp"], 1.5);
        assert_eq!(json["request_id"], 42);
    }

    #[test]
    fn begin_and_end_carry_their_sentinels() {
        let begin = Event::begin(0.0, VehicleId(3), 0.0_f64);
        assert_eq!(begin.request_id(), Some(BEGIN_REQUEST_ID));
        let end = Event::end(9.0, VehicleId(3), 1.0_f64);
        assert_eq!(end.request_id(), Some(END_REQUEST_ID));
        assert_eq!(end.vehicle_id(), Some(VehicleId(3)));
    }
}
