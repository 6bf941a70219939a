use serde::Serialize;

/// Request identifier. Regular requests use non-negative ids; a few negative
/// sentinels mark system-generated entries.
pub type RequestId = i64;

/// Request id carried by every current position element.
pub const CPE_REQUEST_ID: RequestId = -1;
/// Request id attached to the begin-of-simulation marker events.
pub const BEGIN_REQUEST_ID: RequestId = -100;
/// Request id attached to the end-of-simulation marker events.
pub const END_REQUEST_ID: RequestId = -200;

/// A customer's request to be transported from `origin` to `destination`,
/// subject to closed pickup and delivery time windows (upper bounds may be
/// `f64::INFINITY`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransportationRequest<L> {
    pub request_id: RequestId,
    pub creation_timestamp: f64,
    pub origin: L,
    pub destination: L,
    pub pickup_timewindow_min: f64,
    pub pickup_timewindow_max: f64,
    pub delivery_timewindow_min: f64,
    pub delivery_timewindow_max: f64,
}

impl<L> TransportationRequest<L> {
    /// Request with fully unconstrained time windows.
    pub fn unconstrained(
        request_id: RequestId,
        creation_timestamp: f64,
        origin: L,
        destination: L,
    ) -> Self {
        Self {
            request_id,
            creation_timestamp,
            origin,
            destination,
            pickup_timewindow_min: 0.0,
            pickup_timewindow_max: f64::INFINITY,
            delivery_timewindow_min: 0.0,
            delivery_timewindow_max: f64::INFINITY,
        }
    }
}

/// A system-generated request pinning some location, e.g. the one backing the
/// current position element of every stoplist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InternalRequest<L> {
    pub request_id: RequestId,
    pub creation_timestamp: f64,
    pub location: L,
}

impl<L> InternalRequest<L> {
    pub fn cpe(location: L) -> Self {
        Self {
            request_id: CPE_REQUEST_ID,
            creation_timestamp: 0.0,
            location,
        }
    }
}

/// Either kind of request the simulator knows about.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Request<L> {
    Internal(InternalRequest<L>),
    Transportation(TransportationRequest<L>),
}

impl<L> Request<L> {
    pub fn request_id(&self) -> RequestId {
        match self {
            Request::Internal(r) => r.request_id,
            Request::Transportation(r) => r.request_id,
        }
    }

    pub fn creation_timestamp(&self) -> f64 {
        match self {
            Request::Internal(r) => r.creation_timestamp,
            Request::Transportation(r) => r.creation_timestamp,
        }
    }
}

impl<L> From<TransportationRequest<L>> for Request<L> {
    fn from(request: TransportationRequest<L>) -> Self {
        Request::Transportation(request)
    }
}

impl<L> From<InternalRequest<L>> for Request<L> {
    fn from(request: InternalRequest<L>) -> Self {
        Request::Internal(request)
    }
}
