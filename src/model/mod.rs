use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

pub mod request;
pub mod stop;
pub mod stoplist;

pub use request::{
    InternalRequest, Request, RequestId, TransportationRequest, BEGIN_REQUEST_ID,
    CPE_REQUEST_ID, END_REQUEST_ID,
};
pub use stop::{Stop, StopAction};
pub use stoplist::Stoplist;

/// Ordered map used for all keyed state, so iteration order (and with it
/// event and tie-break order) is deterministic.
pub type MapType<K, V> = BTreeMap<K, V>;

/// Fleet-unique vehicle identifier. Cost ties during dispatch are broken
/// towards the lowest id.
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct VehicleId(pub u64);

impl Display for VehicleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for VehicleId {
    fn from(id: u64) -> Self {
        VehicleId(id)
    }
}
