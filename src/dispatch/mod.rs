use std::sync::Arc;

use serde::Serialize;

use crate::model::{Stoplist, TransportationRequest};
use crate::space::TransportSpace;

pub mod helpers;
pub mod ridepooling;
pub mod taxicab;

pub use ridepooling::BruteForceTotalTravelTimeMinimizingDispatcher;
pub use taxicab::TaxicabDispatcherDriveFirst;

/// The pickup/delivery windows committed on the two stops a dispatcher
/// inserted. All NaN on rejection.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TimeWindows {
    pub pickup_min: f64,
    pub pickup_max: f64,
    pub delivery_min: f64,
    pub delivery_max: f64,
}

impl TimeWindows {
    pub fn rejected() -> Self {
        Self {
            pickup_min: f64::NAN,
            pickup_max: f64::NAN,
            delivery_min: f64::NAN,
            delivery_max: f64::NAN,
        }
    }
}

/// What a dispatcher proposes for one vehicle: the cost of accepting the
/// request, the candidate stoplist and the committed windows. A rejection
/// carries infinite cost, no stoplist and NaN windows.
#[derive(Debug, Clone)]
pub struct DispatcherSolution<L> {
    pub cost: f64,
    pub stoplist: Option<Stoplist<L>>,
    pub windows: TimeWindows,
}

impl<L> DispatcherSolution<L> {
    pub fn rejected() -> Self {
        Self {
            cost: f64::INFINITY,
            stoplist: None,
            windows: TimeWindows::rejected(),
        }
    }

    pub fn is_rejection(&self) -> bool {
        self.stoplist.is_none()
    }
}

/// Maps `(request, stoplist, space, seat_capacity)` to a candidate stoplist
/// and its cost, without touching the input stoplist. The fleet calls every
/// vehicle's dispatcher per request and commits only the cheapest proposal,
/// so implementations must be pure.
pub trait Dispatcher<S: TransportSpace>: Send + Sync {
    fn dispatch(
        &self,
        request: &Arc<TransportationRequest<S::Loc>>,
        stoplist: &Stoplist<S::Loc>,
        space: &S,
        seat_capacity: u32,
    ) -> DispatcherSolution<S::Loc>;
}

impl<S: TransportSpace, D: Dispatcher<S> + ?Sized> Dispatcher<S> for Box<D> {
    fn dispatch(
        &self,
        request: &Arc<TransportationRequest<S::Loc>>,
        stoplist: &Stoplist<S::Loc>,
        space: &S,
        seat_capacity: u32,
    ) -> DispatcherSolution<S::Loc> {
        (**self).dispatch(request, stoplist, space, seat_capacity)
    }
}

impl<S: TransportSpace, D: Dispatcher<S> + ?Sized> Dispatcher<S> for Arc<D> {
    fn dispatch(
        &self,
        request: &Arc<TransportationRequest<S::Loc>>,
        stoplist: &Stoplist<S::Loc>,
        space: &S,
        seat_capacity: u32,
    ) -> DispatcherSolution<S::Loc> {
        (**self).dispatch(request, stoplist, space, seat_capacity)
    }
}
