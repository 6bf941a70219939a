use std::ops::Index;

use anyhow::{bail, ensure};
use serde::Serialize;

use crate::space::TransportSpace;

use super::request::{Request, CPE_REQUEST_ID};
use super::stop::{Stop, StopAction};

/// Tolerance used when checking arrival-time consistency.
const EAT_TOLERANCE: f64 = 1e-6;

/// The ordered plan of a single vehicle: the current position element (CPE)
/// first, then every future stop in service order.
#[derive(Debug, Clone, Serialize)]
pub struct Stoplist<L>(Vec<Stop<L>>);

impl<L: Clone + PartialEq> Stoplist<L> {
    /// Fresh stoplist for an idle vehicle at `location`: just the CPE.
    pub fn new(location: L) -> Self {
        Stoplist(vec![Stop::cpe(location, 0.0)])
    }

    /// Wrap existing stops. The first stop must be a CPE.
    pub fn from_stops(stops: Vec<Stop<L>>) -> anyhow::Result<Self> {
        ensure!(!stops.is_empty(), "a stoplist must at least contain a CPE");
        let cpe = &stops[0];
        ensure!(
            cpe.action == StopAction::Internal,
            "malformed CPE: action must be 'internal'"
        );
        ensure!(
            cpe.request.request_id() == CPE_REQUEST_ID,
            "malformed CPE: request_id must be {}, got {}",
            CPE_REQUEST_ID,
            cpe.request.request_id()
        );
        ensure!(
            matches!(*cpe.request, Request::Internal(_)),
            "malformed CPE: request must be an internal request"
        );
        Ok(Stoplist(stops))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        // a well-formed stoplist never is; kept for interface completeness
        self.0.is_empty()
    }

    pub fn stops(&self) -> &[Stop<L>] {
        &self.0
    }

    pub fn cpe(&self) -> &Stop<L> {
        &self.0[0]
    }

    pub fn cpe_mut(&mut self) -> &mut Stop<L> {
        &mut self.0[0]
    }

    pub fn last(&self) -> &Stop<L> {
        self.0.last().expect("stoplist holds at least the CPE")
    }

    pub fn get(&self, index: usize) -> Option<&Stop<L>> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Stop<L>> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Stop<L>> {
        self.0.iter_mut()
    }

    pub fn insert(&mut self, index: usize, stop: Stop<L>) {
        self.0.insert(index, stop);
    }

    pub fn push(&mut self, stop: Stop<L>) {
        self.0.push(stop);
    }

    /// Remove the `count` stops directly after the CPE, returning the last
    /// one removed. The CPE itself is never removed.
    pub fn drain_after_cpe(&mut self, count: usize) -> Option<Stop<L>> {
        assert!(count < self.0.len(), "cannot drain past the end of the stoplist");
        self.0.drain(1..1 + count).last()
    }

    /// Restore arrival-time consistency after the stops themselves changed:
    /// walk the list once, driving first and waiting at most until each
    /// stop's lower window.
    pub fn recompute_arrival_times_drive_first<S>(&mut self, space: &S)
    where
        S: TransportSpace<Loc = L>,
    {
        for i in 1..self.0.len() {
            let departure = self.0[i - 1].estimated_departure_time();
            let leg = space.t(&self.0[i - 1].location, &self.0[i].location);
            self.0[i].estimated_arrival_time = departure + leg;
        }
    }

    /// Check the structural invariants. Dispatchers rely on these holding on
    /// entry; a violation is a programming error upstream.
    ///
    /// 1. CPE-headed (internal action, sentinel request id).
    /// 2. Drive-first arrival times along every adjacent pair.
    /// 3. Occupancies within `[0, seat_capacity]`.
    /// 4. No stop scheduled past its upper time window.
    /// 5. Each pickup has its dropoff later in the list, referencing the
    ///    same request.
    pub fn validate<S>(&self, space: &S, seat_capacity: u32) -> anyhow::Result<()>
    where
        S: TransportSpace<Loc = L>,
    {
        let cpe = self.cpe();
        ensure!(
            cpe.action == StopAction::Internal
                && cpe.request.request_id() == CPE_REQUEST_ID,
            "stoplist does not start with a CPE"
        );

        for (i, pair) in self.0.windows(2).enumerate() {
            let expected = pair[0].estimated_departure_time()
                + space.t(&pair[0].location, &pair[1].location);
            ensure!(
                (pair[1].estimated_arrival_time - expected).abs() <= EAT_TOLERANCE,
                "stale arrival time at stop {}: stored {}, drive-first gives {}",
                i + 1,
                pair[1].estimated_arrival_time,
                expected
            );
        }

        for (i, stop) in self.0.iter().enumerate() {
            ensure!(
                stop.occupancy_after_servicing <= seat_capacity,
                "occupancy {} at stop {} exceeds seat capacity {}",
                stop.occupancy_after_servicing,
                i,
                seat_capacity
            );
            if i > 0 {
                ensure!(
                    stop.estimated_arrival_time <= stop.time_window_max,
                    "stop {} arrives at {} past its window closing at {}",
                    i,
                    stop.estimated_arrival_time,
                    stop.time_window_max
                );
            }
        }

        for (i, stop) in self.0.iter().enumerate() {
            if stop.action != StopAction::Pickup {
                continue;
            }
            let request_id = stop.request.request_id();
            let dropoff = self.0[i + 1..].iter().find(|s| {
                s.action == StopAction::Dropoff && s.request.request_id() == request_id
            });
            match dropoff {
                Some(dropoff) => ensure!(
                    std::sync::Arc::ptr_eq(&stop.request, &dropoff.request),
                    "pickup and dropoff of request {} do not share one request",
                    request_id
                ),
                None => bail!("pickup of request {} has no later dropoff", request_id),
            }
        }

        Ok(())
    }
}

impl<L> Index<usize> for Stoplist<L> {
    type Output = Stop<L>;

    fn index(&self, index: usize) -> &Stop<L> {
        &self.0[index]
    }
}

impl<'a, L> IntoIterator for &'a Stoplist<L> {
    type Item = &'a Stop<L>;
    type IntoIter = std::slice::Iter<'a, Stop<L>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
