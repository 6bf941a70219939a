use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::model::{Request, RequestId, TransportationRequest};
use crate::space::TransportSpace;

/// Poisson stream of transportation requests on a transport space.
///
/// Inter-arrival times are exponential with the configured rate;
/// origin/destination pairs are drawn uniformly (redrawing when they
/// coincide). Time windows derive from the direct travel time:
/// pickup within `[t + offset, t + offset + max_pickup_delay]`, delivery no
/// later than the pickup lower bound plus the direct travel time plus the
/// smaller of the absolute and the relative delivery delay allowance.
///
/// The stream is infinite; bound a simulation with its `t_cutoff` or `take`.
pub struct RandomRequestGenerator<S: TransportSpace> {
    space: Arc<S>,
    rate: f64,
    rng: SmallRng,
    now: f64,
    next_request_id: RequestId,
    pickup_timewindow_offset: f64,
    max_pickup_delay: f64,
    max_delivery_delay_abs: f64,
    max_delivery_delay_rel: f64,
}

impl<S: TransportSpace> RandomRequestGenerator<S> {
    /// Generator with `rate` requests per unit time and fully open windows.
    pub fn new(space: Arc<S>, rate: f64, seed: u64) -> Self {
        assert!(rate > 0.0, "request rate must be positive");
        Self {
            space,
            rate,
            rng: SmallRng::seed_from_u64(seed),
            now: 0.0,
            next_request_id: 0,
            pickup_timewindow_offset: 0.0,
            max_pickup_delay: f64::INFINITY,
            max_delivery_delay_abs: f64::INFINITY,
            max_delivery_delay_rel: f64::INFINITY,
        }
    }

    pub fn with_pickup_timewindow_offset(mut self, offset: f64) -> Self {
        self.pickup_timewindow_offset = offset;
        self
    }

    pub fn with_max_pickup_delay(mut self, delay: f64) -> Self {
        self.max_pickup_delay = delay;
        self
    }

    pub fn with_max_delivery_delay_abs(mut self, delay: f64) -> Self {
        self.max_delivery_delay_abs = delay;
        self
    }

    /// Delivery delay allowance relative to the direct travel time: a value
    /// of 0.5 allows deliveries up to 1.5 times the direct travel time after
    /// the pickup lower bound.
    pub fn with_max_delivery_delay_rel(mut self, delay: f64) -> Self {
        self.max_delivery_delay_rel = delay;
        self
    }

    fn sample_interarrival(&mut self) -> f64 {
        // exponential via inverse transform: -ln(1 - U) / rate
        let u: f64 = self.rng.random();
        -(1.0 - u).ln() / self.rate
    }
}

impl<S: TransportSpace> Iterator for RandomRequestGenerator<S> {
    type Item = Request<S::Loc>;

    fn next(&mut self) -> Option<Request<S::Loc>> {
        self.now += self.sample_interarrival();
        let request_id = self.next_request_id;
        self.next_request_id += 1;

        let (origin, destination) = loop {
            let origin = self.space.random_point(&mut self.rng);
            let destination = self.space.random_point(&mut self.rng);
            if origin != destination {
                break (origin, destination);
            }
        };

        let direct_travel_time = self.space.t(&origin, &destination);
        let pickup_lbound = self.now + self.pickup_timewindow_offset;
        let pickup_ubound = pickup_lbound + self.max_pickup_delay;
        let delivery_ubound = pickup_lbound
            + direct_travel_time
            + self
                .max_delivery_delay_abs
                .min(self.max_delivery_delay_rel * direct_travel_time);

        Some(Request::Transportation(TransportationRequest {
            request_id,
            creation_timestamp: self.now,
            origin,
            destination,
            pickup_timewindow_min: pickup_lbound,
            pickup_timewindow_max: pickup_ubound,
            delivery_timewindow_min: pickup_lbound,
            delivery_timewindow_max: delivery_ubound,
        }))
    }
}
