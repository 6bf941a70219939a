use std::fmt::Debug;

use rand::RngCore;
use serde::Serialize;

pub mod euclidean;
pub mod graph;

pub use euclidean::{Euclidean1D, Euclidean2D, Manhattan2D, R2Loc};
pub use graph::Graph;

/// The metric and interpolation primitives the dispatcher and vehicle state
/// consume. Distances and travel times are non-negative reals related by a
/// constant velocity; symmetry is not required (directed graphs are fine),
/// and the triangle inequality is assumed by the dispatcher's pruning but
/// not enforced here.
pub trait TransportSpace: Send + Sync {
    type Loc: Clone + PartialEq + Debug + Serialize + Send + Sync + 'static;

    /// Distance between two points. `d(u, u) == 0`.
    fn d(&self, u: &Self::Loc, v: &Self::Loc) -> f64;

    /// Travel time between two points.
    fn t(&self, u: &Self::Loc, v: &Self::Loc) -> f64;

    /// Intermediate location `x` on the way from `u` to `v` with
    /// `t(x, v) == time_to_dest`, plus the residual jump time until `x` is
    /// actually reached. On discrete spaces a traveller can be mid-edge;
    /// `x` then is the next node and the jump time is the remaining travel
    /// time to it. Continuous spaces always report a zero jump.
    fn interp_time(&self, u: &Self::Loc, v: &Self::Loc, time_to_dest: f64)
        -> (Self::Loc, f64);

    /// Like [`TransportSpace::interp_time`], parameterized by the remaining
    /// distance `d(x, v) == dist_to_dest` instead.
    fn interp_dist(&self, u: &Self::Loc, v: &Self::Loc, dist_to_dest: f64)
        -> (Self::Loc, f64);

    /// Uniformly random location, used by request generation and random
    /// fleet placement.
    fn random_point(&self, rng: &mut dyn RngCore) -> Self::Loc;

    /// Whether `loc` is a point of this space. Fleet construction fails fast
    /// on initial locations the space does not contain.
    fn contains(&self, _loc: &Self::Loc) -> bool {
        true
    }
}
