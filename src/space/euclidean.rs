use rand::{Rng, RngCore};

use super::TransportSpace;

/// Point in the plane.
pub type R2Loc = (f64, f64);

/// The real line with constant velocity.
#[derive(Debug, Clone, PartialEq)]
pub struct Euclidean1D {
    pub coord_range: (f64, f64),
    pub velocity: f64,
}

impl Default for Euclidean1D {
    fn default() -> Self {
        Self {
            coord_range: (0.0, 1.0),
            velocity: 1.0,
        }
    }
}

impl Euclidean1D {
    pub fn new(coord_range: (f64, f64), velocity: f64) -> Self {
        assert!(velocity > 0.0, "velocity must be positive");
        Self {
            coord_range,
            velocity,
        }
    }
}

impl TransportSpace for Euclidean1D {
    type Loc = f64;

    fn d(&self, u: &f64, v: &f64) -> f64 {
        (v - u).abs()
    }

    fn t(&self, u: &f64, v: &f64) -> f64 {
        self.d(u, v) / self.velocity
    }

    fn interp_time(&self, u: &f64, v: &f64, time_to_dest: f64) -> (f64, f64) {
        let total = self.t(u, v);
        if total <= 0.0 || time_to_dest <= 0.0 {
            return (*v, 0.0);
        }
        (v - (v - u) * time_to_dest / total, 0.0)
    }

    fn interp_dist(&self, u: &f64, v: &f64, dist_to_dest: f64) -> (f64, f64) {
        let total = self.d(u, v);
        if total <= 0.0 || dist_to_dest <= 0.0 {
            return (*v, 0.0);
        }
        (v - (v - u) * dist_to_dest / total, 0.0)
    }

    fn random_point(&self, rng: &mut dyn RngCore) -> f64 {
        rng.random_range(self.coord_range.0..=self.coord_range.1)
    }
}

/// The Euclidean plane with constant velocity.
#[derive(Debug, Clone, PartialEq)]
pub struct Euclidean2D {
    pub coord_range: [(f64, f64); 2],
    pub velocity: f64,
}

impl Default for Euclidean2D {
    fn default() -> Self {
        Self {
            coord_range: [(0.0, 1.0); 2],
            velocity: 1.0,
        }
    }
}

impl Euclidean2D {
    pub fn new(coord_range: [(f64, f64); 2], velocity: f64) -> Self {
        assert!(velocity > 0.0, "velocity must be positive");
        Self {
            coord_range,
            velocity,
        }
    }

    /// Unit square at the given velocity.
    pub fn unit(velocity: f64) -> Self {
        Self::new([(0.0, 1.0); 2], velocity)
    }
}

fn lerp_towards(u: &R2Loc, v: &R2Loc, remaining: f64, total: f64) -> R2Loc {
    let k = remaining / total;
    (v.0 - (v.0 - u.0) * k, v.1 - (v.1 - u.1) * k)
}

impl TransportSpace for Euclidean2D {
    type Loc = R2Loc;

    fn d(&self, u: &R2Loc, v: &R2Loc) -> f64 {
        ((v.0 - u.0).powi(2) + (v.1 - u.1).powi(2)).sqrt()
    }

    fn t(&self, u: &R2Loc, v: &R2Loc) -> f64 {
        self.d(u, v) / self.velocity
    }

    fn interp_time(&self, u: &R2Loc, v: &R2Loc, time_to_dest: f64) -> (R2Loc, f64) {
        let total = self.t(u, v);
        if total <= 0.0 || time_to_dest <= 0.0 {
            return (*v, 0.0);
        }
        (lerp_towards(u, v, time_to_dest, total), 0.0)
    }

    fn interp_dist(&self, u: &R2Loc, v: &R2Loc, dist_to_dest: f64) -> (R2Loc, f64) {
        let total = self.d(u, v);
        if total <= 0.0 || dist_to_dest <= 0.0 {
            return (*v, 0.0);
        }
        (lerp_towards(u, v, dist_to_dest, total), 0.0)
    }

    fn random_point(&self, rng: &mut dyn RngCore) -> R2Loc {
        (
            rng.random_range(self.coord_range[0].0..=self.coord_range[0].1),
            rng.random_range(self.coord_range[1].0..=self.coord_range[1].1),
        )
    }
}

/// The plane under the L1 metric. Interpolation runs along the straight
/// segment between the endpoints, parameterized by the L1 distance.
#[derive(Debug, Clone, PartialEq)]
pub struct Manhattan2D {
    pub coord_range: [(f64, f64); 2],
    pub velocity: f64,
}

impl Default for Manhattan2D {
    fn default() -> Self {
        Self {
            coord_range: [(0.0, 1.0); 2],
            velocity: 1.0,
        }
    }
}

impl Manhattan2D {
    pub fn new(coord_range: [(f64, f64); 2], velocity: f64) -> Self {
        assert!(velocity > 0.0, "velocity must be positive");
        Self {
            coord_range,
            velocity,
        }
    }
}

impl TransportSpace for Manhattan2D {
    type Loc = R2Loc;

    fn d(&self, u: &R2Loc, v: &R2Loc) -> f64 {
        (u.0 - v.0).abs() + (u.1 - v.1).abs()
    }

    fn t(&self, u: &R2Loc, v: &R2Loc) -> f64 {
        self.d(u, v) / self.velocity
    }

    fn interp_time(&self, u: &R2Loc, v: &R2Loc, time_to_dest: f64) -> (R2Loc, f64) {
        let total = self.t(u, v);
        if total <= 0.0 || time_to_dest <= 0.0 {
            return (*v, 0.0);
        }
        (lerp_towards(u, v, time_to_dest, total), 0.0)
    }

    fn interp_dist(&self, u: &R2Loc, v: &R2Loc, dist_to_dest: f64) -> (R2Loc, f64) {
        let total = self.d(u, v);
        if total <= 0.0 || dist_to_dest <= 0.0 {
            return (*v, 0.0);
        }
        (lerp_towards(u, v, dist_to_dest, total), 0.0)
    }

    fn random_point(&self, rng: &mut dyn RngCore) -> R2Loc {
        (
            rng.random_range(self.coord_range[0].0..=self.coord_range[0].1),
            rng.random_range(self.coord_range[1].0..=self.coord_range[1].1),
        )
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn euclidean1d_metric_and_interpolation() {
        let space = Euclidean1D::new((0.0, 10.0), 2.0);
        assert_eq!(space.d(&1.0, &4.0), 3.0);
        assert_eq!(space.t(&1.0, &4.0), 1.5);
        assert_eq!(space.d(&4.0, &4.0), 0.0);

        let (x, jump) = space.interp_time(&0.0, &4.0, 0.5);
        assert_eq!(jump, 0.0);
        assert!((x - 3.0).abs() < 1e-12);

        let (x, jump) = space.interp_dist(&0.0, &4.0, 1.0);
        assert_eq!(jump, 0.0);
        assert!((x - 3.0).abs() < 1e-12);
    }

    #[test]
    fn euclidean2d_metric() {
        let space = Euclidean2D::default();
        assert!((space.d(&(0.0, 0.0), &(3.0, 4.0)) - 5.0).abs() < 1e-12);
        assert_eq!(space.d(&(1.0, 1.0), &(1.0, 1.0)), 0.0);
    }

    #[test]
    fn euclidean2d_interp_time_walks_the_segment() {
        let space = Euclidean2D::unit(1.0);
        let (x, jump) = space.interp_time(&(0.0, 0.0), &(0.0, 2.0), 0.5);
        assert_eq!(jump, 0.0);
        assert!((x.0 - 0.0).abs() < 1e-12);
        assert!((x.1 - 1.5).abs() < 1e-12);
    }

    #[test]
    fn interp_degenerate_segment_stays_put() {
        let space = Euclidean2D::unit(1.0);
        let (x, jump) = space.interp_time(&(0.5, 0.5), &(0.5, 0.5), 0.0);
        assert_eq!(x, (0.5, 0.5));
        assert_eq!(jump, 0.0);
    }

    #[test]
    fn manhattan_distance_is_l1() {
        let space = Manhattan2D::default();
        assert_eq!(space.d(&(0.0, 0.0), &(1.0, 2.0)), 3.0);
    }

    #[test]
    fn random_points_fall_in_range() {
        let space = Euclidean2D::new([(2.0, 3.0), (-1.0, 0.0)], 1.0);
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..100 {
            let (x, y) = space.random_point(&mut rng);
            assert!((2.0..=3.0).contains(&x));
            assert!((-1.0..=0.0).contains(&y));
        }
    }
}
