use std::time::Duration;

/// A critically damped harmonic oscillator.
///
/// Stepped with semi-implicit Euler integration, which stays stable at the
/// frame rates a terminal animation runs at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    angular_frequency: f64,
    damping_ratio: f64,
}

impl Default for Spring {
    fn default() -> Self {
        Self::new(18.0, 1.0)
    }
}

impl Spring {
    #[must_use]
    pub const fn new(angular_frequency: f64, damping_ratio: f64) -> Self {
        Self {
            angular_frequency,
            damping_ratio,
        }
    }

    /// Advance `(position, velocity)` toward `target` by `dt`.
    #[must_use]
    pub fn step(&self, dt: Duration, position: f64, velocity: f64, target: f64) -> (f64, f64) {
        let dt = dt.as_secs_f64();
        let omega = self.angular_frequency;

        let acceleration =
            omega * omega * (target - position) - 2.0 * self.damping_ratio * omega * velocity;
        let velocity = velocity + acceleration * dt;
        let position = position + velocity * dt;

        (position, velocity)
    }
}
