use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use rand::Rng;
use tracing::debug;

use crate::config::AttitudeConfig;
use crate::dynamics::StateVector;
use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Attitude bookkeeping: current/target quaternions, error quaternion, and
// the scalar angular error derived from them
// ---------------------------------------------------------------------------

/// Current and target attitude plus derived error quantities.
///
/// The quaternion error is the Hamilton product of the target with the
/// conjugate of the current attitude; the angular error is its rotation
/// angle in degrees, always in [0, 180].
#[derive(Debug, Clone)]
pub struct AttitudeState {
    pub current: UnitQuaternion<f64>,
    pub target: UnitQuaternion<f64>,
    pub quaternion_error: UnitQuaternion<f64>,
    /// Degrees.
    pub angular_error: f64,
    /// Body frame, rad/s.
    pub angular_velocity: Vector3<f64>,
}

impl AttitudeState {
    /// Initialize for a new episode: rejection-sample a random attitude until
    /// its angular error from the target falls inside the configured band.
    ///
    /// The loop is bounded by `max_sample_attempts`; exhausting it means the
    /// band is unreachable and the configuration is rejected.
    pub fn initialize<R: Rng>(config: &AttitudeConfig, rng: &mut R) -> Result<Self, ConfigError> {
        let target = unit_from_components(&config.target_quaternion)
            .ok_or(ConfigError::DegenerateTargetQuaternion)?;

        let min = config.initial_angular_error_min;
        let max = config.initial_angular_error_max;

        for attempt in 0..config.max_sample_attempts {
            let raw = [
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
            ];
            let Some(current) = unit_from_components(&raw) else {
                continue;
            };
            let quaternion_error = quaternion_error(&target, &current);
            let angular_error = angular_error_deg(&quaternion_error);

            if angular_error >= min && angular_error <= max {
                debug!(attempt, angular_error, "sampled initial attitude");
                return Ok(Self {
                    current,
                    target,
                    quaternion_error,
                    angular_error,
                    angular_velocity: Vector3::from(config.initial_angular_velocity),
                });
            }
        }

        Err(ConfigError::UnreachableErrorBand {
            min,
            max,
            attempts: config.max_sample_attempts,
        })
    }

    /// Accept a propagated 7-vector: renormalize the quaternion (integration
    /// drift is expected every step) and refresh the derived errors.
    pub fn update_from(&mut self, x: &StateVector) {
        let raw = Quaternion::new(x[0], x[1], x[2], x[3]);
        if raw.norm() > 1e-12 {
            self.current = UnitQuaternion::new_normalize(raw);
        }
        self.angular_velocity = Vector3::new(x[4], x[5], x[6]);
        self.quaternion_error = quaternion_error(&self.target, &self.current);
        self.angular_error = angular_error_deg(&self.quaternion_error);
    }

    /// Pack the state for propagation: [q0..q3, w1..w3].
    pub fn prop_state(&self) -> StateVector {
        let q = self.current.quaternion();
        StateVector::from_column_slice(&[
            q.w,
            q.i,
            q.j,
            q.k,
            self.angular_velocity.x,
            self.angular_velocity.y,
            self.angular_velocity.z,
        ])
    }
}

/// target (x) conjugate(current): the rotation aligning current with target.
pub fn quaternion_error(
    target: &UnitQuaternion<f64>,
    current: &UnitQuaternion<f64>,
) -> UnitQuaternion<f64> {
    target * current.inverse()
}

/// Shortest rotation angle of the error quaternion, degrees in [0, 180].
pub fn angular_error_deg(quaternion_error: &UnitQuaternion<f64>) -> f64 {
    quaternion_error.angle().to_degrees()
}

fn unit_from_components(components: &[f64; 4]) -> Option<UnitQuaternion<f64>> {
    let raw = Quaternion::new(components[0], components[1], components[2], components[3]);
    if raw.norm() < 1e-9 {
        return None;
    }
    Some(UnitQuaternion::new_normalize(raw))
}
