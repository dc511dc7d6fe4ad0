use nalgebra::{Matrix3, Vector3};
use rand::Rng;

use crate::config::InertiaConfig;
use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Inertia tensor: symmetric 3x3, immutable for the episode once sampled
// ---------------------------------------------------------------------------

/// Symmetric inertia tensor with its inverse precomputed at construction.
#[derive(Debug, Clone)]
pub struct InertiaTensor {
    matrix: Matrix3<f64>,
    inverse: Matrix3<f64>,
}

impl InertiaTensor {
    /// Build from three principal moments and three products of inertia.
    pub fn new(moi: [f64; 3], poi: [f64; 3]) -> Result<Self, ConfigError> {
        #[rustfmt::skip]
        let matrix = Matrix3::new(
            moi[0], poi[0], poi[1],
            poi[0], moi[1], poi[2],
            poi[1], poi[2], moi[2],
        );
        let inverse = matrix.try_inverse().ok_or(ConfigError::SingularInertia)?;
        Ok(Self { matrix, inverse })
    }

    /// Draw a tensor for one episode, resolving any uniform-range components.
    pub fn sample<R: Rng>(config: &InertiaConfig, rng: &mut R) -> Result<Self, ConfigError> {
        let moi = [
            config.moi[0].sample(rng),
            config.moi[1].sample(rng),
            config.moi[2].sample(rng),
        ];
        let poi = [
            config.poi[0].sample(rng),
            config.poi[1].sample(rng),
            config.poi[2].sample(rng),
        ];
        Self::new(moi, poi)
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// Angular momentum I*w.
    pub fn momentum(&self, omega: &Vector3<f64>) -> Vector3<f64> {
        self.matrix * omega
    }

    /// Apply the inverse tensor: I^-1 * v.
    pub fn solve(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.inverse * v
    }
}
