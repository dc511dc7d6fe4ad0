use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::action::ActionModel;
use crate::error::ConfigError;
use crate::observation::ObservationModel;
use crate::reward::RewardModel;
use crate::sim::IntegrationMethod;

// ---------------------------------------------------------------------------
// Declarative configuration. Built once, validated at construction, and
// passed by reference into each component. No process-wide state.
// ---------------------------------------------------------------------------

/// Target attitude, initial rates, and the initial-error rejection band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttitudeConfig {
    /// Scalar-first target quaternion; normalized on use.
    pub target_quaternion: [f64; 4],
    /// Body-frame angular velocity at episode start, rad/s.
    pub initial_angular_velocity: [f64; 3],
    /// Rejection-sampling band for the initial angular error, degrees.
    pub initial_angular_error_min: f64,
    pub initial_angular_error_max: f64,
    /// Cap on rejection-sampling attempts before the band is declared
    /// unreachable.
    pub max_sample_attempts: usize,
}

impl Default for AttitudeConfig {
    fn default() -> Self {
        Self {
            target_quaternion: [1.0, 0.0, 0.0, 0.0],
            initial_angular_velocity: [0.0, 0.0, 0.0],
            initial_angular_error_min: 10.0,
            initial_angular_error_max: 180.0,
            max_sample_attempts: 1000,
        }
    }
}

impl AttitudeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (min, max) = (self.initial_angular_error_min, self.initial_angular_error_max);
        if !(0.0..=180.0).contains(&min) || !(0.0..=180.0).contains(&max) || min > max {
            return Err(ConfigError::InvalidErrorBand { min, max });
        }
        let norm_sq: f64 = self.target_quaternion.iter().map(|c| c * c).sum();
        if norm_sq.sqrt() < 1e-9 {
            return Err(ConfigError::DegenerateTargetQuaternion);
        }
        Ok(())
    }
}

/// A moment or product of inertia: fixed, or drawn uniformly per episode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InertiaParam {
    Fixed(f64),
    Uniform { min: f64, max: f64 },
}

impl InertiaParam {
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        match *self {
            InertiaParam::Fixed(value) => value,
            InertiaParam::Uniform { min, max } => {
                if max > min {
                    rng.gen_range(min..max)
                } else {
                    min
                }
            }
        }
    }

    fn validate(&self, component: &'static str) -> Result<(), ConfigError> {
        if let InertiaParam::Uniform { min, max } = *self {
            if min > max {
                return Err(ConfigError::InvalidInertiaRange { component, min, max });
            }
        }
        Ok(())
    }
}

/// Principal moments and products of inertia, kg*m^2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InertiaConfig {
    pub moi: [InertiaParam; 3],
    pub poi: [InertiaParam; 3],
}

impl Default for InertiaConfig {
    fn default() -> Self {
        Self {
            moi: [InertiaParam::Fixed(1.0); 3],
            poi: [InertiaParam::Fixed(0.0); 3],
        }
    }
}

impl InertiaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for param in &self.moi {
            param.validate("moi")?;
        }
        for param in &self.poi {
            param.validate("poi")?;
        }
        Ok(())
    }
}

/// Reference frame a disturbance amplitude is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorqueFrame {
    /// Body frame; applied directly.
    Rotating,
    /// Inertial frame; rotated into the body frame before summation.
    Fixed,
}

/// Constant torque active over a time window (or from a single activation
/// time onward when `end` is absent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstantTorqueConfig {
    pub amplitude: [f64; 3],
    pub start: f64,
    pub end: Option<f64>,
    pub frame: TorqueFrame,
}

/// Per-axis sinusoid `amplitude * cos(2*pi*t / period)`. Axes with a
/// non-positive period contribute zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinusoidalTorqueConfig {
    pub amplitude: [f64; 3],
    pub period: [f64; 3],
    pub frame: TorqueFrame,
}

/// Environment-disturbance torque sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisturbanceConfig {
    pub enabled: bool,
    pub constant: Vec<ConstantTorqueConfig>,
    pub sinusoidal: Vec<SinusoidalTorqueConfig>,
}

impl DisturbanceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for torque in &self.constant {
            if let Some(end) = torque.end {
                if end < torque.start {
                    return Err(ConfigError::InvalidTorqueWindow {
                        start: torque.start,
                        end,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Control interval, episode horizon, and integration method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropagatorConfig {
    /// Duration one action is held before the next decision, seconds.
    pub control_interval: f64,
    /// Simulated time at which the episode ends, seconds.
    pub time_horizon: f64,
    pub method: IntegrationMethod,
}

impl Default for PropagatorConfig {
    fn default() -> Self {
        Self {
            control_interval: 0.1,
            time_horizon: 60.0,
            method: IntegrationMethod::default(),
        }
    }
}

impl PropagatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.control_interval <= 0.0 {
            return Err(ConfigError::InvalidControlInterval(self.control_interval));
        }
        if self.time_horizon <= 0.0 {
            return Err(ConfigError::InvalidTimeHorizon(self.time_horizon));
        }
        self.method.validate()
    }
}

/// Normalization switches and parameters; also the persisted-state schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeConfig {
    pub normalize_obs: bool,
    pub normalize_reward: bool,
    /// Training mode updates statistics on every observation/reward.
    pub training: bool,
    pub clip_obs: f64,
    pub clip_reward: f64,
    /// Discount factor of the return accumulator.
    pub gamma: f64,
    pub epsilon: f64,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            normalize_obs: true,
            normalize_reward: true,
            training: true,
            clip_obs: 10.0,
            clip_reward: 10.0,
            gamma: 0.99,
            epsilon: 1e-8,
        }
    }
}

/// Complete environment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvConfig {
    pub attitude: AttitudeConfig,
    pub inertia: InertiaConfig,
    pub disturbances: DisturbanceConfig,
    pub propagator: PropagatorConfig,
    /// Zero-action sub-steps appended after each control decision.
    pub n_skipped_frames: usize,
    pub action_model: ActionModel,
    pub observation_model: ObservationModel,
    pub reward_model: RewardModel,
    pub normalize: Option<NormalizeConfig>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            attitude: AttitudeConfig::default(),
            inertia: InertiaConfig::default(),
            disturbances: DisturbanceConfig::default(),
            propagator: PropagatorConfig::default(),
            n_skipped_frames: 0,
            action_model: ActionModel::default(),
            observation_model: ObservationModel::Attitude,
            reward_model: RewardModel::Model1,
            normalize: None,
        }
    }
}

impl EnvConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.attitude.validate()?;
        self.inertia.validate()?;
        self.disturbances.validate()?;
        self.propagator.validate()?;
        self.action_model.validate()
    }
}
