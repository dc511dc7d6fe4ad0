use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::storage::EpisodeBuffer;

// ---------------------------------------------------------------------------
// Raw action -> physical torque command
// ---------------------------------------------------------------------------

/// How a raw policy action becomes a body-frame torque. Elaboration runs
/// strictly before propagation and reads the action history as it stood at
/// the previous decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionModel {
    /// The action already is a torque; saturate per axis.
    Direct { limit: f64 },
    /// Affine remap `slope * action + intercept`, then saturation.
    Affine {
        slope: f64,
        intercept: f64,
        limit: f64,
    },
    /// Delta control: the affine-mapped action is added to the previously
    /// applied torque, the result smoothed by an EMA over the last
    /// `ema_window` recorded torques, then saturated.
    Incremental {
        slope: f64,
        intercept: f64,
        ema_window: usize,
        ema_alpha: f64,
        limit: f64,
    },
}

impl Default for ActionModel {
    fn default() -> Self {
        ActionModel::Direct { limit: 0.5 }
    }
}

impl ActionModel {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limit = match *self {
            ActionModel::Direct { limit } => limit,
            ActionModel::Affine { limit, .. } => limit,
            ActionModel::Incremental {
                ema_window,
                ema_alpha,
                limit,
                ..
            } => {
                if ema_window == 0 {
                    return Err(ConfigError::EmptyEmaWindow);
                }
                if !(ema_alpha > 0.0 && ema_alpha <= 1.0) {
                    return Err(ConfigError::InvalidEmaAlpha(ema_alpha));
                }
                limit
            }
        };
        if limit <= 0.0 {
            return Err(ConfigError::InvalidTorqueLimit(limit));
        }
        Ok(())
    }

    /// Elaborate a raw action into a torque. Missing components read as 0.
    pub fn elaborate(&self, raw: &[f64], buffer: &EpisodeBuffer) -> Vector3<f64> {
        let raw = Vector3::new(component(raw, 0), component(raw, 1), component(raw, 2));
        match *self {
            ActionModel::Direct { limit } => saturate(&raw, limit),
            ActionModel::Affine {
                slope,
                intercept,
                limit,
            } => saturate(&raw.map(|c| slope * c + intercept), limit),
            ActionModel::Incremental {
                slope,
                intercept,
                ema_window,
                ema_alpha,
                limit,
            } => {
                let previous = buffer.latest_action().copied().unwrap_or_else(Vector3::zeros);
                let candidate = previous + raw.map(|c| slope * c + intercept);

                // EMA seeded at the oldest sample of the window, ending on
                // the new candidate torque.
                let window = buffer.recent_actions_window(ema_window);
                let mut samples = window.iter().copied().chain(std::iter::once(candidate));
                let seed = samples.next().unwrap_or(candidate);
                let smoothed = samples
                    .fold(seed, |ema, sample| sample * ema_alpha + ema * (1.0 - ema_alpha));

                saturate(&smoothed, limit)
            }
        }
    }
}

fn component(raw: &[f64], index: usize) -> f64 {
    raw.get(index).copied().unwrap_or(0.0)
}

fn saturate(torque: &Vector3<f64>, limit: f64) -> Vector3<f64> {
    torque.map(|c| c.clamp(-limit, limit))
}
