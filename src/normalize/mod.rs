pub mod running_stats;

pub use running_stats::RunningMeanStd;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::NormalizeConfig;
use crate::error::StatsError;

// ---------------------------------------------------------------------------
// Observation and reward normalization with persisted statistics
// ---------------------------------------------------------------------------

/// Standardizes observations and scales rewards by the variance of the
/// discounted return, the statistics shared across episodes.
///
/// In training mode every observation and reward also updates the running
/// statistics; in evaluation mode the statistics are frozen. The discounted
/// return accumulator is the only piece of state reset per episode.
#[derive(Debug, Clone)]
pub struct Normalizer {
    normalize_obs: bool,
    normalize_reward: bool,
    training: bool,
    clip_obs: f64,
    clip_reward: f64,
    gamma: f64,
    epsilon: f64,
    obs_rms: RunningMeanStd,
    ret_rms: RunningMeanStd,
    returns: f64,
}

/// The durable state: configuration scalars plus both aggregates.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    clip_obs: f64,
    clip_reward: f64,
    gamma: f64,
    epsilon: f64,
    obs_rms: RunningMeanStd,
    ret_rms: RunningMeanStd,
}

impl Normalizer {
    pub fn new(config: &NormalizeConfig, obs_dim: usize) -> Self {
        Self {
            normalize_obs: config.normalize_obs,
            normalize_reward: config.normalize_reward,
            training: config.training,
            clip_obs: config.clip_obs,
            clip_reward: config.clip_reward,
            gamma: config.gamma,
            epsilon: config.epsilon,
            obs_rms: RunningMeanStd::new(obs_dim),
            ret_rms: RunningMeanStd::new(1),
            returns: 0.0,
        }
    }

    /// Episode boundary: only the discounted-return accumulator resets, the
    /// statistics persist.
    pub fn reset(&mut self) {
        self.returns = 0.0;
    }

    pub fn set_training(&mut self, training: bool) {
        self.training = training;
    }

    /// Standardize and clip an observation. In training mode the statistics
    /// absorb the observation first, so even the very first observation is
    /// normalized against a statistic that includes it.
    pub fn normalize_obs(&mut self, obs: &[f64]) -> Vec<f64> {
        if !self.normalize_obs {
            return obs.to_vec();
        }
        if self.training {
            self.obs_rms.update(obs);
        }
        let mean = self.obs_rms.mean();
        let var = self.obs_rms.var();
        obs.iter()
            .enumerate()
            .map(|(i, &x)| {
                ((x - mean[i]) / (var[i] + self.epsilon).sqrt())
                    .clamp(-self.clip_obs, self.clip_obs)
            })
            .collect()
    }

    /// Scale and clip a reward by the standard deviation of the discounted
    /// return. The accumulator, not the raw reward, feeds the statistics.
    pub fn normalize_reward(&mut self, reward: f64) -> f64 {
        if !self.normalize_reward {
            return reward;
        }
        if self.training {
            self.returns = self.gamma * self.returns + reward;
            self.ret_rms.update(&[self.returns]);
        }
        let scale = (self.ret_rms.var()[0] + self.epsilon).sqrt();
        (reward / scale).clamp(-self.clip_reward, self.clip_reward)
    }

    pub fn obs_rms(&self) -> &RunningMeanStd {
        &self.obs_rms
    }

    pub fn ret_rms(&self) -> &RunningMeanStd {
        &self.ret_rms
    }

    /// Write the durable state as JSON.
    pub fn save_stats<P: AsRef<Path>>(&self, path: P) -> Result<(), StatsError> {
        let file = File::create(path.as_ref())?;
        serde_json::to_writer_pretty(BufWriter::new(file), &PersistedStats {
            clip_obs: self.clip_obs,
            clip_reward: self.clip_reward,
            gamma: self.gamma,
            epsilon: self.epsilon,
            obs_rms: self.obs_rms.clone(),
            ret_rms: self.ret_rms.clone(),
        })?;
        info!(path = %path.as_ref().display(), "saved normalization statistics");
        Ok(())
    }

    /// Restore the durable state, rejecting statistics recorded for a
    /// different observation layout.
    pub fn load_stats<P: AsRef<Path>>(&mut self, path: P) -> Result<(), StatsError> {
        let file = File::open(path.as_ref())?;
        let stats: PersistedStats = serde_json::from_reader(BufReader::new(file))?;
        if stats.obs_rms.dim() != self.obs_rms.dim() {
            return Err(StatsError::DimensionMismatch {
                expected: self.obs_rms.dim(),
                found: stats.obs_rms.dim(),
            });
        }
        self.clip_obs = stats.clip_obs;
        self.clip_reward = stats.clip_reward;
        self.gamma = stats.gamma;
        self.epsilon = stats.epsilon;
        self.obs_rms = stats.obs_rms;
        self.ret_rms = stats.ret_rms;
        info!(path = %path.as_ref().display(), "loaded normalization statistics");
        Ok(())
    }
}
