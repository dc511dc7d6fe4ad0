use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::EnvConfig;
use crate::dynamics::DisturbanceModel;
use crate::error::{ConfigError, StatsError, StepError};
use crate::normalize::Normalizer;
use crate::sim::Propagator;
use crate::spacecraft::{AttitudeState, InertiaTensor};
use crate::storage::EpisodeBuffer;

// ---------------------------------------------------------------------------
// The closed control loop: observation -> action -> propagation -> reward
// ---------------------------------------------------------------------------

/// Result of one control decision.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub observation: Vec<f64>,
    /// Scalar reward, the (optionally normalized) sum of the terms.
    pub reward: f64,
    /// True when the reward engine or the time horizon ended the episode.
    pub terminated: bool,
    /// Always false; there is no external time-limit wrapper.
    pub truncated: bool,
    /// Decomposed raw reward terms for diagnostics.
    pub reward_terms: Vec<f64>,
}

/// Episodic attitude-control environment.
///
/// Owns every piece of per-episode state; nothing is shared between
/// instances, so independent environments can run on independent threads.
#[derive(Debug)]
pub struct AttitudeEnv {
    config: EnvConfig,
    state: AttitudeState,
    inertia: InertiaTensor,
    disturbances: DisturbanceModel,
    propagator: Propagator,
    buffer: EpisodeBuffer,
    normalizer: Option<Normalizer>,
    rng: StdRng,
    ready: bool,
}

impl AttitudeEnv {
    /// Build from a validated configuration. The environment still needs a
    /// `reset` before the first `step`.
    pub fn new(config: EnvConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = StdRng::from_entropy();
        let inertia = InertiaTensor::sample(&config.inertia, &mut rng)?;
        let state = AttitudeState::initialize(&config.attitude, &mut rng)?;
        let disturbances = DisturbanceModel::new(&config.disturbances)?;
        let propagator = Propagator::new(&config.propagator)?;
        let normalizer = config
            .normalize
            .as_ref()
            .map(|cfg| Normalizer::new(cfg, config.observation_model.dim()));

        Ok(Self {
            config,
            state,
            inertia,
            disturbances,
            propagator,
            buffer: EpisodeBuffer::new(),
            normalizer,
            rng,
            ready: false,
        })
    }

    /// Start a new episode, optionally reseeding the random source, and
    /// return the initial observation.
    ///
    /// The inertia tensor is redrawn per episode; normalization statistics
    /// persist, only the discounted-return accumulator resets.
    pub fn reset(&mut self, seed: Option<u64>) -> Result<Vec<f64>, ConfigError> {
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }

        self.inertia = InertiaTensor::sample(&self.config.inertia, &mut self.rng)?;
        self.state = AttitudeState::initialize(&self.config.attitude, &mut self.rng)?;
        self.propagator.reset();
        self.buffer.reset(&self.state);
        if let Some(normalizer) = &mut self.normalizer {
            normalizer.reset();
        }
        self.ready = true;

        debug!(
            angular_error = self.state.angular_error,
            "episode reset"
        );

        let obs = self
            .config
            .observation_model
            .observe(&self.buffer, self.config.n_skipped_frames);
        Ok(self.normalized_obs(obs))
    }

    /// Apply one control decision: elaborate the raw action, hold the torque
    /// for the first sub-step and zero it for the skipped frames, then score
    /// the updated history.
    pub fn step(&mut self, raw_action: &[f64]) -> Result<StepOutcome, StepError> {
        if !self.ready {
            return Err(StepError::NotReset);
        }

        let torque = self.config.action_model.elaborate(raw_action, &self.buffer);

        for substep in 0..=self.config.n_skipped_frames {
            let applied = if substep == 0 { torque } else { Vector3::zeros() };
            let x = self.state.prop_state();
            let (is_last_step, x_next) =
                self.propagator
                    .propagate(&x, &applied, &self.disturbances, &self.inertia)?;
            self.state.update_from(&x_next);
            self.buffer.update_records(
                self.propagator.current_time(),
                is_last_step,
                &self.state,
                applied,
            );
        }

        let n_skipped = self.config.n_skipped_frames;
        let obs = self.config.observation_model.observe(&self.buffer, n_skipped);
        let observation = self.normalized_obs(obs);

        let (is_last_reward, reward_terms) =
            self.config.reward_model.evaluate(&self.buffer, n_skipped);
        let raw_reward: f64 = reward_terms.iter().sum();
        let reward = match &mut self.normalizer {
            Some(normalizer) => normalizer.normalize_reward(raw_reward),
            None => raw_reward,
        };

        let terminated = is_last_reward || self.buffer.is_last_step();
        if terminated {
            self.ready = false;
            debug!(
                time = self.propagator.current_time(),
                angular_error = self.state.angular_error,
                failure = is_last_reward,
                "episode terminated"
            );
        }

        Ok(StepOutcome {
            observation,
            reward,
            terminated,
            truncated: false,
            reward_terms,
        })
    }

    fn normalized_obs(&mut self, obs: Vec<f64>) -> Vec<f64> {
        match &mut self.normalizer {
            Some(normalizer) => normalizer.normalize_obs(&obs),
            None => obs,
        }
    }

    pub fn state(&self) -> &AttitudeState {
        &self.state
    }

    pub fn buffer(&self) -> &EpisodeBuffer {
        &self.buffer
    }

    pub fn current_time(&self) -> f64 {
        self.propagator.current_time()
    }

    pub fn control_interval(&self) -> f64 {
        self.propagator.control_interval()
    }

    pub fn rng(&mut self) -> &mut impl Rng {
        &mut self.rng
    }

    pub fn normalizer(&self) -> Option<&Normalizer> {
        self.normalizer.as_ref()
    }

    /// Persist the normalization statistics; no-op without a normalizer.
    pub fn save_normalizer_stats(&self, path: &str) -> Result<(), StatsError> {
        match &self.normalizer {
            Some(normalizer) => normalizer.save_stats(path),
            None => Ok(()),
        }
    }

    /// Restore previously persisted normalization statistics.
    pub fn load_normalizer_stats(&mut self, path: &str) -> Result<(), StatsError> {
        match &mut self.normalizer {
            Some(normalizer) => normalizer.load_stats(path),
            None => Ok(()),
        }
    }
}
