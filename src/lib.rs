pub mod action;
pub mod config;
pub mod dynamics;
pub mod env;
pub mod error;
pub mod gnc;
pub mod io;
pub mod normalize;
pub mod observation;
pub mod reward;
pub mod sim;
pub mod spacecraft;
pub mod storage;

pub use action::ActionModel;
pub use config::EnvConfig;
pub use env::{AttitudeEnv, StepOutcome};
pub use error::{ConfigError, StatsError, StepError};
pub use normalize::{Normalizer, RunningMeanStd};
pub use observation::ObservationModel;
pub use reward::RewardModel;
pub use sim::{IntegrationMethod, Propagator};
pub use spacecraft::{AttitudeState, InertiaTensor};
pub use storage::EpisodeBuffer;
