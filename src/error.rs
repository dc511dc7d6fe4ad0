use thiserror::Error;

// ---------------------------------------------------------------------------
// Error taxonomy: construction-time configuration errors, fatal step errors,
// and persisted-statistics errors. Numerical degeneracies (zero-norm
// quaternions, non-positive periods, short lookback windows) are handled
// structurally and never surface here.
// ---------------------------------------------------------------------------

/// Errors detected while validating or sampling a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("initial angular error band [{min}, {max}] deg is invalid")]
    InvalidErrorBand { min: f64, max: f64 },

    #[error("no initial attitude inside [{min}, {max}] deg after {attempts} attempts")]
    UnreachableErrorBand { min: f64, max: f64, attempts: usize },

    #[error("target quaternion has near-zero norm")]
    DegenerateTargetQuaternion,

    #[error("inertia tensor is singular")]
    SingularInertia,

    #[error("inertia range [{min}, {max}] for {component} is invalid")]
    InvalidInertiaRange {
        component: &'static str,
        min: f64,
        max: f64,
    },

    #[error("disturbance window [{start}, {end}] is inverted")]
    InvalidTorqueWindow { start: f64, end: f64 },

    #[error("EMA window must hold at least one sample")]
    EmptyEmaWindow,

    #[error("EMA smoothing factor {0} is outside (0, 1]")]
    InvalidEmaAlpha(f64),

    #[error("torque limit must be positive, got {0}")]
    InvalidTorqueLimit(f64),

    #[error("control interval must be positive, got {0}")]
    InvalidControlInterval(f64),

    #[error("time horizon must be positive, got {0}")]
    InvalidTimeHorizon(f64),

    #[error("integrator needs at least one sub-step")]
    NoSubsteps,

    #[error("integrator tolerance must be positive, got {0}")]
    InvalidTolerance(f64),

    #[error("integrator minimum step must be positive, got {0}")]
    InvalidMinStep(f64),
}

/// Fatal errors raised while stepping the environment. These are simulation
/// breakdowns, reported separately from normal episode termination.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("ODE integration failed: step size underflow at t={time:.6} (h={step:.3e})")]
    Integration { time: f64, step: f64 },

    #[error("environment must be reset before stepping")]
    NotReset,
}

/// Errors loading or saving persisted normalization statistics.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("normalizer state I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed normalizer state: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("normalizer state holds {found}-dim observation statistics, expected {expected}")]
    DimensionMismatch { expected: usize, found: usize },
}
