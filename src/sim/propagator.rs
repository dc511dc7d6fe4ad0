use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::config::PropagatorConfig;
use crate::dynamics::{self, DisturbanceModel, StateVector};
use crate::error::{ConfigError, StepError};
use crate::spacecraft::InertiaTensor;

// ---------------------------------------------------------------------------
// One control interval of numerical integration, with horizon detection
// ---------------------------------------------------------------------------

/// Integration scheme for one control interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrationMethod {
    /// Classic fixed-step RK4 with `substeps` equal sub-intervals.
    Rk4 { substeps: usize },
    /// Adaptive Runge-Kutta-Fehlberg 4(5). Step-size underflow below
    /// `min_step` is a fatal integration error.
    Rkf45 { tolerance: f64, min_step: f64 },
}

impl Default for IntegrationMethod {
    fn default() -> Self {
        IntegrationMethod::Rkf45 {
            tolerance: 1e-8,
            min_step: 1e-6,
        }
    }
}

impl IntegrationMethod {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            IntegrationMethod::Rk4 { substeps } => {
                if substeps == 0 {
                    return Err(ConfigError::NoSubsteps);
                }
            }
            IntegrationMethod::Rkf45 { tolerance, min_step } => {
                if tolerance <= 0.0 {
                    return Err(ConfigError::InvalidTolerance(tolerance));
                }
                if min_step <= 0.0 {
                    return Err(ConfigError::InvalidMinStep(min_step));
                }
            }
        }
        Ok(())
    }
}

/// Advances the propagation state one control interval at a time, holding
/// the supplied torque constant, and reports when the episode horizon has
/// been reached.
#[derive(Debug, Clone)]
pub struct Propagator {
    control_interval: f64,
    time_horizon: f64,
    method: IntegrationMethod,
    current_time: f64,
}

impl Propagator {
    pub fn new(config: &PropagatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            control_interval: config.control_interval,
            time_horizon: config.time_horizon,
            method: config.method,
            current_time: 0.0,
        })
    }

    pub fn reset(&mut self) {
        self.current_time = 0.0;
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn control_interval(&self) -> f64 {
        self.control_interval
    }

    /// Integrate the dynamics over one control interval with `torque` held
    /// constant. Returns the horizon flag and the final (unnormalized)
    /// state; the caller renormalizes the quaternion on acceptance.
    pub fn propagate(
        &mut self,
        x: &StateVector,
        torque: &Vector3<f64>,
        disturbances: &DisturbanceModel,
        inertia: &InertiaTensor,
    ) -> Result<(bool, StateVector), StepError> {
        let t0 = self.current_time;
        let t1 = t0 + self.control_interval;

        let rhs = |t: f64, x: &StateVector| dynamics::derivative(t, x, torque, disturbances, inertia);

        let x_final = match self.method {
            IntegrationMethod::Rk4 { substeps } => {
                let h = self.control_interval / substeps as f64;
                let mut state = *x;
                let mut t = t0;
                for _ in 0..substeps {
                    state = rk4_step(&rhs, t, &state, h);
                    t += h;
                }
                state
            }
            IntegrationMethod::Rkf45 { tolerance, min_step } => {
                rkf45(&rhs, t0, t1, x, tolerance, min_step)?
            }
        };

        self.current_time = t1;
        let is_last_step = self.current_time >= self.time_horizon - 1e-9;
        Ok((is_last_step, x_final))
    }
}

/// Single RK4 step with the right-hand side held over the step.
fn rk4_step<F>(rhs: &F, t: f64, x: &StateVector, h: f64) -> StateVector
where
    F: Fn(f64, &StateVector) -> StateVector,
{
    let k1 = rhs(t, x);
    let k2 = rhs(t + h * 0.5, &(x + k1 * (h * 0.5)));
    let k3 = rhs(t + h * 0.5, &(x + k2 * (h * 0.5)));
    let k4 = rhs(t + h, &(x + k3 * h));
    x + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0)
}

/// Adaptive Runge-Kutta-Fehlberg 4(5) over [t0, t1].
fn rkf45<F>(
    rhs: &F,
    t0: f64,
    t1: f64,
    x0: &StateVector,
    tolerance: f64,
    min_step: f64,
) -> Result<StateVector, StepError>
where
    F: Fn(f64, &StateVector) -> StateVector,
{
    let mut t = t0;
    let mut x = *x0;
    let mut h = t1 - t0;

    while t < t1 - 1e-12 {
        h = h.min(t1 - t);
        if h < min_step {
            return Err(StepError::Integration { time: t, step: h });
        }

        let k1 = rhs(t, &x);
        let k2 = rhs(t + h * 0.25, &(x + k1 * (h * 0.25)));
        let k3 = rhs(
            t + h * 3.0 / 8.0,
            &(x + (k1 * 3.0 + k2 * 9.0) * (h / 32.0)),
        );
        let k4 = rhs(
            t + h * 12.0 / 13.0,
            &(x + (k1 * 1932.0 - k2 * 7200.0 + k3 * 7296.0) * (h / 2197.0)),
        );
        let k5 = rhs(
            t + h,
            &(x + (k1 * (439.0 / 216.0) - k2 * 8.0 + k3 * (3680.0 / 513.0)
                - k4 * (845.0 / 4104.0))
                * h),
        );
        let k6 = rhs(
            t + h * 0.5,
            &(x + (k2 * 2.0 - k1 * (8.0 / 27.0) - k3 * (3544.0 / 2565.0)
                + k4 * (1859.0 / 4104.0)
                - k5 * (11.0 / 40.0))
                * h),
        );

        let fourth = x
            + (k1 * (25.0 / 216.0) + k3 * (1408.0 / 2565.0) + k4 * (2197.0 / 4104.0)
                - k5 * (1.0 / 5.0))
                * h;
        let fifth = x
            + (k1 * (16.0 / 135.0) + k3 * (6656.0 / 12825.0) + k4 * (28561.0 / 56430.0)
                - k5 * (9.0 / 50.0)
                + k6 * (2.0 / 55.0))
                * h;

        let error = (fifth - fourth).norm();
        let scale = tolerance * x.norm().max(1.0);

        if error <= scale {
            t += h;
            x = fifth;
        }

        let growth = if error > 0.0 {
            (0.9 * (scale / error).powf(0.2)).clamp(0.1, 4.0)
        } else {
            4.0
        };
        h *= growth;
    }

    Ok(x)
}
