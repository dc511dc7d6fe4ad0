use std::f64::consts::TAU;

use nalgebra::{Rotation3, Vector3};

use crate::config::{DisturbanceConfig, TorqueFrame};
use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Environment-disturbance torques: constant windows and per-axis sinusoids
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct ConstantTorque {
    amplitude: Vector3<f64>,
    start: f64,
    end: Option<f64>,
    frame: TorqueFrame,
}

impl ConstantTorque {
    fn active(&self, t: f64) -> bool {
        t >= self.start && self.end.map_or(true, |end| t <= end)
    }
}

#[derive(Debug, Clone)]
struct SinusoidalTorque {
    amplitude: Vector3<f64>,
    period: Vector3<f64>,
    frame: TorqueFrame,
}

impl SinusoidalTorque {
    fn sample(&self, t: f64) -> Vector3<f64> {
        // Non-positive periods contribute zero on that axis.
        Vector3::new(
            axis_sample(self.amplitude.x, self.period.x, t),
            axis_sample(self.amplitude.y, self.period.y, t),
            axis_sample(self.amplitude.z, self.period.z, t),
        )
    }
}

fn axis_sample(amplitude: f64, period: f64, t: f64) -> f64 {
    if period > 0.0 {
        amplitude * (TAU * t / period).cos()
    } else {
        0.0
    }
}

/// All configured disturbance sources, summed linearly at evaluation time.
#[derive(Debug, Clone)]
pub struct DisturbanceModel {
    constant: Vec<ConstantTorque>,
    sinusoidal: Vec<SinusoidalTorque>,
}

impl DisturbanceModel {
    pub fn new(config: &DisturbanceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        if !config.enabled {
            return Ok(Self::none());
        }
        Ok(Self {
            constant: config
                .constant
                .iter()
                .map(|c| ConstantTorque {
                    amplitude: Vector3::from(c.amplitude),
                    start: c.start,
                    end: c.end,
                    frame: c.frame,
                })
                .collect(),
            sinusoidal: config
                .sinusoidal
                .iter()
                .map(|s| SinusoidalTorque {
                    amplitude: Vector3::from(s.amplitude),
                    period: Vector3::from(s.period),
                    frame: s.frame,
                })
                .collect(),
        })
    }

    /// A model with no active sources.
    pub fn none() -> Self {
        Self {
            constant: Vec::new(),
            sinusoidal: Vec::new(),
        }
    }

    /// Total disturbance torque in the body frame at time `t`.
    ///
    /// `rotation` is the body-to-reference rotation of the current attitude;
    /// fixed-frame amplitudes are mapped through its inverse before summation.
    pub fn torque(&self, t: f64, rotation: &Rotation3<f64>) -> Vector3<f64> {
        let mut total = Vector3::zeros();

        for source in &self.constant {
            if !source.active(t) {
                continue;
            }
            total += into_body(&source.amplitude, source.frame, rotation);
        }

        for source in &self.sinusoidal {
            total += into_body(&source.sample(t), source.frame, rotation);
        }

        total
    }
}

fn into_body(
    amplitude: &Vector3<f64>,
    frame: TorqueFrame,
    rotation: &Rotation3<f64>,
) -> Vector3<f64> {
    match frame {
        TorqueFrame::Rotating => *amplitude,
        TorqueFrame::Fixed => rotation.inverse() * amplitude,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConstantTorqueConfig, SinusoidalTorqueConfig};
    use nalgebra::UnitQuaternion;
    use std::f64::consts::FRAC_PI_2;

    fn windowed_fixed_torque() -> DisturbanceModel {
        DisturbanceModel::new(&DisturbanceConfig {
            enabled: true,
            constant: vec![ConstantTorqueConfig {
                amplitude: [0.0, 0.0, 1.0],
                start: 0.0,
                end: Some(10.0),
                frame: TorqueFrame::Fixed,
            }],
            sinusoidal: vec![],
        })
        .unwrap()
    }

    #[test]
    fn constant_torque_inside_window() {
        let model = windowed_fixed_torque();
        let torque = model.torque(5.0, &Rotation3::identity());
        assert_eq!(torque, Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn constant_torque_outside_window_is_zero() {
        let model = windowed_fixed_torque();
        let torque = model.torque(11.0, &Rotation3::identity());
        assert_eq!(torque, Vector3::zeros());
    }

    #[test]
    fn fixed_frame_torque_rotates_into_body() {
        let model = windowed_fixed_torque();
        // Body rotated 90 deg about x: inertial +z maps to body +y.
        let rotation =
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2).to_rotation_matrix();
        let torque = model.torque(5.0, &rotation);
        assert!((torque - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn open_ended_window_stays_active() {
        let model = DisturbanceModel::new(&DisturbanceConfig {
            enabled: true,
            constant: vec![ConstantTorqueConfig {
                amplitude: [0.1, 0.0, 0.0],
                start: 2.0,
                end: None,
                frame: TorqueFrame::Rotating,
            }],
            sinusoidal: vec![],
        })
        .unwrap();
        assert_eq!(model.torque(1.0, &Rotation3::identity()), Vector3::zeros());
        assert_eq!(
            model.torque(1e6, &Rotation3::identity()),
            Vector3::new(0.1, 0.0, 0.0)
        );
    }

    #[test]
    fn sinusoid_peaks_at_period_boundaries() {
        let model = DisturbanceModel::new(&DisturbanceConfig {
            enabled: true,
            constant: vec![],
            sinusoidal: vec![SinusoidalTorqueConfig {
                amplitude: [0.2, 0.0, 0.0],
                period: [10.0, 0.0, 0.0],
                frame: TorqueFrame::Rotating,
            }],
        })
        .unwrap();
        let at_peak = model.torque(10.0, &Rotation3::identity());
        assert!((at_peak.x - 0.2).abs() < 1e-12);
        let at_quarter = model.torque(2.5, &Rotation3::identity());
        assert!(at_quarter.x.abs() < 1e-12);
    }

    #[test]
    fn nonpositive_period_axis_contributes_zero() {
        let model = DisturbanceModel::new(&DisturbanceConfig {
            enabled: true,
            constant: vec![],
            sinusoidal: vec![SinusoidalTorqueConfig {
                amplitude: [0.2, 0.3, 0.4],
                period: [-1.0, 0.0, 8.0],
                frame: TorqueFrame::Rotating,
            }],
        })
        .unwrap();
        let torque = model.torque(0.0, &Rotation3::identity());
        assert_eq!(torque.x, 0.0);
        assert_eq!(torque.y, 0.0);
        assert!((torque.z - 0.4).abs() < 1e-12);
    }

    #[test]
    fn disabled_config_produces_no_torque() {
        let model = DisturbanceModel::new(&DisturbanceConfig {
            enabled: false,
            constant: vec![ConstantTorqueConfig {
                amplitude: [1.0, 1.0, 1.0],
                start: 0.0,
                end: None,
                frame: TorqueFrame::Rotating,
            }],
            sinusoidal: vec![],
        })
        .unwrap();
        assert_eq!(model.torque(0.0, &Rotation3::identity()), Vector3::zeros());
    }
}
