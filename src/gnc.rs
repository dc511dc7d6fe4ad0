use nalgebra::Vector3;

use crate::spacecraft::AttitudeState;

// ---------------------------------------------------------------------------
// PID Controller (single axis)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Pid {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    integral: f64,
    prev_error: f64,
}

impl Pid {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd, integral: 0.0, prev_error: 0.0 }
    }

    pub fn update(&mut self, error: f64, dt: f64) -> f64 {
        self.integral += error * dt;
        // Anti-windup: clamp integral to prevent saturation
        self.integral = self.integral.clamp(-1.0, 1.0);
        let derivative = if dt > 0.0 { (error - self.prev_error) / dt } else { 0.0 };
        self.prev_error = error;
        self.kp * error + self.ki * self.integral + self.kd * derivative
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
    }
}

// ---------------------------------------------------------------------------
// Quaternion-feedback attitude controller (baseline policy)
// ---------------------------------------------------------------------------

/// Three-axis quaternion-feedback regulator with rate damping.
///
/// The attitude error fed to each axis PID is the vector part of the error
/// quaternion, sign-corrected by its scalar part so the controller always
/// takes the short way around.
#[derive(Debug, Clone)]
pub struct AttitudeController {
    axes: [Pid; 3],
    rate_gain: f64,
    max_torque: f64,
}

impl AttitudeController {
    pub fn new(kp: f64, ki: f64, kd: f64, rate_gain: f64, max_torque: f64) -> Self {
        Self {
            axes: [Pid::new(kp, ki, kd), Pid::new(kp, ki, kd), Pid::new(kp, ki, kd)],
            rate_gain,
            max_torque,
        }
    }

    pub fn reset(&mut self) {
        for pid in &mut self.axes {
            pid.reset();
        }
    }

    /// Torque command for the current state, saturated per axis.
    pub fn update(&mut self, state: &AttitudeState, dt: f64) -> Vector3<f64> {
        let qe = state.quaternion_error.quaternion();
        let sign = if qe.w >= 0.0 { 1.0 } else { -1.0 };
        let error = Vector3::new(sign * qe.i, sign * qe.j, sign * qe.k);

        let mut torque = Vector3::new(
            self.axes[0].update(error.x, dt),
            self.axes[1].update(error.y, dt),
            self.axes[2].update(error.z, dt),
        );
        torque -= self.rate_gain * state.angular_velocity;
        torque.map(|c| c.clamp(-self.max_torque, self.max_torque))
    }
}
