use nalgebra::{UnitQuaternion, Vector3};

use crate::spacecraft::AttitudeState;

// ---------------------------------------------------------------------------
// Per-episode history: one record per sub-step, parallel columns
// ---------------------------------------------------------------------------

/// Records the full trajectory of an episode. `reset` seeds one record at
/// t = 0 with a zero action, so after N steps each column holds N + 1 rows.
#[derive(Debug, Clone, Default)]
pub struct EpisodeBuffer {
    times: Vec<f64>,
    quaternions: Vec<UnitQuaternion<f64>>,
    quaternion_errors: Vec<UnitQuaternion<f64>>,
    angular_errors: Vec<f64>,
    angular_velocities: Vec<Vector3<f64>>,
    actions: Vec<Vector3<f64>>,
    is_last_step: bool,
}

impl EpisodeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all history and record the initial state with a zero action.
    pub fn reset(&mut self, state: &AttitudeState) {
        self.times.clear();
        self.quaternions.clear();
        self.quaternion_errors.clear();
        self.angular_errors.clear();
        self.angular_velocities.clear();
        self.actions.clear();
        self.is_last_step = false;
        self.update_records(0.0, false, state, Vector3::zeros());
    }

    /// Append one record after a sub-step (or the seed record at reset).
    pub fn update_records(
        &mut self,
        time: f64,
        is_last_step: bool,
        state: &AttitudeState,
        action: Vector3<f64>,
    ) {
        self.times.push(time);
        self.quaternions.push(state.current);
        self.quaternion_errors.push(state.quaternion_error);
        self.angular_errors.push(state.angular_error);
        self.angular_velocities.push(state.angular_velocity);
        self.actions.push(action);
        self.is_last_step = is_last_step;
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn is_last_step(&self) -> bool {
        self.is_last_step
    }

    // --- latest-record accessors -------------------------------------------

    pub fn latest_time(&self) -> f64 {
        self.times.last().copied().unwrap_or(0.0)
    }

    pub fn latest_quaternion(&self) -> Option<&UnitQuaternion<f64>> {
        self.quaternions.last()
    }

    pub fn latest_quaternion_error(&self) -> Option<&UnitQuaternion<f64>> {
        self.quaternion_errors.last()
    }

    pub fn latest_angular_error(&self) -> Option<f64> {
        self.angular_errors.last().copied()
    }

    /// Angular error one decision boundary earlier: with N skipped frames the
    /// previous decision sits `n_skipped + 1` records back.
    pub fn previous_angular_error(&self, n_skipped: usize) -> Option<f64> {
        let back = n_skipped + 1;
        self.angular_errors
            .len()
            .checked_sub(back + 1)
            .map(|i| self.angular_errors[i])
    }

    pub fn latest_angular_velocity(&self) -> Option<&Vector3<f64>> {
        self.angular_velocities.last()
    }

    pub fn latest_action(&self) -> Option<&Vector3<f64>> {
        self.actions.last()
    }

    // --- action lookback at decision boundaries ----------------------------

    /// Action recorded `steps_back` records before the latest one.
    pub fn action_lookback(&self, steps_back: usize) -> Option<&Vector3<f64>> {
        self.actions
            .len()
            .checked_sub(steps_back + 1)
            .map(|i| &self.actions[i])
    }

    /// Torque applied at the most recent decision. With frame skipping the
    /// zero-action filler records sit on top of it.
    pub fn applied_torque(&self, n_skipped: usize) -> Option<&Vector3<f64>> {
        self.action_lookback(n_skipped)
    }

    /// Torque applied at the decision before the most recent one.
    pub fn previous_applied_torque(&self, n_skipped: usize) -> Option<&Vector3<f64>> {
        self.action_lookback(2 * n_skipped + 1)
    }

    /// Last `count` recorded actions, oldest first; None when the history is
    /// still shorter than `count`.
    pub fn recent_actions(&self, count: usize) -> Option<&[Vector3<f64>]> {
        if self.actions.len() < count {
            return None;
        }
        Some(&self.actions[self.actions.len() - count..])
    }

    /// Up to `count` most recent actions, oldest first, however few exist.
    pub fn recent_actions_window(&self, count: usize) -> &[Vector3<f64>] {
        let start = self.actions.len().saturating_sub(count);
        &self.actions[start..]
    }

    // --- full-column views for export --------------------------------------

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn quaternions(&self) -> &[UnitQuaternion<f64>] {
        &self.quaternions
    }

    pub fn quaternion_errors(&self) -> &[UnitQuaternion<f64>] {
        &self.quaternion_errors
    }

    pub fn angular_errors(&self) -> &[f64] {
        &self.angular_errors
    }

    pub fn angular_velocities(&self) -> &[Vector3<f64>] {
        &self.angular_velocities
    }

    pub fn actions(&self) -> &[Vector3<f64>] {
        &self.actions
    }
}
