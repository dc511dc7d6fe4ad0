use serde::{Deserialize, Serialize};

use crate::storage::EpisodeBuffer;

// ---------------------------------------------------------------------------
// Observation layouts
// ---------------------------------------------------------------------------

/// What the caller sees after each decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationModel {
    /// [q0..q3, w1..w3], 7 values.
    Attitude,
    /// Attitude plus the torque applied at the most recent decision,
    /// 10 values. Zeros when no decision has been taken yet.
    AttitudeTorque,
}

impl ObservationModel {
    pub fn dim(&self) -> usize {
        match self {
            ObservationModel::Attitude => 7,
            ObservationModel::AttitudeTorque => 10,
        }
    }

    /// Assemble the observation from the latest buffer record.
    pub fn observe(&self, buffer: &EpisodeBuffer, n_skipped: usize) -> Vec<f64> {
        let mut obs = Vec::with_capacity(self.dim());

        if let Some(q) = buffer.latest_quaternion() {
            let q = q.quaternion();
            obs.extend_from_slice(&[q.w, q.i, q.j, q.k]);
        } else {
            obs.extend_from_slice(&[1.0, 0.0, 0.0, 0.0]);
        }
        match buffer.latest_angular_velocity() {
            Some(w) => obs.extend_from_slice(&[w.x, w.y, w.z]),
            None => obs.extend_from_slice(&[0.0; 3]),
        }

        if let ObservationModel::AttitudeTorque = self {
            match buffer.applied_torque(n_skipped) {
                Some(u) => obs.extend_from_slice(&[u.x, u.y, u.z]),
                None => obs.extend_from_slice(&[0.0; 3]),
            }
        }

        obs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AttitudeConfig;
    use crate::spacecraft::AttitudeState;
    use nalgebra::Vector3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn buffer() -> (EpisodeBuffer, AttitudeState) {
        let mut rng = StdRng::seed_from_u64(4);
        let state = AttitudeState::initialize(&AttitudeConfig::default(), &mut rng).unwrap();
        let mut buffer = EpisodeBuffer::new();
        buffer.reset(&state);
        (buffer, state)
    }

    #[test]
    fn attitude_layout_is_seven_wide() {
        let (buffer, state) = buffer();
        let obs = ObservationModel::Attitude.observe(&buffer, 0);
        assert_eq!(obs.len(), 7);
        let q = state.current.quaternion();
        assert_eq!(&obs[..4], &[q.w, q.i, q.j, q.k]);
    }

    #[test]
    fn torque_layout_appends_latest_decision() {
        let (mut buffer, state) = buffer();
        let decision = Vector3::new(0.1, -0.2, 0.3);
        buffer.update_records(0.1, false, &state, decision);
        buffer.update_records(0.2, false, &state, Vector3::zeros());

        let obs = ObservationModel::AttitudeTorque.observe(&buffer, 1);
        assert_eq!(obs.len(), 10);
        assert_eq!(&obs[7..], &[0.1, -0.2, 0.3]);
    }

    #[test]
    fn torque_layout_falls_back_to_zeros_at_reset() {
        let (buffer, _) = buffer();
        let obs = ObservationModel::AttitudeTorque.observe(&buffer, 2);
        assert_eq!(&obs[7..], &[0.0, 0.0, 0.0]);
    }
}
