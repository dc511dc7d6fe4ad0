pub mod disturbance;

pub use disturbance::DisturbanceModel;

use nalgebra::{Quaternion, Rotation3, SVector, UnitQuaternion, Vector3};

use crate::spacecraft::InertiaTensor;

/// Propagation state: [q0, q1, q2, q3, w1, w2, w3], scalar-first quaternion.
pub type StateVector = SVector<f64, 7>;

// ---------------------------------------------------------------------------
// Rotational equations of motion
// ---------------------------------------------------------------------------

/// Compute the full state derivative.
///
/// Quaternion kinematics: dq/dt = 0.5 * q (x) (0, w)
/// Euler's equation:      dw/dt = I^-1 * (u + d - w x (I*w))
///
/// where d is the disturbance torque evaluated at (t, current attitude).
/// Pure function of its arguments.
pub fn derivative(
    t: f64,
    x: &StateVector,
    torque: &Vector3<f64>,
    disturbances: &DisturbanceModel,
    inertia: &InertiaTensor,
) -> StateVector {
    let q = Quaternion::new(x[0], x[1], x[2], x[3]);
    let w = Vector3::new(x[4], x[5], x[6]);

    let d = disturbances.torque(t, &rotation_of(x));

    let dq = q * Quaternion::new(0.0, w.x, w.y, w.z) * 0.5;
    let dw = inertia.solve(&(torque + d - w.cross(&inertia.momentum(&w))));

    StateVector::from_column_slice(&[dq.w, dq.i, dq.j, dq.k, dw.x, dw.y, dw.z])
}

/// Body-to-reference rotation of the (possibly drifted) state quaternion.
/// A degenerate zero-norm quaternion maps to the identity rotation.
pub fn rotation_of(x: &StateVector) -> Rotation3<f64> {
    let q = Quaternion::new(x[0], x[1], x[2], x[3]);
    if q.norm() < 1e-12 {
        return Rotation3::identity();
    }
    UnitQuaternion::new_normalize(q).to_rotation_matrix()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_inertia() -> InertiaTensor {
        InertiaTensor::new([1.0, 1.0, 1.0], [0.0, 0.0, 0.0]).unwrap()
    }

    fn rest_state() -> StateVector {
        StateVector::from_column_slice(&[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])
    }

    #[test]
    fn equilibrium_has_zero_derivative() {
        let dx = derivative(
            0.0,
            &rest_state(),
            &Vector3::zeros(),
            &DisturbanceModel::none(),
            &identity_inertia(),
        );
        assert!(dx.norm() < 1e-15, "rest state should not evolve");
    }

    #[test]
    fn torque_produces_angular_acceleration() {
        let dx = derivative(
            0.0,
            &rest_state(),
            &Vector3::new(0.0, 0.0, 0.2),
            &DisturbanceModel::none(),
            &identity_inertia(),
        );
        // With identity inertia, dw/dt equals the applied torque.
        assert!((dx[6] - 0.2).abs() < 1e-12);
        assert!(dx[4].abs() < 1e-12 && dx[5].abs() < 1e-12);
    }

    #[test]
    fn quaternion_rate_matches_half_product() {
        let x = StateVector::from_column_slice(&[1.0, 0.0, 0.0, 0.0, 0.3, -0.1, 0.2]);
        let dx = derivative(
            0.0,
            &x,
            &Vector3::zeros(),
            &DisturbanceModel::none(),
            &identity_inertia(),
        );
        // dq/dt = 0.5 * q (x) (0, w); for q = identity this is (0, w/2).
        assert!(dx[0].abs() < 1e-12);
        assert!((dx[1] - 0.15).abs() < 1e-12);
        assert!((dx[2] + 0.05).abs() < 1e-12);
        assert!((dx[3] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn gyroscopic_coupling_appears_off_principal_spin() {
        let inertia = InertiaTensor::new([2.0, 1.0, 1.0], [0.0, 0.0, 0.0]).unwrap();
        let x = StateVector::from_column_slice(&[1.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.0]);
        let dx = derivative(
            0.0,
            &x,
            &Vector3::zeros(),
            &DisturbanceModel::none(),
            &inertia,
        );
        // w x (I*w) = (0.5, 0.5, 0) x (1.0, 0.5, 0) = (0, 0, -0.25)
        assert!((dx[6] - 0.25).abs() < 1e-12);
    }
}
