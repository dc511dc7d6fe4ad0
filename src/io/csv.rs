use std::io::{self, Write};

use crate::storage::EpisodeBuffer;

/// Write an episode history to CSV format.
///
/// Columns: time, quat_w..quat_z, qerr_w..qerr_z, ang_err_deg,
///          omega_x..omega_z, torque_x..torque_z
pub fn write_history<W: Write>(writer: &mut W, buffer: &EpisodeBuffer) -> io::Result<()> {
    writeln!(
        writer,
        "time,quat_w,quat_x,quat_y,quat_z,\
         qerr_w,qerr_x,qerr_y,qerr_z,ang_err_deg,\
         omega_x,omega_y,omega_z,torque_x,torque_y,torque_z"
    )?;

    for i in 0..buffer.len() {
        let q = buffer.quaternions()[i].quaternion();
        let qe = buffer.quaternion_errors()[i].quaternion();
        let w = &buffer.angular_velocities()[i];
        let u = &buffer.actions()[i];
        writeln!(
            writer,
            "{:.4},{:.6},{:.6},{:.6},{:.6},\
             {:.6},{:.6},{:.6},{:.6},{:.4},\
             {:.6},{:.6},{:.6},{:.6},{:.6},{:.6}",
            buffer.times()[i],
            q.w, q.i, q.j, q.k,
            qe.w, qe.i, qe.j, qe.k,
            buffer.angular_errors()[i],
            w.x, w.y, w.z,
            u.x, u.y, u.z,
        )?;
    }

    Ok(())
}

/// Write an episode history to a CSV file at the given path.
pub fn write_history_file(path: &str, buffer: &EpisodeBuffer) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_history(&mut file, buffer)
}
