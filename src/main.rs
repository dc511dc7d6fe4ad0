use attitude_sim::config::{
    ConstantTorqueConfig, EnvConfig, NormalizeConfig, PropagatorConfig, TorqueFrame,
};
use attitude_sim::gnc::AttitudeController;
use attitude_sim::io::csv;
use attitude_sim::reward::RewardModel;
use attitude_sim::AttitudeEnv;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // -----------------------------------------------------------------------
    // Scenario: rest-to-rest slew against a constant disturbance torque
    // -----------------------------------------------------------------------
    let mut config = EnvConfig {
        propagator: PropagatorConfig {
            control_interval: 0.1,
            time_horizon: 60.0,
            ..PropagatorConfig::default()
        },
        reward_model: RewardModel::Model3,
        normalize: Some(NormalizeConfig::default()),
        ..EnvConfig::default()
    };
    config.disturbances.enabled = true;
    config.disturbances.constant.push(ConstantTorqueConfig {
        amplitude: [0.0, 0.0, 0.001],
        start: 0.0,
        end: Some(20.0),
        frame: TorqueFrame::Fixed,
    });

    let mut env = AttitudeEnv::new(config).expect("valid configuration");
    let initial_obs = env.reset(Some(42)).expect("reachable initial-error band");
    let initial_error = env.state().angular_error;
    let dt = env.control_interval();

    // -----------------------------------------------------------------------
    // Run the closed loop with the quaternion-feedback baseline
    // -----------------------------------------------------------------------
    let mut controller = AttitudeController::new(1.2, 0.01, 0.4, 0.8, 0.5);
    let mut total_reward = 0.0;
    let mut steps = 0usize;
    let mut best_error = initial_error;
    let mut settled_at: Option<f64> = None;

    loop {
        let command = controller.update(env.state(), dt);
        let outcome = env
            .step(&[command.x, command.y, command.z])
            .expect("propagation");

        total_reward += outcome.reward;
        steps += 1;

        let error = env.state().angular_error;
        best_error = best_error.min(error);
        if settled_at.is_none() && error < 0.5 {
            settled_at = Some(env.current_time());
        }

        if outcome.terminated {
            break;
        }
    }

    let final_error = env.state().angular_error;
    let final_rate = env.state().angular_velocity.norm();

    // -----------------------------------------------------------------------
    // Print results
    // -----------------------------------------------------------------------
    println!();
    println!("====================================================================");
    println!("  ATTITUDE CONTROL EPISODE — quaternion-feedback baseline");
    println!("====================================================================");
    println!();
    println!("  Episode");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Initial error: {:>8.2} deg   Observation:  {:>4} values",
        initial_error,
        initial_obs.len()
    );
    println!(
        "  Decisions:     {:>8}       Sim time:     {:>8.1} s",
        steps,
        env.current_time()
    );
    println!();

    println!("  Pointing Performance");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Final error:   {:>8.3} deg   Best error:   {:>8.3} deg",
        final_error, best_error
    );
    println!("  Final rate:    {:>8.4} rad/s", final_rate);
    match settled_at {
        Some(t) => println!("  Settled below 0.5 deg at t={:.1} s", t),
        None => println!("  Never settled below 0.5 deg"),
    }
    println!("  Total reward:  {:>8.2}", total_reward);
    println!();

    // -----------------------------------------------------------------------
    // Trajectory table (sampled) and optional CSV export
    // -----------------------------------------------------------------------
    println!("  Trajectory");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:>7}  {:>10}  {:>10}  {:>10}",
        "t (s)", "err (deg)", "|w| (rad/s)", "|u| (N*m)"
    );
    println!("  {}", "─".repeat(46));

    let buffer = env.buffer();
    let sample_interval = (buffer.len() / 20).max(1);
    for i in 0..buffer.len() {
        if i % sample_interval != 0 && i != buffer.len() - 1 {
            continue;
        }
        println!(
            "  {:>7.1}  {:>10.3}  {:>10.4}  {:>10.4}",
            buffer.times()[i],
            buffer.angular_errors()[i],
            buffer.angular_velocities()[i].norm(),
            buffer.actions()[i].norm(),
        );
    }
    println!();

    if let Some(path) = std::env::args().nth(1) {
        csv::write_history_file(&path, buffer).expect("write episode history");
        println!("  Episode history written to {path}");
        println!();
    }

    println!("====================================================================");
    println!();
}
