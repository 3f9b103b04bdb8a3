//! End-to-end lock-step test: the full adapter stack against a scripted
//! TCP simulator speaking the real wire protocol.

use std::path::PathBuf;

use telesim_client::client::TcpSignalClient;
use telesim_core::config::{ConnectConfig, LaunchConfig, TelesimConfig};
use telesim_core::types::Action;
use telesim_env::SimEnv;
use telesim_test_utils::sim_server::{ScriptedSim, SimScript};

fn attach_config(sim_dir: PathBuf, port: u16) -> TelesimConfig {
    TelesimConfig {
        connect: ConnectConfig {
            port,
            stop_poll_ms: 1,
            stop_timeout_ms: 1000,
            ..ConnectConfig::default()
        },
        launch: LaunchConfig {
            boot: false,
            install_dir: Some(sim_dir),
            ..LaunchConfig::default()
        },
    }
}

#[test]
fn episode_over_the_wire() {
    let mut script = SimScript::default();
    // Tick 1 initializes the scene during construction; it is never pulled.
    script.push_frame(vec![0.0, 0.0], 0.0, false);
    // Tick 2 answers the reset.
    script.push_frame(vec![0.1, -0.1], 0.0, false);
    // Ticks 3 and 4 answer two steps, the second one terminal.
    script.push_frame(vec![0.2, -0.2], 1.0, false);
    script.push_frame(vec![0.3, -0.3], 2.0, true);

    let sim = ScriptedSim::bind(script).unwrap();
    let addr = sim.local_addr().unwrap();
    let recorded = sim.recorded();
    let server = std::thread::spawn(move || sim.serve_one().unwrap());

    let sim_dir = std::env::temp_dir();
    let config = attach_config(sim_dir, addr.port());
    let client = TcpSignalClient::connect(&addr.to_string()).unwrap();
    let mut env = SimEnv::with_client(Box::new(client), &config).unwrap();

    // Calibration arrived unmodified.
    assert_eq!(env.action_space().high(), &[0.5, 0.5]);
    assert_eq!(env.observation_space().low(), &[-1.0, -1.0]);
    assert!((env.dt() - 0.05).abs() < f32::EPSILON);

    let obs = env.reset().unwrap();
    assert_eq!(obs.as_slice(), &[0.1, -0.1]);
    assert!(!env.done());

    let result = env.step(&Action::new(vec![0.2, 0.2])).unwrap();
    assert_eq!(result.observation.as_slice(), &[0.2, -0.2]);
    assert!((result.reward - 1.0).abs() < f32::EPSILON);
    assert!(!result.done);

    // Out-of-bounds action arrives clipped on the simulator side.
    let result = env.step(&Action::new(vec![9.0, -9.0])).unwrap();
    assert!(result.done);
    assert!((result.reward - 2.0).abs() < f32::EPSILON);

    env.close().unwrap();
    server.join().unwrap();

    let recorded = recorded.lock().unwrap();
    // One initialization tick, one reset tick, two step ticks.
    assert_eq!(recorded.triggers, 4);
    // Construction and reset both restart the simulation.
    assert_eq!(recorded.starts, 2);
    // The zeroed reset action, then the two step actions (last one clipped).
    assert_eq!(
        recorded.actions,
        vec![vec![0.0, 0.0], vec![0.2, 0.2], vec![0.5, -0.5]]
    );
}
