//! Telesim CLI.
//!
//! Provides two modes of operation:
//! - `run`: Boot or attach to a simulator, roll N random-policy episodes,
//!   and print statistics
//! - `info`: Print workspace crate versions and the default endpoint

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use telesim_core::config::{ConnectConfig, LaunchConfig, TelesimConfig};
use telesim_env::{EnvError, SimEnv};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Remote-simulator environment adapter.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Roll random-policy episodes against a simulator scene.
    Run {
        /// Scene file handed to the simulator.
        #[arg(short, long)]
        scene: Option<PathBuf>,

        /// Number of episodes to run.
        #[arg(short = 'n', long, default_value_t = 1)]
        episodes: u32,

        /// Maximum steps per episode.
        #[arg(short, long, default_value_t = 200)]
        max_steps: u32,

        /// Attach to an already-running simulator instead of booting one.
        #[arg(long)]
        attach: bool,

        /// Let the simulator render to screen.
        #[arg(long)]
        render: bool,

        /// Remote-API host.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Remote-API port.
        #[arg(short, long, default_value_t = 19997)]
        port: u16,

        /// Simulator install directory (platform default when omitted).
        #[arg(long)]
        install_dir: Option<PathBuf>,

        /// Collect recordings into this directory after each episode.
        #[arg(long)]
        record: Option<PathBuf>,

        /// Collapse recordings to a single fixed file, overwritten each run.
        #[arg(long, requires = "record")]
        overwrite_recording: bool,
    },

    /// Print crate information.
    Info,
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments, clippy::fn_params_excessive_bools)]
fn run(
    scene: Option<PathBuf>,
    episodes: u32,
    max_steps: u32,
    attach: bool,
    render: bool,
    host: String,
    port: u16,
    install_dir: Option<PathBuf>,
    record: Option<PathBuf>,
    overwrite_recording: bool,
) {
    let config = TelesimConfig {
        connect: ConnectConfig {
            host,
            port,
            ..ConnectConfig::default()
        },
        launch: LaunchConfig {
            scene: scene.unwrap_or_default(),
            render,
            boot: !attach,
            install_dir,
        },
    };

    let mut env = SimEnv::open(&config).unwrap_or_else(|e| fail(&e));
    println!(
        "scene ready: obs_dim={}, act_dim={}, dt={:.4}s",
        env.observation_space().len(),
        env.action_space().len(),
        env.dt()
    );

    if let Some(save_dir) = record {
        env.monitor(save_dir, overwrite_recording)
            .unwrap_or_else(|e| fail(&e));
    }

    let mut rng = rand::thread_rng();
    let mut total_steps: u64 = 0;

    for ep in 0..episodes {
        env.reset().unwrap_or_else(|e| fail(&e));
        let mut episode_reward = 0.0_f32;
        let mut steps = 0_u32;

        for _ in 0..max_steps {
            let action = env.action_space().sample(&mut rng);
            let result = env.step(&action).unwrap_or_else(|e| fail(&e));
            episode_reward += result.reward;
            steps += 1;
            if result.done {
                break;
            }
        }

        total_steps += u64::from(steps);
        println!("episode {}: steps={steps}, reward={episode_reward:.3}", ep + 1);
    }

    env.close().unwrap_or_else(|e| fail(&e));
    println!("\ntotal: episodes={episodes}, steps={total_steps}");
}

fn run_info() {
    println!("telesim v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("crates:");
    println!("  telesim-core   {}", env!("CARGO_PKG_VERSION"));
    println!("  telesim-client {}", env!("CARGO_PKG_VERSION"));
    println!("  telesim-env    {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!(
        "default endpoint: {}",
        ConnectConfig::default().endpoint()
    );
    println!("edition: 2024");
}

fn fail(e: &EnvError) -> ! {
    eprintln!("error: {e}");
    std::process::exit(1);
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            scene,
            episodes,
            max_steps,
            attach,
            render,
            host,
            port,
            install_dir,
            record,
            overwrite_recording,
        } => run(
            scene,
            episodes,
            max_steps,
            attach,
            render,
            host,
            port,
            install_dir,
            record,
            overwrite_recording,
        ),
        Commands::Info => run_info(),
    }
}
