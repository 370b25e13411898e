mod config;
mod scenario;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};

use config::{Path, SimConfig};
use replica::{LinkSimulation, ReplicationConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PathArg {
    Linear,
    Orbit,
}

#[derive(Parser)]
#[command(name = "replica-sim")]
#[command(about = "Replays a replicated entity over a simulated lossy link")]
struct Args {
    #[arg(short, long, help = "Replication config (TOML)")]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = PathArg::Linear)]
    path: PathArg,

    #[arg(long, help = "Override the configured send rate (Hz)")]
    send_rate: Option<u32>,

    #[arg(short, long, default_value_t = 60)]
    frame_rate: u32,

    #[arg(short, long, default_value_t = 10_000, help = "Simulated duration in ms")]
    duration: i64,

    #[arg(long, default_value_t = 40, help = "One-way link latency in ms")]
    latency: u32,

    #[arg(long, default_value_t = 15, help = "Jitter in ms")]
    jitter: u32,

    #[arg(long, default_value_t = 0.0, help = "Packet loss percentage (0-100)")]
    loss_percent: f32,

    #[arg(long, default_value_t = 10.0, help = "Reordered packet percentage (0-100)")]
    reorder_percent: f32,

    #[arg(long, default_value_t = 90, help = "Extra delay for reordered packets in ms")]
    reorder_delay: u32,

    #[arg(long, help = "Disable position and rotation extrapolation")]
    no_extrapolation: bool,

    #[arg(long, default_value_t = 1)]
    seed: u64,

    #[arg(long, help = "Fail when the rendered signal moves backwards")]
    strict: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut replication = match &args.config {
        Some(path) => ReplicationConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ReplicationConfig::default(),
    };
    if let Some(send_rate) = args.send_rate {
        replication.send_rate_hz = send_rate;
    }
    if args.no_extrapolation {
        replication.extrapolate_position = false;
        replication.extrapolate_rotation = false;
    }
    replication.validate()?;

    let config = SimConfig {
        replication,
        link: LinkSimulation {
            loss_percent: args.loss_percent,
            latency_ms: args.latency,
            jitter_ms: args.jitter,
            reorder_percent: args.reorder_percent,
            reorder_delay_ms: args.reorder_delay,
        },
        path: match args.path {
            PathArg::Linear => Path::Linear,
            PathArg::Orbit => Path::Orbit,
        },
        frame_rate: args.frame_rate,
        duration_ms: args.duration,
        rtt_ms: args.latency * 2,
        seed: args.seed,
        ..Default::default()
    };

    log::info!(
        "Simulating {} ms at {} Hz send / {} Hz render, latency {}±{} ms, loss {}%, reorder {}%",
        config.duration_ms,
        config.replication.send_rate_hz,
        config.frame_rate,
        config.link.latency_ms,
        config.link.jitter_ms,
        config.link.loss_percent,
        config.link.reorder_percent
    );

    let report = scenario::run(&config)?;

    log::info!(
        "Snapshots: {} sent, {} accepted, {} stale, {} rejected, {} lost, {} reordered",
        report.snapshots_sent,
        report.accepted,
        report.stale,
        report.rejected,
        report.lost,
        report.reordered
    );
    log::info!(
        "Frames rendered: {}, latency reports: {}",
        report.frames_rendered,
        report.latency_reports
    );
    log::info!(
        "Error vs ground truth: max {:.4}, mean {:.4}; max backward jump {:.5}",
        report.max_error,
        report.mean_error,
        report.max_backward_jump
    );

    if report.has_backward_jump(config.jump_tolerance) {
        if args.strict {
            bail!(
                "rendered signal jumped backwards by {:.5}",
                report.max_backward_jump
            );
        }
        log::warn!(
            "Rendered signal jumped backwards by {:.5}",
            report.max_backward_jump
        );
    }

    Ok(())
}
