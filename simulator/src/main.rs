use anyhow::Context;
use clap::Parser;
use generator::random::{build_scenario, GeneratorConfig};
use gui_bridge::bridge::GuiBridge;
use gui_bridge::model::VisualizationModel;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config;
use workflow::runner::{RunResult, Runner};

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Headless Doppler scenario driver")]
struct Args {
    /// Load a scenario from YAML
    #[arg(long, conflicts_with = "random")]
    scenario: Option<PathBuf>,
    /// Generate a random scenario with this many objects
    #[arg(long)]
    random: Option<usize>,
    /// Seed for --random
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long, default_value_t = 1.5)]
    duration: f64,
    #[arg(long, default_value_t = 1.0 / 60.0)]
    frame_dt: f64,
    #[arg(long, default_value_t = 200.0)]
    propagation_speed: f64,
    /// Append a one-line run summary to this file
    #[arg(long, default_value = "tools/data/perception_report.log")]
    report: PathBuf,
    /// Print the final snapshot as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Keep the HTTP bridge alive for incoming scenarios
    #[arg(long, default_value_t = false)]
    serve: bool,
    #[arg(long, default_value_t = gui_bridge::bridge::default_bind_address())]
    bind: SocketAddr,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let scenario = if let Some(path) = &args.scenario {
        config::load(path)?
    } else if let Some(objects) = args.random {
        let mut generator = GeneratorConfig {
            objects,
            seed: args.seed,
            duration_s: args.duration,
            frame_dt_s: args.frame_dt,
            ..Default::default()
        };
        generator.engine.propagation_speed = args.propagation_speed;
        build_scenario(&generator).context("generating random scenario")?
    } else {
        config::from_args(args.duration, args.frame_dt, args.propagation_speed)
    };

    let runner = Arc::new(Runner::new(scenario));
    let gui_bridge = GuiBridge::new(runner.clone());

    let result = runner.run()?;
    print_summary(&result);
    gui_bridge.publish(&VisualizationModel::from(&result))?;

    if args.json {
        let json = result
            .snapshot
            .to_json()
            .context("encoding final snapshot")?;
        println!("{}", json);
    }

    append_report(&args.report, &result)
        .with_context(|| format!("writing report {}", args.report.display()))?;

    if args.serve {
        gui_bridge.serve(args.bind);
        gui_bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}

fn print_summary(result: &RunResult) {
    println!(
        "Run {} -> frames {}, t={:.3}s, wavefronts {} (emitted {}, pruned {})",
        result.name.as_deref().unwrap_or("<unnamed>"),
        result.frames,
        result.snapshot.time,
        result.snapshot.wavefront_count(),
        result.metrics.emitted,
        result.metrics.pruned
    );
    for probe in &result.probes {
        let dominant = probe
            .dominant_hz
            .map(|hz| format!("{:.3} Hz", hz))
            .unwrap_or_else(|| "n/a".into());
        println!(
            "  {} -> {}: mean {:.3} Hz, range {:.3}..{:.3} Hz, dominant {}",
            probe.source, probe.perceiver, probe.mean_hz, probe.min_hz, probe.max_hz, dominant
        );
    }
}

fn append_report(path: &Path, result: &RunResult) -> anyhow::Result<()> {
    let probes: Vec<String> = result
        .probes
        .iter()
        .map(|probe| format!("{}->{}:{:.4}", probe.source, probe.perceiver, probe.mean_hz))
        .collect();
    let report = format!(
        "scenario={} frames={} time={:.4} wavefronts={} emitted={} pruned={} probes={:?}\n",
        result.name.as_deref().unwrap_or("unnamed"),
        result.frames,
        result.snapshot.time,
        result.snapshot.wavefront_count(),
        result.metrics.emitted,
        result.metrics.pruned,
        probes
    );

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(report.as_bytes())?;
    Ok(())
}
