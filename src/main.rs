//! Attention Budget - context-aware attention allocation for UI components

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use attention_budget::bench::BenchmarkRunner;
use attention_budget::core::config::default_config_path;
use attention_budget::{
    AllocationReport, AttentionEngine, EngineConfig, EngineEvent, FileSnapshotStore,
    LearningInsights, Scenario,
};

#[derive(Parser)]
#[command(name = "attention-budget")]
#[command(
    about = "Context-aware attention budget allocation with online learning",
    long_about = None
)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a TOML scenario and print every allocation pass
    Simulate {
        scenario: PathBuf,

        /// Print reports as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Apply newline-delimited JSON events from stdin
    Run {
        /// Seconds between learning snapshot saves
        #[arg(short, long, default_value = "60")]
        autosave: u64,
    },

    /// Show what has been learned so far
    Insights {
        #[arg(short, long, default_value = "5")]
        top: usize,
    },

    /// Show configuration
    Config {
        /// Print the config file location only
        #[arg(long)]
        path: bool,
    },

    /// Run allocation benchmarks
    Bench {
        #[arg(short, long, default_value = "32")]
        components: usize,

        #[arg(short, long, default_value = "1000")]
        iterations: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let config = EngineConfig::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Simulate { scenario, json } => {
            let scenario = Scenario::load(&scenario)?;
            let mut engine = AttentionEngine::new(config);
            let reports = scenario.run(&mut engine)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for report in &reports {
                    print_report(report);
                }
            }
        }

        Commands::Run { autosave } => {
            let store = FileSnapshotStore::new(&config.model_path);
            let mut engine = AttentionEngine::new(config);
            if engine.restore_learning(&store) {
                info!("Loaded learning state from {}", store.path().display());
            }

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            let mut ticker = tokio::time::interval(Duration::from_secs(autosave.max(1)));
            // First tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    line = lines.next_line() => {
                        let Some(line) = line? else { break };
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        let event = match EngineEvent::from_json_line(line) {
                            Ok(event) => event,
                            Err(e) => {
                                warn!("Skipping event: {}", e);
                                continue;
                            }
                        };
                        match event.apply(&mut engine) {
                            Ok(Some(report)) => println!("{}", serde_json::to_string(&report)?),
                            Ok(None) => debug!("Interaction recorded"),
                            Err(e) => warn!("Event failed: {}", e),
                        }
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = engine.persist_learning(&store) {
                            warn!("Autosave failed: {}", e);
                        }
                    }
                }
            }

            engine.persist_learning(&store)?;
            info!("Learning state saved to {}", store.path().display());
        }

        Commands::Insights { top } => {
            let store = FileSnapshotStore::new(&config.model_path);
            let mut engine = AttentionEngine::new(config);
            if !engine.restore_learning(&store) {
                println!("No learning state at {}", store.path().display());
            }
            let insights = LearningInsights::collect(engine.learner(), top);
            println!("{}", serde_json::to_string_pretty(&insights)?);
        }

        Commands::Config { path } => {
            let location = cli.config.unwrap_or_else(default_config_path);
            if path {
                println!("{}", location.display());
            } else {
                println!("# {}", location.display());
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }

        Commands::Bench { components, iterations } => {
            println!(
                "Running benchmarks ({} components, {} iterations)...",
                components, iterations
            );

            let runner = BenchmarkRunner::new(iterations, components);
            for result in runner.run_all() {
                println!("\nBenchmark: {}", result.name);
                println!("  Iterations:  {}", result.iterations);
                println!("  Total:       {} ms", result.total_ms);
                println!("  Avg:         {:.1} us", result.avg_us);
                println!("  Min:         {} us", result.min_us);
                println!("  Max:         {} us", result.max_us);
                println!("  Ops/sec:     {:.0}", result.ops_per_sec);
            }
        }
    }

    Ok(())
}

fn print_report(report: &AllocationReport) {
    println!(
        "Pass {}{}  screen {:.1}/{:.1}  audio {:.1}/{:.1}  cognitive {:.2}/{:.2}",
        report.pass,
        if report.adjusted { " (learned)" } else { "" },
        report.usage.screen,
        report.capacity.screen,
        report.usage.audio,
        report.capacity.audio,
        report.usage.cognitive,
        report.capacity.cognitive,
    );
    for entry in &report.entries {
        println!("  {:<24} {:>8.2}  {}", entry.id.as_str(), entry.score, entry.state);
    }
}
