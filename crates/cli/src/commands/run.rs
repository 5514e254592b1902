//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    // Load and parse configuration
    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ref host) = args.host {
        info!(host = %host, "Overriding simulator host from CLI");
        blueprint.world.host = host.clone();
    }
    if let Some(port) = args.port {
        info!(port = %port, "Overriding simulator port from CLI");
        blueprint.world.port = port;
    }

    info!(
        host = %blueprint.world.host,
        port = blueprint.world.port,
        ego_role = %blueprint.world.ego_role,
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    // Build pipeline configuration
    let pipeline_config = PipelineConfig {
        blueprint,
        max_frames: if args.max_frames == 0 {
            None
        } else {
            Some(args.max_frames)
        },
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        buffer_size: args.buffer_size,
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    // Create and run pipeline
    let pipeline = Pipeline::new(pipeline_config);

    info!("Starting pipeline...");

    // The pipeline consumes the signal future itself so that a Ctrl+C still
    // runs the ordered shutdown (sensor detach, dispatcher drain).
    match pipeline.run(setup_shutdown_signal()).await {
        Ok(stats) => {
            info!(
                snapshots = stats.snapshots_built,
                duration_secs = stats.duration.as_secs_f64(),
                fps = format!("{:.2}", stats.fps()),
                "Pipeline completed successfully"
            );

            // Print detailed statistics
            stats.print_summary();
        }
        Err(e) => {
            return Err(e).context("Pipeline execution failed");
        }
    }

    info!("CARLA Viz finished");
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::ScenarioBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("World:");
    println!(
        "  Simulator: {}:{}",
        blueprint.world.host, blueprint.world.port
    );
    println!("  Ego role: {}", blueprint.world.ego_role);
    println!("  Tick timeout: {}s", blueprint.world.tick_timeout_s);

    println!("\nFrame alignment:");
    println!(
        "  Offsets: inertial={}, image={}, kinematic={}",
        blueprint.frame.offsets.inertial,
        blueprint.frame.offsets.image,
        blueprint.frame.offsets.kinematic
    );
    println!("  Dequeue timeout: {}ms", blueprint.frame.dequeue_timeout_ms);

    println!("\nTopology:");
    println!("  Map output: {}", blueprint.topology.map_path.display());
    println!("  Precision: {}m", blueprint.topology.precision);

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!();
}
