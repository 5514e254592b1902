//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    world: WorldInfo,
    frame: FrameInfo,
    mock: MockInfo,
    topology: TopologyInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct WorldInfo {
    host: String,
    port: u16,
    tick_timeout_s: f64,
    ego_role: String,
}

#[derive(Serialize)]
struct FrameInfo {
    inertial_offset: i64,
    image_offset: i64,
    kinematic_offset: i64,
    dequeue_timeout_ms: u64,
}

#[derive(Serialize)]
struct MockInfo {
    tick_hz: f64,
    with_imu: bool,
    with_camera: bool,
    image_size: String,
}

#[derive(Serialize)]
struct TopologyInfo {
    precision: f64,
    max_walk_steps: usize,
    map_path: String,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &contracts::ScenarioBlueprint, args: &InfoArgs) -> ConfigInfo {
    let sinks = if args.sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                queue_capacity: s.queue_capacity,
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        world: WorldInfo {
            host: blueprint.world.host.clone(),
            port: blueprint.world.port,
            tick_timeout_s: blueprint.world.tick_timeout_s,
            ego_role: blueprint.world.ego_role.clone(),
        },
        frame: FrameInfo {
            inertial_offset: blueprint.frame.offsets.inertial,
            image_offset: blueprint.frame.offsets.image,
            kinematic_offset: blueprint.frame.offsets.kinematic,
            dequeue_timeout_ms: blueprint.frame.dequeue_timeout_ms,
        },
        mock: MockInfo {
            tick_hz: blueprint.mock.tick_hz,
            with_imu: blueprint.mock.with_imu,
            with_camera: blueprint.mock.with_camera,
            image_size: format!(
                "{}x{}",
                blueprint.mock.image_width, blueprint.mock.image_height
            ),
        },
        topology: TopologyInfo {
            precision: blueprint.topology.precision,
            max_walk_steps: blueprint.topology.max_walk_steps,
            map_path: blueprint.topology.map_path.display().to_string(),
        },
        sinks,
    }
}

fn print_config_info(blueprint: &contracts::ScenarioBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                CARLA Viz Configuration                       ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    // World info
    println!("📍 World");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!(
        "   ├─ Simulator: {}:{}",
        blueprint.world.host, blueprint.world.port
    );
    println!("   ├─ Tick timeout: {}s", blueprint.world.tick_timeout_s);
    println!("   └─ Ego role: {}", blueprint.world.ego_role);

    // Frame alignment
    println!("\n⏱  Frame Alignment");
    println!(
        "   ├─ Offsets: inertial={}, image={}, kinematic={}",
        blueprint.frame.offsets.inertial,
        blueprint.frame.offsets.image,
        blueprint.frame.offsets.kinematic
    );
    println!(
        "   └─ Dequeue timeout: {}ms",
        blueprint.frame.dequeue_timeout_ms
    );

    // Mock world
    println!("\n🚗 Mock World");
    println!("   ├─ Tick rate: {} Hz", blueprint.mock.tick_hz);
    println!("   ├─ IMU: {}", blueprint.mock.with_imu);
    println!("   ├─ Camera: {}", blueprint.mock.with_camera);
    println!(
        "   └─ Image size: {}x{}",
        blueprint.mock.image_width, blueprint.mock.image_height
    );

    // Topology
    println!("\n🗺  Topology");
    println!("   ├─ Precision: {}m", blueprint.topology.precision);
    println!("   ├─ Max walk steps: {}", blueprint.topology.max_walk_steps);
    println!("   └─ Map output: {}", blueprint.topology.map_path.display());

    // Sinks
    if !blueprint.sinks.is_empty() {
        println!("\n📤 Sinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let is_last = i == blueprint.sinks.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            if args.sinks {
                println!(
                    "   {} {} ({:?}, queue={})",
                    prefix, sink.name, sink.sink_type, sink.queue_capacity
                );
            } else {
                println!("   {} {} ({:?})", prefix, sink.name, sink.sink_type);
            }
        }
    }

    println!();
}
