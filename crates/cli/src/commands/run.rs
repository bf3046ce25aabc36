//! `run` command implementation.

use anyhow::{Context, Result};
use collector::{Collector, CollectorConfig};
use contracts::EpisodeSettings;
use tracing::info;

use crate::cli::RunArgs;

/// Execute the `run` command
pub async fn run_collection(args: &RunArgs) -> Result<()> {
    let config = CollectorConfig {
        host: args.host.clone(),
        port: args.port,
        quality: args.quality.into(),
        settings_path: args.settings.clone(),
        output_dir: args.output.clone(),
        max_frames: args.max_frames,
        min_distance: args.min_distance,
        novelty_scope: args.novelty_scope.into(),
        ..Default::default()
    };

    // Settings must be loadable before we touch the network
    let settings = effective_settings(args)?;

    info!(
        host = %config.host,
        port = config.port,
        quality = settings.quality_level.as_str(),
        max_frames = config.max_frames,
        min_distance = config.min_distance,
        output = %config.output_dir.display(),
        "Collection configured"
    );

    if args.dry_run {
        info!("Dry run mode - settings are valid, exiting");
        print_plan(&config, &settings);
        return Ok(());
    }

    #[cfg(feature = "real-carla")]
    let client = sim_client::RealCarlaClient::new();

    #[cfg(not(feature = "real-carla"))]
    let client = {
        info!("Running in MOCK mode (no CARLA server required)");
        sim_client::MockSimulatorClient::synthetic()
    };

    let collector = Collector::new(config, client);

    tokio::select! {
        result = collector.run() => {
            let stats = result.context("Collection run failed")?;
            info!(
                frames = stats.frames_accepted,
                episodes = stats.episodes_started,
                duration_secs = stats.duration.as_secs_f64(),
                "Collection completed"
            );
            stats.print_summary();
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nCancelled by user. Bye!");
        }
    }

    Ok(())
}

/// Resolve the settings the run would submit, validating them up front
fn effective_settings(args: &RunArgs) -> Result<EpisodeSettings> {
    match &args.settings {
        Some(path) => collector::settings::load_settings(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => Ok(collector::settings::build_settings(args.quality.into())),
    }
}

/// Print the collection plan for dry-run mode
fn print_plan(config: &CollectorConfig, settings: &EpisodeSettings) {
    println!("\n=== Collection Plan ===\n");
    println!("Server: {}:{}", config.host, config.port);
    println!("Output: {}", config.output_dir.display());
    println!(
        "Target: {} frames, min distance {:.1} m ({:?} scope)",
        config.max_frames, config.min_distance, config.novelty_scope
    );
    println!(
        "World: {} vehicles, {} pedestrians, weather {} ({})",
        settings.number_of_vehicles,
        settings.number_of_pedestrians,
        settings.weather_id,
        settings.quality_level.as_str()
    );
    println!("\nSensors ({}):", settings.sensor_count());
    for camera in &settings.cameras {
        println!(
            "  - {} ({:?}, {}x{})",
            camera.name, camera.post_processing, camera.image_width, camera.image_height
        );
    }
    for lidar in &settings.lidars {
        println!(
            "  - {} (lidar, {} channels, {:.0} m range)",
            lidar.name, lidar.channels, lidar.range
        );
    }
    println!();
}
