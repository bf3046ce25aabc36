//! `info` command implementation.

use anyhow::{Context, Result};

use crate::cli::InfoArgs;

/// Execute the `info` command: show the effective episode settings
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let settings = match &args.settings {
        Some(path) => collector::settings::load_settings(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => contracts::EpisodeSettings::default(),
    };

    if args.json {
        let json =
            serde_json::to_string_pretty(&settings).context("Failed to serialize settings")?;
        println!("{}", json);
        return Ok(());
    }

    println!("\n=== Episode Settings ===\n");
    println!("Quality: {}", settings.quality_level.as_str());
    println!("Synchronous mode: {}", settings.synchronous_mode);
    println!("Vehicles: {}", settings.number_of_vehicles);
    println!("Pedestrians: {}", settings.number_of_pedestrians);
    println!("Weather: {}", settings.weather_id);

    println!("\nCameras ({}):", settings.cameras.len());
    for camera in &settings.cameras {
        let mount = camera.transform.location;
        println!(
            "  - {} ({:?}, {}x{}) at ({:.2}, {:.2}, {:.2})",
            camera.name,
            camera.post_processing,
            camera.image_width,
            camera.image_height,
            mount.x,
            mount.y,
            mount.z
        );
    }

    println!("\nLidars ({}):", settings.lidars.len());
    for lidar in &settings.lidars {
        let mount = lidar.transform.location;
        println!(
            "  - {} ({} ch, {:.0} m, {} pts/s, {:.0} Hz, fov {:.1}..{:.1}) at ({:.2}, {:.2}, {:.2})",
            lidar.name,
            lidar.channels,
            lidar.range,
            lidar.points_per_second,
            lidar.rotation_frequency,
            lidar.lower_fov,
            lidar.upper_fov,
            mount.x,
            mount.y,
            mount.z
        );
    }
    println!();

    Ok(())
}
