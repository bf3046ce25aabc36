//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    settings_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<SettingsSummary>,
}

#[derive(Serialize)]
struct SettingsSummary {
    quality: String,
    vehicles: u32,
    pedestrians: u32,
    cameras: usize,
    lidars: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(settings = %args.settings.display(), "Validating episode settings");

    let result = validate_settings(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Settings validation failed")
    }
}

fn validate_settings(args: &ValidateArgs) -> ValidationResult {
    let settings_path = args.settings.display().to_string();

    if !args.settings.exists() {
        return ValidationResult {
            valid: false,
            settings_path,
            error: Some(format!("File not found: {}", args.settings.display())),
            summary: None,
        };
    }

    match collector::settings::load_settings(&args.settings) {
        Ok(settings) => ValidationResult {
            valid: true,
            settings_path,
            error: None,
            summary: Some(SettingsSummary {
                quality: settings.quality_level.as_str().to_string(),
                vehicles: settings.number_of_vehicles,
                pedestrians: settings.number_of_pedestrians,
                cameras: settings.cameras.len(),
                lidars: settings.lidars.len(),
            }),
        },
        Err(e) => ValidationResult {
            valid: false,
            settings_path,
            error: Some(e.to_string()),
            summary: None,
        },
    }
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Settings are valid: {}", result.settings_path);
        if let Some(ref summary) = result.summary {
            println!("\n  Quality: {}", summary.quality);
            println!("  Vehicles: {}", summary.vehicles);
            println!("  Pedestrians: {}", summary.pedestrians);
            println!("  Cameras: {}", summary.cameras);
            println!("  Lidars: {}", summary.lidars);
        }
    } else {
        println!("✗ Settings are invalid: {}", result.settings_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
