//! Episode settings construction and loading
//!
//! Either builds the standard collection rig (with randomized traffic seeds)
//! or loads an equivalent TOML specification from a file. Loaded settings go
//! through the same parse + validate split either way.

use std::collections::HashSet;
use std::path::Path;

use contracts::{ContractError, EpisodeSettings, QualityLevel};
use rand::Rng;
use tracing::info;

/// Build the default rig for one episode
///
/// Traffic seeds are randomized per episode so restarts do not replay the
/// same traffic.
pub fn build_settings(quality: QualityLevel) -> EpisodeSettings {
    let mut rng = rand::rng();
    EpisodeSettings {
        quality_level: quality,
        seed_vehicles: Some(rng.random()),
        seed_pedestrians: Some(rng.random()),
        ..Default::default()
    }
}

/// Load episode settings from a TOML file
///
/// # Errors
/// - File read failure
/// - Parse failure
/// - Validation failure
pub fn load_settings(path: &Path) -> Result<EpisodeSettings, ContractError> {
    let content = std::fs::read_to_string(path)?;
    let settings = parse_settings(&content)?;
    validate_settings(&settings)?;
    info!(path = %path.display(), sensors = settings.sensor_count(), "episode settings loaded");
    Ok(settings)
}

fn parse_settings(content: &str) -> Result<EpisodeSettings, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::settings_parse(e.to_string()))
}

/// Validate a settings specification
///
/// Returns the first error encountered, or Ok(()).
pub fn validate_settings(settings: &EpisodeSettings) -> Result<(), ContractError> {
    validate_sensor_names(settings)?;
    validate_cameras(settings)?;
    validate_lidars(settings)?;
    Ok(())
}

fn validate_sensor_names(settings: &EpisodeSettings) -> Result<(), ContractError> {
    if settings.sensor_count() == 0 {
        return Err(ContractError::settings_validation(
            "sensors",
            "at least one camera or lidar is required",
        ));
    }

    let mut seen = HashSet::new();
    for name in settings.sensor_names() {
        if name.is_empty() {
            return Err(ContractError::settings_validation(
                "sensors",
                "sensor name must not be empty",
            ));
        }
        if !seen.insert(name) {
            return Err(ContractError::settings_validation(
                format!("sensors[name={name}]"),
                "duplicate sensor name",
            ));
        }
    }
    Ok(())
}

fn validate_cameras(settings: &EpisodeSettings) -> Result<(), ContractError> {
    for camera in &settings.cameras {
        if camera.image_width == 0 || camera.image_height == 0 {
            return Err(ContractError::settings_validation(
                format!("cameras[name={}]", camera.name),
                "image dimensions must be nonzero",
            ));
        }
    }
    Ok(())
}

fn validate_lidars(settings: &EpisodeSettings) -> Result<(), ContractError> {
    for lidar in &settings.lidars {
        if lidar.channels == 0 {
            return Err(ContractError::settings_validation(
                format!("lidars[name={}]", lidar.name),
                "channels must be > 0",
            ));
        }
        if lidar.range <= 0.0 {
            return Err(ContractError::settings_validation(
                format!("lidars[name={}]", lidar.name),
                "range must be > 0",
            ));
        }
        if lidar.rotation_frequency <= 0.0 {
            return Err(ContractError::settings_validation(
                format!("lidars[name={}]", lidar.name),
                "rotation_frequency must be > 0",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{CameraSettings, PostProcessing};

    #[test]
    fn built_settings_carry_quality_and_seeds() {
        let settings = build_settings(QualityLevel::Low);
        assert_eq!(settings.quality_level, QualityLevel::Low);
        assert!(settings.seed_vehicles.is_some());
        assert!(settings.seed_pedestrians.is_some());
        validate_settings(&settings).unwrap();
    }

    #[test]
    fn duplicate_sensor_name_rejected() {
        let mut settings = EpisodeSettings::default();
        settings.cameras.push(CameraSettings {
            name: "CameraRGB".into(),
            post_processing: PostProcessing::SceneFinal,
            image_width: 640,
            image_height: 480,
            transform: Default::default(),
        });
        let err = validate_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn empty_rig_rejected() {
        let settings = EpisodeSettings {
            cameras: vec![],
            lidars: vec![],
            ..Default::default()
        };
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn zero_image_dims_rejected() {
        let mut settings = EpisodeSettings::default();
        settings.cameras[0].image_width = 0;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn parse_failure_reported() {
        let err = parse_settings("not [valid toml").unwrap_err();
        assert!(matches!(err, ContractError::SettingsParse { .. }));
    }
}
