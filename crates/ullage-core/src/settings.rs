//! Loading ullage tuning from JSON.
//!
//! Missing fields keep their defaults, so a settings file only needs the
//! values it changes:
//!
//! ```json
//! { "stability_power": 0.05, "simulate_ullage": true }
//! ```

use std::io::Read;
use std::path::Path;

use ullage_logic::UllageSettings;

/// Errors that can occur while loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid setting {field}: {value}")]
    Invalid { field: &'static str, value: f64 },
}

/// Parse settings from a JSON string.
pub fn settings_from_str(json: &str) -> Result<UllageSettings, SettingsError> {
    let settings: UllageSettings = serde_json::from_str(json)?;
    validate(&settings)?;
    Ok(settings)
}

/// Parse settings from any reader.
pub fn settings_from_reader<R: Read>(reader: R) -> Result<UllageSettings, SettingsError> {
    let settings: UllageSettings = serde_json::from_reader(reader)?;
    validate(&settings)?;
    Ok(settings)
}

/// Load settings from a file, falling back to defaults if it does not exist.
pub fn load_settings(path: impl AsRef<Path>) -> Result<UllageSettings, SettingsError> {
    let path = path.as_ref();
    match std::fs::File::open(path) {
        Ok(file) => {
            let settings = settings_from_reader(std::io::BufReader::new(file))?;
            log::info!("loaded ullage settings from {}", path.display());
            Ok(settings)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("{} not found, using default ullage settings", path.display());
            Ok(UllageSettings::default())
        }
        Err(e) => Err(e.into()),
    }
}

fn validate(settings: &UllageSettings) -> Result<(), SettingsError> {
    let checks = [
        ("venting_velocity", settings.venting_velocity),
        ("venting_acc_threshold", settings.venting_acc_threshold),
        ("stability_power", settings.stability_power),
    ];
    for (field, value) in checks {
        if !value.is_finite() || value < 0.0 {
            return Err(SettingsError::Invalid { field, value });
        }
    }
    Ok(())
}
