// Global configuration for the thermal scattering library
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{Result, SabError};
use crate::temperature::TemperatureSettings;

// Global configuration for thermal scattering file paths
pub static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::new()));

/// Global configuration container for thermal scattering data.
///
/// The configuration maps thermal scattering table names (e.g. "c_H_in_H2O",
/// the names a material refers to) to the HDF5 file holding each table, and
/// carries the temperature matching settings applied when tables are loaded.
///
/// A single global instance is exposed via the `CONFIG` static. Most code
/// should obtain a guard with [`Config::global`] rather than locking the mutex
/// directly.
#[derive(Debug, Clone)]
pub struct Config {
    /// Map of table name -> path to its HDF5 file.
    pub thermal_scattering: HashMap<String, String>,
    /// Temperature matching applied to every load.
    pub temperature: TemperatureSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Config {
            thermal_scattering: HashMap::new(),
            temperature: TemperatureSettings::default(),
        }
    }

    /// Set the file path for a thermal scattering table
    pub fn set_thermal_scattering(&mut self, table: &str, path: &str) {
        self.thermal_scattering
            .insert(table.to_string(), path.to_string());
    }

    /// Get the file path for a thermal scattering table
    pub fn get_thermal_scattering(&self, table: &str) -> Option<String> {
        self.thermal_scattering.get(table).cloned()
    }

    /// Set several table paths at once
    pub fn set_thermal_scattering_tables<T>(&mut self, input: T)
    where
        T: IntoThermalScatteringInput,
    {
        input.apply(self);
    }

    pub fn set_temperature_tolerance(&mut self, tolerance: f64) -> Result<()> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(SabError::InvalidConfig(format!(
                "temperature tolerance must be a non-negative number, got {}",
                tolerance
            )));
        }
        self.temperature.tolerance = tolerance;
        Ok(())
    }

    pub fn set_temperature_default(&mut self, temperature: f64) -> Result<()> {
        if !temperature.is_finite() || temperature < 0.0 {
            return Err(SabError::InvalidConfig(format!(
                "default temperature must be a non-negative number, got {}",
                temperature
            )));
        }
        self.temperature.default = temperature;
        Ok(())
    }

    /// Load every available temperature in `[min, max]`; `None` disables the range.
    pub fn set_temperature_range(&mut self, range: Option<(f64, f64)>) -> Result<()> {
        if let Some((min, max)) = range {
            if !(min <= max) {
                return Err(SabError::InvalidConfig(format!(
                    "temperature range [{}, {}] is empty",
                    min, max
                )));
            }
        }
        self.temperature.range = range;
        Ok(())
    }

    /// Clear all table paths and restore default temperature settings
    pub fn clear(&mut self) {
        self.thermal_scattering.clear();
        self.temperature = TemperatureSettings::default();
    }

    /// Get the global configuration instance
    pub fn global() -> std::sync::MutexGuard<'static, Self> {
        CONFIG
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Trait to allow flexible input types for set_thermal_scattering_tables
pub trait IntoThermalScatteringInput {
    fn apply(self, config: &mut Config);
}

impl IntoThermalScatteringInput for HashMap<String, String> {
    fn apply(self, config: &mut Config) {
        config.thermal_scattering.extend(self);
    }
}

impl IntoThermalScatteringInput for Vec<(&str, &str)> {
    fn apply(self, config: &mut Config) {
        for (table, path) in self {
            config.set_thermal_scattering(table, path);
        }
    }
}
