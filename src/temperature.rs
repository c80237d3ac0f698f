// Selection of the temperatures to load from a thermal scattering table.
//
// Libraries store each table at a handful of irregularly spaced temperatures.
// A requested temperature is served by the nearest stored one, but only when
// it lies strictly within the tolerance; no interpolation between stored
// temperatures is attempted.

use crate::constants::{DEFAULT_TEMPERATURE, DEFAULT_TEMPERATURE_TOLERANCE, K_BOLTZMANN, KTS_GROUP};
use crate::error::{Result, SabError};
use crate::store::{Dataset, Group};

/// How requested temperatures are matched against the stored ones.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureSettings {
    /// Maximum distance (K) between a requested and a stored temperature.
    pub tolerance: f64,
    /// Temperature (K) used when the caller requests none.
    pub default: f64,
    /// When set, every stored temperature in `[min, max]` is loaded as well.
    pub range: Option<(f64, f64)>,
}

impl Default for TemperatureSettings {
    fn default() -> Self {
        TemperatureSettings {
            tolerance: DEFAULT_TEMPERATURE_TOLERANCE,
            default: DEFAULT_TEMPERATURE,
            range: None,
        }
    }
}

impl TemperatureSettings {
    pub fn with_tolerance(tolerance: f64) -> Self {
        TemperatureSettings {
            tolerance,
            ..Default::default()
        }
    }
}

/// A temperature stored in the `kTs` group.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailableTemperature {
    /// Temperature in kelvin, converted from kT.
    pub kelvin: f64,
    /// Name of the kT dataset, which is also the name of the temperature group (e.g. "294K").
    pub key: String,
}

/// List the temperatures stored under the table's `kTs` group, sorted ascending.
pub fn available_temperatures<G: Group>(table: &G) -> Result<Vec<AvailableTemperature>> {
    let kts_group = table.open_group(KTS_GROUP)?;
    let mut available = Vec::new();
    for key in kts_group.dataset_names()? {
        let kt = kts_group.open_dataset(&key)?.read_scalar()?;
        available.push(AvailableTemperature {
            kelvin: kt / K_BOLTZMANN,
            key,
        });
    }
    available.sort_by(|a, b| a.kelvin.total_cmp(&b.kelvin));
    Ok(available)
}

/// Resolve requested temperatures against the stored ones.
///
/// Each requested temperature is matched with the nearest available one (the
/// lower one on a tie) and accepted, rounded to integer kelvin, only if the
/// distance is strictly less than `tolerance`. The result is sorted ascending
/// and holds each integer-kelvin temperature once.
pub fn resolve_temperatures(
    table: &str,
    requested: &[f64],
    available: &[f64],
    tolerance: f64,
) -> Result<Vec<f64>> {
    let mut sorted = available.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut resolved: Vec<f64> = Vec::with_capacity(requested.len());
    for &desired in requested {
        let closest = sorted
            .iter()
            .copied()
            .fold(None, |best: Option<f64>, t| match best {
                Some(b) if (b - desired).abs() <= (t - desired).abs() => Some(b),
                _ => Some(t),
            });

        match closest {
            Some(actual) if (actual - desired).abs() < tolerance => {
                let kelvin = actual.round();
                if !resolved.contains(&kelvin) {
                    resolved.push(kelvin);
                }
            }
            _ => {
                return Err(SabError::TemperatureUnavailable {
                    table: table.to_string(),
                    temperature: desired,
                })
            }
        }
    }

    resolved.sort_by(f64::total_cmp);
    Ok(resolved)
}

/// Stored temperatures inside `[min, max]`, rounded to integer kelvin.
pub fn temperatures_in_range(available: &[f64], min: f64, max: f64) -> Vec<f64> {
    let mut selected: Vec<f64> = available
        .iter()
        .filter(|&&t| t >= min && t <= max)
        .map(|t| t.round())
        .collect();
    selected.sort_by(f64::total_cmp);
    selected.dedup();
    selected
}

/// Full selection used by the loader: the requested temperatures (or the
/// default when none are requested) plus any range selection.
pub fn select_temperatures(
    table: &str,
    requested: &[f64],
    available: &[f64],
    settings: &TemperatureSettings,
) -> Result<Vec<f64>> {
    let defaulted = [settings.default];
    let requested = if requested.is_empty() && settings.range.is_none() {
        &defaulted[..]
    } else {
        requested
    };

    let mut selected = resolve_temperatures(table, requested, available, settings.tolerance)?;
    if let Some((min, max)) = settings.range {
        selected.extend(temperatures_in_range(available, min, max));
        selected.sort_by(f64::total_cmp);
        selected.dedup();
        // A table with no temperatures is never returned
        if selected.is_empty() {
            return Err(SabError::TemperatureUnavailable {
                table: table.to_string(),
                temperature: min,
            });
        }
    }
    Ok(selected)
}
