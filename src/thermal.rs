// Thermal scattering S(alpha,beta) tables - built from the HDF5 layout
use ndarray::{Array2, Array3};
use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use crate::error::{Result, SabError};
use crate::temperature::TemperatureSettings;

// Global cache for thermal scattering tables to avoid reloading
static GLOBAL_THERMAL_CACHE: Lazy<Mutex<HashMap<String, Arc<ThermalScattering>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Representation of the inelastic secondary energy distribution, fixed for a whole table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryMode {
    /// Equally likely outgoing energy bins
    Equal,
    /// Skewed outgoing energy bins
    Skewed,
    /// Continuous tabulated outgoing energy distribution
    Continuous,
}

impl SecondaryMode {
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "equal" => Ok(SecondaryMode::Equal),
            "skewed" => Ok(SecondaryMode::Skewed),
            "continuous" => Ok(SecondaryMode::Continuous),
            other => Err(SabError::unrecognized("secondary mode", other)),
        }
    }

    pub fn is_fixed_grid(self) -> bool {
        !matches!(self, SecondaryMode::Continuous)
    }
}

/// How the elastic angular distribution is represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElasticMode {
    /// Incoherent elastic: tabulated cross section with discrete cosines
    Discrete,
    /// Coherent elastic: Bragg edges, angles follow analytically
    Exact,
}

impl ElasticMode {
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "tab1" => Ok(ElasticMode::Discrete),
            "bragg" => Ok(ElasticMode::Exact),
            other => Err(SabError::unrecognized("elastic type", other)),
        }
    }
}

/// Elastic scattering data at one temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct ElasticData {
    pub mode: ElasticMode,
    /// Incoming energies (eV)
    pub energy: Vec<f64>,
    /// Cross section, or cumulative Bragg-edge structure factors for `Exact`
    pub p: Vec<f64>,
    /// Outgoing cosines: rows are angle bins, columns incoming energies.
    /// `None` for `Exact`.
    pub mu: Option<Array2<f64>>,
    /// Largest incoming energy
    pub threshold: f64,
}

impl ElasticData {
    pub fn n_mu(&self) -> usize {
        self.mu.as_ref().map_or(0, |mu| mu.nrows())
    }
}

/// Outgoing energies and cosines for one incoming energy of a continuous table.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousEnergyPoint {
    pub e_out: Vec<f64>,
    pub e_out_pdf: Vec<f64>,
    pub e_out_cdf: Vec<f64>,
    /// Rows are angle bins, columns outgoing energies
    pub mu: Array2<f64>,
}

impl ContinuousEnergyPoint {
    pub fn n_e_out(&self) -> usize {
        self.e_out.len()
    }

    pub fn n_mu(&self) -> usize {
        self.mu.nrows()
    }
}

/// Secondary distribution of inelastic scattering.
///
/// Which variant is present is decided by the table's [`SecondaryMode`].
#[derive(Debug, Clone, PartialEq)]
pub enum InelasticDistribution {
    /// Equal or skewed bins.
    Fixed {
        /// incoming energy x outgoing energy bin
        energy_out: Array2<f64>,
        /// incoming energy x outgoing energy bin x angle bin
        mu: Array3<f64>,
    },
    /// One record per incoming energy
    Continuous(Vec<ContinuousEnergyPoint>),
}

/// Inelastic scattering data at one temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct InelasticData {
    pub energy: Vec<f64>,
    pub sigma: Vec<f64>,
    /// Largest incoming energy
    pub threshold: f64,
    pub distribution: InelasticDistribution,
}

impl InelasticData {
    pub fn energy_out(&self) -> Option<&Array2<f64>> {
        match &self.distribution {
            InelasticDistribution::Fixed { energy_out, .. } => Some(energy_out),
            InelasticDistribution::Continuous(_) => None,
        }
    }

    pub fn mu(&self) -> Option<&Array3<f64>> {
        match &self.distribution {
            InelasticDistribution::Fixed { mu, .. } => Some(mu),
            InelasticDistribution::Continuous(_) => None,
        }
    }

    pub fn continuous(&self) -> Option<&[ContinuousEnergyPoint]> {
        match &self.distribution {
            InelasticDistribution::Fixed { .. } => None,
            InelasticDistribution::Continuous(points) => Some(points),
        }
    }

    /// Number of outgoing energy bins (fixed-grid tables only).
    pub fn n_e_out(&self) -> Option<usize> {
        self.energy_out().map(|e| e.ncols())
    }

    /// Number of angle bins: the third dimension of a fixed-grid table, or the
    /// grid size of the first incoming energy of a continuous one.
    pub fn n_mu(&self) -> Option<usize> {
        match &self.distribution {
            InelasticDistribution::Fixed { mu, .. } => Some(mu.dim().2),
            InelasticDistribution::Continuous(points) => points.first().map(|p| p.n_mu()),
        }
    }
}

/// All scattering data at one material temperature.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ThermalData {
    /// `None` when the table has no elastic data at this temperature
    pub elastic: Option<ElasticData>,
    pub inelastic: Option<InelasticData>,
}

/// A thermal scattering S(alpha,beta) table loaded at one or more temperatures.
///
/// `temperatures`, `kts` and `data` are index aligned; `temperatures` is
/// strictly increasing. The table is built in one pass by
/// [`crate::thermal_hdf5::parse_thermal_scattering`] and not modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalScattering {
    /// Table name (e.g. "c_H_in_H2O")
    pub name: String,
    /// Atomic weight ratio of the scattering nuclide
    pub awr: f64,
    /// Nuclides this table applies to
    pub nuclides: BTreeSet<String>,
    pub secondary_mode: SecondaryMode,
    /// Loaded temperatures (K), integer valued
    pub temperatures: Vec<f64>,
    /// kT (eV) of each loaded temperature as stored
    pub kts: Vec<f64>,
    pub data: Vec<ThermalData>,
}

impl ThermalScattering {
    pub fn has_nuclide(&self, nuclide: &str) -> bool {
        self.nuclides.contains(nuclide)
    }

    /// Index of a loaded temperature, matched on integer kelvin.
    pub fn temperature_index(&self, temperature: f64) -> Option<usize> {
        let kelvin = temperature.round();
        self.temperatures.iter().position(|&t| t == kelvin)
    }

    /// Data at a loaded temperature.
    pub fn data_at(&self, temperature: f64) -> Option<&ThermalData> {
        self.temperature_index(temperature).map(|i| &self.data[i])
    }

    /// Energy above which the table no longer applies: the largest inelastic
    /// threshold over all loaded temperatures.
    pub fn threshold(&self) -> f64 {
        self.data
            .iter()
            .filter_map(|d| d.inelastic.as_ref().map(|i| i.threshold))
            .fold(0.0, f64::max)
    }
}

fn cache_key(
    name: &str,
    source: &str,
    temperatures: &[f64],
    settings: &TemperatureSettings,
) -> String {
    let mut temps: Vec<f64> = temperatures.to_vec();
    temps.sort_by(f64::total_cmp);
    let temps: Vec<String> = temps.iter().map(|t| format!("{}", t)).collect();
    let range = match settings.range {
        Some((min, max)) => format!("{}-{}", min, max),
        None => "none".to_string(),
    };
    format!(
        "{}@{}@{}|tol={}|default={}|range={}",
        name,
        source,
        temps.join(","),
        settings.tolerance,
        settings.default,
        range
    )
}

/// Canonical form of a table path, so that different spellings of the same
/// file share a cache entry. Falls back to the path as given.
pub fn normalized_source(path: &str) -> String {
    match std::fs::canonicalize(path) {
        Ok(canonical) => canonical.to_string_lossy().to_string(),
        Err(_) => path.to_string(),
    }
}

/// Return a cached table, or load it with `load` and cache it.
///
/// The cache key is the table name, its source, the requested temperatures
/// and the temperature settings the load runs with. A failed load leaves the
/// cache untouched.
pub fn load_thermal_scattering_cached<F>(
    name: &str,
    source: &str,
    temperatures: &[f64],
    settings: &TemperatureSettings,
    load: F,
) -> Result<Arc<ThermalScattering>>
where
    F: FnOnce() -> Result<ThermalScattering>,
{
    let key = cache_key(name, source, temperatures, settings);
    {
        let cache = GLOBAL_THERMAL_CACHE
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(table) = cache.get(&key) {
            return Ok(Arc::clone(table));
        }
    }

    // Load outside the lock so other tables can be loaded concurrently
    let table = Arc::new(load()?);

    let mut cache = GLOBAL_THERMAL_CACHE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    Ok(Arc::clone(cache.entry(key).or_insert(table)))
}

/// Clear the global thermal scattering cache
pub fn clear_thermal_cache() {
    match GLOBAL_THERMAL_CACHE.lock() {
        Ok(mut cache) => cache.clear(),
        Err(poisoned) => poisoned.into_inner().clear(),
    }
}

/// Load a table named in the global [`crate::Config`], using its temperature
/// settings, through the cache.
#[cfg(feature = "hdf5")]
pub fn read_thermal_scattering(name: &str, temperatures: &[f64]) -> Result<Arc<ThermalScattering>> {
    let (path, settings) = {
        let config = crate::Config::global();
        let path = config
            .get_thermal_scattering(name)
            .ok_or_else(|| SabError::UnknownTable(name.to_string()))?;
        (path, config.temperature.clone())
    };

    let source = normalized_source(&path);
    load_thermal_scattering_cached(name, &source, temperatures, &settings, || {
        crate::thermal_hdf5::read_thermal_scattering_from_hdf5(&path, temperatures, &settings)
    })
}
