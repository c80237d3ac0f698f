// Reading functions for thermal scattering S(alpha,beta) data
// Matches OpenMC's thermal scattering HDF5 layout

use ndarray::Array2;
use std::collections::BTreeSet;
#[cfg(feature = "hdf5")]
use std::path::Path;

use crate::constants::{
    ATTR_AWR, ATTR_NUCLIDES, ATTR_SECONDARY_MODE, ATTR_TYPE, ELASTIC_GROUP, ENERGY_OUT_DATASET,
    INELASTIC_GROUP, KTS_GROUP, MU_OUT_DATASET, XS_DATASET,
};
use crate::error::{Result, SabError};
use crate::secondary_correlated::read_correlated_distribution;
use crate::store::{Dataset, Group};
use crate::temperature::{available_temperatures, select_temperatures, TemperatureSettings};
use crate::thermal::{
    ElasticData, ElasticMode, InelasticData, InelasticDistribution, SecondaryMode, ThermalData,
    ThermalScattering,
};
use crate::thermal_correlated::convert_correlated;

/// Read a thermal scattering table from an HDF5 file.
///
/// The table is the first group in the file (e.g. "c_H_in_H2O").
#[cfg(feature = "hdf5")]
pub fn read_thermal_scattering_from_hdf5<P: AsRef<Path>>(
    path: P,
    temperatures: &[f64],
    settings: &TemperatureSettings,
) -> Result<ThermalScattering> {
    let file = hdf5::File::open(path.as_ref())?;

    let table_names: Vec<String> = file.member_names()?;
    let Some(table_name) = table_names.first() else {
        return Err(SabError::MissingData(format!(
            "no table groups found in {}",
            path.as_ref().display()
        )));
    };

    log::debug!("reading {} from {}", table_name, path.as_ref().display());
    let group = file.group(table_name)?;
    parse_thermal_scattering_group(&group, temperatures, settings)
}

/// Locate the table `name` under `root` and load it.
pub fn parse_thermal_scattering<G: Group>(
    root: &G,
    name: &str,
    temperatures: &[f64],
    settings: &TemperatureSettings,
) -> Result<ThermalScattering> {
    let group = root.open_group(name)?;
    parse_thermal_scattering_group(&group, temperatures, settings)
}

/// Load a table from its group.
///
/// Either every resolved temperature is loaded or an error is returned; no
/// partially filled table escapes.
pub fn parse_thermal_scattering_group<G: Group>(
    group: &G,
    temperatures: &[f64],
    settings: &TemperatureSettings,
) -> Result<ThermalScattering> {
    // Get rid of the leading '/'
    let full_name = group.name();
    let name = full_name.trim_start_matches('/').to_string();

    let awr = group.attr_f64(ATTR_AWR)?;
    if !(awr > 0.0) {
        return Err(SabError::unrecognized("atomic weight ratio", awr.to_string()));
    }
    let nuclides: BTreeSet<String> = group.attr_strings(ATTR_NUCLIDES)?.into_iter().collect();
    let secondary_mode = SecondaryMode::from_tag(&group.attr_string(ATTR_SECONDARY_MODE)?)?;

    let available = available_temperatures(group)?;
    let available_kelvin: Vec<f64> = available.iter().map(|t| t.kelvin).collect();
    let selected = select_temperatures(&name, temperatures, &available_kelvin, settings)?;

    log::debug!(
        "{}: available {:?} K, loading {:?} K ({:?} secondary mode)",
        name,
        available_kelvin,
        selected,
        secondary_mode
    );

    let kts_group = group.open_group(KTS_GROUP)?;
    let mut kts = Vec::with_capacity(selected.len());
    let mut data = Vec::with_capacity(selected.len());

    for &kelvin in &selected {
        let key = available
            .iter()
            .find(|t| t.kelvin.round() == kelvin)
            .map(|t| t.key.as_str())
            .ok_or_else(|| SabError::TemperatureUnavailable {
                table: name.clone(),
                temperature: kelvin,
            })?;

        // Exact kT as stored
        kts.push(kts_group.open_dataset(key)?.read_scalar()?);

        let t_group = group.open_group(key)?;
        data.push(parse_temperature(&t_group, &name, key, secondary_mode)?);
    }

    Ok(ThermalScattering {
        name,
        awr,
        nuclides,
        secondary_mode,
        temperatures: selected,
        kts,
        data,
    })
}

fn parse_temperature<G: Group>(
    t_group: &G,
    table: &str,
    key: &str,
    mode: SecondaryMode,
) -> Result<ThermalData> {
    let elastic = parse_elastic(t_group)?;
    if elastic.is_none() {
        log::warn!("{}: no elastic data at {}", table, key);
    }

    let inelastic = if t_group.exists(INELASTIC_GROUP) {
        let inelastic_group = t_group.open_group(INELASTIC_GROUP)?;
        Some(parse_inelastic(&inelastic_group, table, mode)?)
    } else {
        log::warn!("{}: no inelastic data at {}", table, key);
        None
    };

    Ok(ThermalData { elastic, inelastic })
}

/// Read a cross section table of shape (2, N): row 0 incoming energy, row 1 value.
fn read_xs_table<D: Dataset>(dataset: &D) -> Result<(Vec<f64>, Vec<f64>)> {
    let shape = dataset.shape();
    if shape.len() != 2 || shape[0] != 2 {
        return Err(SabError::ShapeMismatch(format!(
            "'{}' must have shape (2, N), found {:?}",
            dataset.name(),
            shape
        )));
    }
    if shape[1] == 0 {
        return Err(SabError::ShapeMismatch(format!(
            "'{}' holds no energies",
            dataset.name()
        )));
    }
    let table = dataset.read_2d()?;
    Ok((table.row(0).to_vec(), table.row(1).to_vec()))
}

fn last_energy(energy: &[f64]) -> f64 {
    // read_xs_table guarantees at least one point
    energy.last().copied().unwrap_or(0.0)
}

/// Read the elastic data of one temperature group, if present.
pub fn parse_elastic<G: Group>(t_group: &G) -> Result<Option<ElasticData>> {
    if !t_group.exists(ELASTIC_GROUP) {
        return Ok(None);
    }
    let elastic_group = t_group.open_group(ELASTIC_GROUP)?;

    let (energy, p, mode) = {
        let xs = elastic_group.open_dataset(XS_DATASET)?;
        let (energy, p) = read_xs_table(&xs)?;
        let mode = ElasticMode::from_tag(&xs.attr_string(ATTR_TYPE)?)?;
        (energy, p, mode)
    };
    let threshold = last_energy(&energy);

    // Angles of coherent elastic scattering follow from the Bragg edges
    let mu = if mode != ElasticMode::Exact {
        let mu_ds = elastic_group.open_dataset(MU_OUT_DATASET)?;
        let mu_out = mu_ds.read_2d()?;
        if mu_out.nrows() != energy.len() {
            return Err(SabError::ShapeMismatch(format!(
                "'{}' has {} incoming energies, cross section has {}",
                mu_ds.name(),
                mu_out.nrows(),
                energy.len()
            )));
        }
        // Stored per incoming energy; keep angle bins as rows
        let transposed = mu_out.reversed_axes();
        let mu = transposed.as_standard_layout().into_owned();
        Some(mu)
    } else {
        None
    };

    Ok(Some(ElasticData {
        mode,
        energy,
        p,
        mu,
        threshold,
    }))
}

/// Read the inelastic data of one temperature from its `inelastic` group.
pub fn parse_inelastic<G: Group>(
    inelastic_group: &G,
    table: &str,
    mode: SecondaryMode,
) -> Result<InelasticData> {
    let (energy, sigma) = read_xs_table(&inelastic_group.open_dataset(XS_DATASET)?)?;
    let threshold = last_energy(&energy);

    let distribution = if mode.is_fixed_grid() {
        read_fixed_grid(inelastic_group, energy.len())?
    } else {
        let correlated = read_correlated_distribution(inelastic_group)?;
        if correlated.energy.len() != energy.len() {
            return Err(SabError::ShapeMismatch(format!(
                "{}: correlated distribution has {} incoming energies, cross section has {}",
                table,
                correlated.energy.len(),
                energy.len()
            )));
        }
        InelasticDistribution::Continuous(convert_correlated(table, &correlated)?)
    };

    Ok(InelasticData {
        energy,
        sigma,
        threshold,
        distribution,
    })
}

/// Equal / skewed bins: transcribe `energy_out` and `mu_out` as stored.
fn read_fixed_grid<G: Group>(inelastic_group: &G, n_energy: usize) -> Result<InelasticDistribution> {
    let energy_out: Array2<f64> = inelastic_group.open_dataset(ENERGY_OUT_DATASET)?.read_2d()?;
    let mu = inelastic_group.open_dataset(MU_OUT_DATASET)?.read_3d()?;

    let (n_in, n_e_out) = energy_out.dim();
    let (mu_in, mu_e_out, _) = mu.dim();
    if n_in != n_energy || mu_in != n_energy {
        return Err(SabError::ShapeMismatch(format!(
            "'{}': energy_out has {} and mu_out {} incoming energies, cross section has {}",
            inelastic_group.name(),
            n_in,
            mu_in,
            n_energy
        )));
    }
    if mu_e_out != n_e_out {
        return Err(SabError::ShapeMismatch(format!(
            "'{}': energy_out has {} outgoing bins, mu_out has {}",
            inelastic_group.name(),
            n_e_out,
            mu_e_out
        )));
    }

    Ok(InelasticDistribution::Fixed { energy_out, mu })
}
