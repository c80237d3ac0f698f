// Correlated angle-energy distribution
// Corresponds to OpenMC's CorrelatedAngleEnergy and its HDF5 layout

use crate::error::{Result, SabError};
use crate::store::{Dataset, Group};

/// Interpolation scheme of a tabulated distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Histogram,
    LinLin,
}

impl Interpolation {
    /// Map an ENDF interpolation code for an outgoing-energy table.
    fn from_energy_code(code: i32) -> Result<Self> {
        match code {
            1 => Ok(Interpolation::Histogram),
            2 => Ok(Interpolation::LinLin),
            other => Err(SabError::unrecognized(
                "outgoing energy interpolation code",
                other.to_string(),
            )),
        }
    }

    /// Angular tables use 0 or 1 for histogram.
    fn from_angle_code(code: i32) -> Result<Self> {
        match code {
            0 | 1 => Ok(Interpolation::Histogram),
            2 => Ok(Interpolation::LinLin),
            other => Err(SabError::unrecognized(
                "angular interpolation code",
                other.to_string(),
            )),
        }
    }
}

/// Tabulated distribution of the scattering cosine.
#[derive(Debug, Clone, PartialEq)]
pub struct Tabular {
    pub x: Vec<f64>,
    pub p: Vec<f64>,
    pub c: Vec<f64>,
    pub interpolation: Interpolation,
}

/// Angular distribution attached to one outgoing-energy point.
#[derive(Debug, Clone, PartialEq)]
pub enum AngleDistribution {
    Tabular(Tabular),
    /// No angular points were stored for this outgoing energy.
    Isotropic,
}

impl AngleDistribution {
    pub fn kind(&self) -> &'static str {
        match self {
            AngleDistribution::Tabular(_) => "tabular",
            AngleDistribution::Isotropic => "isotropic",
        }
    }
}

/// Outgoing energy / angle table for one incoming energy.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrTable {
    pub interpolation: Interpolation,
    pub n_discrete: usize,
    pub e_out: Vec<f64>,
    pub p: Vec<f64>,
    pub c: Vec<f64>,
    /// One angular distribution per outgoing energy
    pub angle: Vec<AngleDistribution>,
}

/// Correlated angle-energy distribution: for each incoming energy a table of
/// outgoing energies, each with its own angular distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelatedAngleEnergy {
    /// Incoming energy grid
    pub energy: Vec<f64>,
    /// Interpolation region boundaries of the incoming energy grid
    pub breakpoints: Vec<i32>,
    /// Interpolation code of each region
    pub interpolation: Vec<i32>,
    pub distributions: Vec<CorrTable>,
}

/// Number of entries belonging to table `i` given start offsets into a flat
/// array of `total` entries.
fn segment(offsets: &[usize], i: usize, total: usize, what: &str) -> Result<(usize, usize)> {
    let start = offsets[i];
    let end = offsets.get(i + 1).copied().unwrap_or(total);
    if start > end || end > total {
        return Err(SabError::ShapeMismatch(format!(
            "{} offsets {}..{} out of range for {} entries",
            what, start, end, total
        )));
    }
    Ok((start, end - start))
}

/// Codes and offsets are stored as floats in the `energy_out` table; only
/// non-negative integers are meaningful.
fn stored_index(value: f64, what: &str) -> Result<usize> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Ok(value as usize)
    } else {
        Err(SabError::ShapeMismatch(format!(
            "{} must be a non-negative integer, found {}",
            what, value
        )))
    }
}

/// Read a correlated angle-energy distribution from a group.
///
/// Layout:
/// - `energy`: incoming energies, with an optional `interpolation` attribute
///   holding breakpoints (row 0) and schemes (row 1)
/// - `energy_out`: shape (5, N) with rows e_out, pdf, cdf, angular
///   interpolation code and offset into `mu`; attributes `offsets`,
///   `interpolation` and `n_discrete_lines` per incoming energy
/// - `mu`: shape (3, M) with rows mu, pdf, cdf
pub fn read_correlated_distribution<G: Group>(group: &G) -> Result<CorrelatedAngleEnergy> {
    let (energy, breakpoints, interpolation) = {
        let energy_ds = group.open_dataset("energy")?;
        let energy = energy_ds.read_1d()?.to_vec();
        let (breakpoints, interpolation) = if energy_ds.has_attr("interpolation") {
            let interp = energy_ds.attr_i32_vec("interpolation")?;
            let half = interp.len() / 2;
            (interp[..half].to_vec(), interp[half..].to_vec())
        } else {
            (Vec::new(), Vec::new())
        };
        (energy, breakpoints, interpolation)
    };
    let n_energy = energy.len();

    let eout_ds = group.open_dataset("energy_out")?;
    let eout = eout_ds.read_2d()?;
    if eout.nrows() != 5 {
        return Err(SabError::ShapeMismatch(format!(
            "'{}' must have 5 rows, found {}",
            eout_ds.name(),
            eout.nrows()
        )));
    }
    let eout_ncols = eout.ncols();

    let offsets = eout_ds.attr_usize_vec("offsets")?;
    let interp = eout_ds.attr_i32_vec("interpolation")?;
    let n_discrete = eout_ds.attr_usize_vec("n_discrete_lines")?;
    if offsets.len() != n_energy || interp.len() != n_energy || n_discrete.len() != n_energy {
        return Err(SabError::ShapeMismatch(format!(
            "'{}' attributes must have one entry per incoming energy ({})",
            eout_ds.name(),
            n_energy
        )));
    }

    let mu_ds = group.open_dataset("mu")?;
    let mu = mu_ds.read_2d()?;
    if mu.nrows() != 3 {
        return Err(SabError::ShapeMismatch(format!(
            "'{}' must have 3 rows, found {}",
            mu_ds.name(),
            mu.nrows()
        )));
    }
    let mu_ncols = mu.ncols();

    let mut distributions = Vec::with_capacity(n_energy);
    for i in 0..n_energy {
        let (j, n) = segment(&offsets, i, eout_ncols, "energy_out")?;

        let e_out: Vec<f64> = (0..n).map(|k| eout[[0, j + k]]).collect();
        let p: Vec<f64> = (0..n).map(|k| eout[[1, j + k]]).collect();
        let c: Vec<f64> = (0..n).map(|k| eout[[2, j + k]]).collect();

        // Angular distributions for each outgoing energy
        let mut angle = Vec::with_capacity(n);
        for k in 0..n {
            let idx = j + k;
            let interp_mu = stored_index(eout[[3, idx]], "angular interpolation code")?;
            let offset_mu = stored_index(eout[[4, idx]], "mu offset")?;
            let end_mu = if idx + 1 < eout_ncols {
                stored_index(eout[[4, idx + 1]], "mu offset")?
            } else {
                mu_ncols
            };
            if offset_mu > end_mu || end_mu > mu_ncols {
                return Err(SabError::ShapeMismatch(format!(
                    "mu offsets {}..{} out of range for {} entries",
                    offset_mu, end_mu, mu_ncols
                )));
            }
            let m = end_mu - offset_mu;

            if m == 0 {
                angle.push(AngleDistribution::Isotropic);
                continue;
            }

            angle.push(AngleDistribution::Tabular(Tabular {
                x: (0..m).map(|l| mu[[0, offset_mu + l]]).collect(),
                p: (0..m).map(|l| mu[[1, offset_mu + l]]).collect(),
                c: (0..m).map(|l| mu[[2, offset_mu + l]]).collect(),
                interpolation: Interpolation::from_angle_code(
                    i32::try_from(interp_mu).unwrap_or(i32::MAX),
                )?,
            }));
        }

        distributions.push(CorrTable {
            interpolation: Interpolation::from_energy_code(interp[i])?,
            n_discrete: n_discrete[i],
            e_out,
            p,
            c,
            angle,
        });
    }

    log::debug!(
        "read correlated distribution from '{}': {} incoming energies, {} outgoing points, {} angular points",
        group.name(),
        n_energy,
        eout_ncols,
        mu_ncols
    );

    Ok(CorrelatedAngleEnergy {
        energy,
        breakpoints,
        interpolation,
        distributions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store_memory::MemoryStore;
    use serde_json::json;

    fn correlated_store(mu_offsets: [f64; 3]) -> MemoryStore {
        // Two incoming energies: the first with two outgoing points, the second with one
        MemoryStore::from_value(json!({
            "type": "group",
            "members": {
                "dist": {
                    "type": "group",
                    "members": {
                        "energy": { "type": "dataset", "shape": [2], "data": [1e-5, 4.0],
                                    "attrs": { "interpolation": [2, 2] } },
                        "energy_out": {
                            "type": "dataset",
                            "shape": [5, 3],
                            "data": [
                                1e-6, 2e-6, 3e-6,
                                0.5, 0.5, 1.0,
                                0.0, 1.0, 1.0,
                                2, 2, 1,
                                mu_offsets[0], mu_offsets[1], mu_offsets[2]
                            ],
                            "attrs": { "offsets": [0, 2], "interpolation": [2, 1], "n_discrete_lines": [0, 0] }
                        },
                        "mu": {
                            "type": "dataset",
                            "shape": [3, 6],
                            "data": [
                                -0.5, 0.5, -0.6, 0.6, -0.7, 0.7,
                                0.5, 0.5, 0.5, 0.5, 0.5, 0.5,
                                0.0, 1.0, 0.0, 1.0, 0.0, 1.0
                            ]
                        }
                    }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_read_correlated_distribution() {
        let store = correlated_store([0.0, 2.0, 4.0]);
        let group = store.root().open_group("dist").unwrap();
        let dist = read_correlated_distribution(&group).unwrap();

        assert_eq!(dist.energy, vec![1e-5, 4.0]);
        assert_eq!(dist.breakpoints, vec![2]);
        assert_eq!(dist.interpolation, vec![2]);
        assert_eq!(dist.distributions.len(), 2);

        let first = &dist.distributions[0];
        assert_eq!(first.interpolation, Interpolation::LinLin);
        assert_eq!(first.e_out, vec![1e-6, 2e-6]);
        assert_eq!(first.p, vec![0.5, 0.5]);
        assert_eq!(first.c, vec![0.0, 1.0]);
        match &first.angle[1] {
            AngleDistribution::Tabular(t) => {
                assert_eq!(t.x, vec![-0.6, 0.6]);
                assert_eq!(t.interpolation, Interpolation::LinLin);
            }
            other => panic!("expected tabular, got {:?}", other),
        }

        let second = &dist.distributions[1];
        assert_eq!(second.interpolation, Interpolation::Histogram);
        assert_eq!(second.e_out, vec![3e-6]);
        match &second.angle[0] {
            AngleDistribution::Tabular(t) => {
                assert_eq!(t.x, vec![-0.7, 0.7]);
                assert_eq!(t.interpolation, Interpolation::Histogram);
            }
            other => panic!("expected tabular, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_angular_table_is_isotropic() {
        // The first outgoing point's table is empty (offsets 0 and 0)
        let store = correlated_store([0.0, 0.0, 4.0]);
        let group = store.root().open_group("dist").unwrap();
        let dist = read_correlated_distribution(&group).unwrap();
        assert_eq!(dist.distributions[0].angle[0], AngleDistribution::Isotropic);
        match &dist.distributions[0].angle[1] {
            AngleDistribution::Tabular(t) => assert_eq!(t.x.len(), 4),
            other => panic!("expected tabular, got {:?}", other),
        }
    }

    #[test]
    fn test_non_integer_mu_offsets_are_rejected() {
        for offsets in [[0.0, 1.5, 4.0], [0.0, -2.0, 4.0]] {
            let store = correlated_store(offsets);
            let group = store.root().open_group("dist").unwrap();
            match read_correlated_distribution(&group) {
                Err(SabError::ShapeMismatch(msg)) => assert!(msg.contains("mu offset")),
                other => panic!("expected ShapeMismatch, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_out_of_range_mu_offset() {
        let store = correlated_store([0.0, 2.0, 9.0]);
        let group = store.root().open_group("dist").unwrap();
        assert!(matches!(
            read_correlated_distribution(&group),
            Err(SabError::ShapeMismatch(_))
        ));
    }
}
