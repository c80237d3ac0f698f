// Conversion of a correlated angle-energy distribution into the native
// per-incoming-energy records of a continuous S(alpha,beta) table.
//
// Each incoming energy is handled in two phases. The first checks that every
// outgoing-energy point carries a tabulated angular distribution and that all
// of them share the angular grid size of the first point. The second copies
// the outgoing energy table and fills the (angle x outgoing energy) matrix
// column by column.

use ndarray::Array2;

use crate::error::{Result, SabError};
use crate::secondary_correlated::{AngleDistribution, CorrTable, CorrelatedAngleEnergy, Tabular};
use crate::thermal::ContinuousEnergyPoint;

/// Convert every incoming energy of `dist`, in store order.
pub fn convert_correlated(
    table: &str,
    dist: &CorrelatedAngleEnergy,
) -> Result<Vec<ContinuousEnergyPoint>> {
    if dist.distributions.len() != dist.energy.len() {
        return Err(SabError::ShapeMismatch(format!(
            "{}: {} incoming energies but {} outgoing energy tables",
            table,
            dist.energy.len(),
            dist.distributions.len()
        )));
    }

    dist.distributions
        .iter()
        .enumerate()
        .map(|(i, edist)| {
            let angles = tabulated_angles(table, i, edist)?;
            Ok(copy_point(edist, &angles))
        })
        .collect()
}

/// Phase 1: validate one incoming energy and return its angular tables.
fn tabulated_angles<'a>(table: &str, i: usize, edist: &'a CorrTable) -> Result<Vec<&'a Tabular>> {
    let n = edist.e_out.len();
    if edist.p.len() != n || edist.c.len() != n || edist.angle.len() != n {
        return Err(SabError::ShapeMismatch(format!(
            "{}: incoming energy {} has {} outgoing energies but {} pdf, {} cdf and {} angular values",
            table,
            i,
            n,
            edist.p.len(),
            edist.c.len(),
            edist.angle.len()
        )));
    }

    let mut angles = Vec::with_capacity(n);
    for (j, adist) in edist.angle.iter().enumerate() {
        match adist {
            AngleDistribution::Tabular(tab) => angles.push(tab),
            other => {
                return Err(SabError::UnsupportedDistribution(format!(
                    "{}: {} angular distribution at incoming energy {}, outgoing energy {}",
                    table,
                    other.kind(),
                    i,
                    j
                )))
            }
        }
    }

    // Grid size is fixed by the first outgoing energy
    if let Some(first) = angles.first() {
        let n_mu = first.x.len();
        if let Some((j, tab)) = angles
            .iter()
            .enumerate()
            .find(|(_, tab)| tab.x.len() != n_mu)
        {
            return Err(SabError::ShapeMismatch(format!(
                "{}: incoming energy {} has {} angular points at outgoing energy {}, expected {}",
                table,
                i,
                tab.x.len(),
                j,
                n_mu
            )));
        }
    }

    Ok(angles)
}

/// Phase 2: copy a validated incoming energy into its native record.
fn copy_point(edist: &CorrTable, angles: &[&Tabular]) -> ContinuousEnergyPoint {
    let n_e_out = angles.len();
    let n_mu = angles.first().map_or(0, |tab| tab.x.len());

    let mut mu = Array2::zeros((n_mu, n_e_out));
    for (j, tab) in angles.iter().enumerate() {
        for (k, &x) in tab.x.iter().enumerate() {
            mu[[k, j]] = x;
        }
    }

    ContinuousEnergyPoint {
        e_out: edist.e_out.clone(),
        e_out_pdf: edist.p.clone(),
        e_out_cdf: edist.c.clone(),
        mu,
    }
}
