// Fixture builders mirroring the thermal scattering HDF5 layout
#![allow(dead_code)]

use serde_json::{json, Map, Value};
use thermal_sab::constants::K_BOLTZMANN;
use thermal_sab::MemoryStore;

pub fn dataset(shape: &[usize], data: Vec<f64>) -> Value {
    json!({ "type": "dataset", "shape": shape, "data": data })
}

pub fn group(members: Vec<(String, Value)>) -> Value {
    let members: Map<String, Value> = members.into_iter().collect();
    json!({ "type": "group", "members": members })
}

/// Cross section table of shape (2, N)
pub fn xs(energy: &[f64], values: &[f64]) -> Value {
    let mut data = energy.to_vec();
    data.extend_from_slice(values);
    dataset(&[2, energy.len()], data)
}

pub fn energies(n: usize) -> Vec<f64> {
    (0..n).map(|i| 1e-5 * 10f64.powi(i as i32)).collect()
}

/// Elastic group with `n_e_in` energies; `mu_out` is added unless the type is "bragg".
pub fn elastic(kind: &str, n_e_in: usize, n_mu: usize) -> Value {
    let energy = energies(n_e_in);
    let values: Vec<f64> = (0..n_e_in).map(|i| 2.0 + i as f64).collect();
    let mut xs = xs(&energy, &values);
    xs["attrs"] = json!({ "type": kind });

    let mut members = vec![("xs".to_string(), xs)];
    if kind != "bragg" {
        // Row i holds the cosines of incoming energy i
        let data: Vec<f64> = (0..n_e_in * n_mu)
            .map(|k| (k % n_mu) as f64 / n_mu as f64 + (k / n_mu) as f64)
            .collect();
        members.push(("mu_out".to_string(), dataset(&[n_e_in, n_mu], data)));
    }
    group(members)
}

/// Equal/skewed inelastic group
pub fn fixed_inelastic(n_e_in: usize, n_e_out: usize, n_mu: usize) -> Value {
    let energy = energies(n_e_in);
    let sigma: Vec<f64> = (0..n_e_in).map(|i| 20.0 - i as f64).collect();
    let energy_out: Vec<f64> = (0..n_e_in * n_e_out).map(|k| k as f64 * 1e-3).collect();
    let mu: Vec<f64> = (0..n_e_in * n_e_out * n_mu)
        .map(|k| -1.0 + 2.0 * (k % n_mu) as f64 / n_mu as f64)
        .collect();
    group(vec![
        ("xs".to_string(), xs(&energy, &sigma)),
        ("energy_out".to_string(), dataset(&[n_e_in, n_e_out], energy_out)),
        ("mu_out".to_string(), dataset(&[n_e_in, n_e_out, n_mu], mu)),
    ])
}

/// Continuous inelastic group in the correlated layout.
///
/// `grid[i][j]` is the number of angular points of outgoing energy j at
/// incoming energy i.
pub fn continuous_inelastic(grid: &[Vec<usize>]) -> Value {
    let n_e_in = grid.len();
    let energy = energies(n_e_in);
    let sigma: Vec<f64> = (0..n_e_in).map(|i| 5.0 + i as f64).collect();

    let mut offsets = Vec::new();
    let mut rows: [Vec<f64>; 5] = Default::default();
    let mut mu_rows: [Vec<f64>; 3] = Default::default();
    for (i, points) in grid.iter().enumerate() {
        offsets.push(rows[0].len() as f64);
        let n = points.len();
        for (j, &m) in points.iter().enumerate() {
            rows[0].push(1e-6 * (i + 1) as f64 * (j + 1) as f64);
            rows[1].push(1.0 / n as f64);
            rows[2].push(j as f64 / n as f64);
            rows[3].push(2.0);
            rows[4].push(mu_rows[0].len() as f64);
            for l in 0..m {
                mu_rows[0].push(-1.0 + 2.0 * l as f64 / m as f64 + i as f64 * 0.01);
                mu_rows[1].push(1.0 / m as f64);
                mu_rows[2].push(l as f64 / m as f64);
            }
        }
    }

    let n_total = rows[0].len();
    let m_total = mu_rows[0].len();
    let mut energy_out = dataset(&[5, n_total], rows.concat());
    energy_out["attrs"] = json!({
        "offsets": offsets,
        "interpolation": vec![2.0; n_e_in],
        "n_discrete_lines": vec![0.0; n_e_in],
    });

    group(vec![
        ("xs".to_string(), xs(&energy, &sigma)),
        ("energy".to_string(), dataset(&[n_e_in], energy.clone())),
        ("energy_out".to_string(), energy_out),
        ("mu".to_string(), dataset(&[3, m_total], mu_rows.concat())),
    ])
}

pub fn kt(kelvin: f64) -> f64 {
    kelvin * K_BOLTZMANN
}

/// Whole store holding one table named `name` at the given temperatures.
/// `temperature_group` builds the group of each temperature.
pub fn table_store<F>(name: &str, mode: &str, temperatures: &[f64], temperature_group: F) -> MemoryStore
where
    F: Fn(f64) -> Value,
{
    MemoryStore::from_value(table_root(name, mode, temperatures, temperature_group)).unwrap()
}

pub fn table_root<F>(name: &str, mode: &str, temperatures: &[f64], temperature_group: F) -> Value
where
    F: Fn(f64) -> Value,
{
    let mut members = Vec::new();
    let kts: Vec<(String, Value)> = temperatures
        .iter()
        .map(|&t| (format!("{}K", t), dataset(&[], vec![kt(t)])))
        .collect();
    members.push(("kTs".to_string(), group(kts)));
    for &t in temperatures {
        members.push((format!("{}K", t), temperature_group(t)));
    }

    let mut table = group(members);
    table["attrs"] = json!({
        "atomic_weight_ratio": 0.999167,
        "nuclides": ["H1"],
        "secondary_mode": mode,
    });
    group(vec![(name.to_string(), table)])
}
