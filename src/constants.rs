// Physical constants and tag strings of the thermal scattering HDF5 layout

/// Boltzmann constant in eV/K (CODATA 2018)
pub const K_BOLTZMANN: f64 = 8.617333262e-5;

/// Default tolerance (K) when matching requested against available temperatures
pub const DEFAULT_TEMPERATURE_TOLERANCE: f64 = 10.0;

/// Temperature (K) loaded when the caller asks for none
pub const DEFAULT_TEMPERATURE: f64 = 293.6;

// Group and dataset names
pub const KTS_GROUP: &str = "kTs";
pub const ELASTIC_GROUP: &str = "elastic";
pub const INELASTIC_GROUP: &str = "inelastic";
pub const XS_DATASET: &str = "xs";
pub const MU_OUT_DATASET: &str = "mu_out";
pub const ENERGY_OUT_DATASET: &str = "energy_out";

// Attribute names
pub const ATTR_AWR: &str = "atomic_weight_ratio";
pub const ATTR_NUCLIDES: &str = "nuclides";
pub const ATTR_SECONDARY_MODE: &str = "secondary_mode";
pub const ATTR_TYPE: &str = "type";
