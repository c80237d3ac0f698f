mod config;
pub mod constants;
pub mod error;
pub mod secondary_correlated;
pub mod store;
#[cfg(feature = "hdf5")]
mod store_hdf5;
pub mod store_memory;
pub mod temperature;
pub mod thermal;
pub mod thermal_correlated;
pub mod thermal_hdf5;

pub use config::{Config, IntoThermalScatteringInput};
pub use error::{Result, SabError};
pub use store::{AttrValue, Dataset, Group};
pub use store_memory::MemoryStore;
pub use temperature::{resolve_temperatures, TemperatureSettings};
pub use thermal::{
    clear_thermal_cache, load_thermal_scattering_cached, ContinuousEnergyPoint, ElasticData,
    ElasticMode, InelasticData, InelasticDistribution, SecondaryMode, ThermalData,
    ThermalScattering,
};
#[cfg(feature = "hdf5")]
pub use thermal::read_thermal_scattering;
pub use thermal_correlated::convert_correlated;
#[cfg(feature = "hdf5")]
pub use thermal_hdf5::read_thermal_scattering_from_hdf5;
pub use thermal_hdf5::{parse_thermal_scattering, parse_thermal_scattering_group};
