use thiserror::Error;

/// Errors raised while loading a thermal scattering table.
///
/// Every variant is fatal for the table being loaded: the loader returns early
/// and no partially built table is handed back.
#[derive(Error, Debug)]
pub enum SabError {
    #[error("Nuclear data library does not contain data for {table} at or near {temperature} K")]
    TemperatureUnavailable { table: String, temperature: f64 },

    #[error("Unrecognized {what}: '{value}'")]
    UnrecognizedFormat { what: String, value: String },

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Unsupported angular distribution: {0}")]
    UnsupportedDistribution(String),

    #[error("Missing data: {0}")]
    MissingData(String),

    #[error("No thermal scattering file configured for table '{0}'")]
    UnknownTable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),
}

pub type Result<T> = std::result::Result<T, SabError>;

impl SabError {
    pub(crate) fn unrecognized(what: &str, value: impl Into<String>) -> Self {
        SabError::UnrecognizedFormat {
            what: what.to_string(),
            value: value.into(),
        }
    }
}
