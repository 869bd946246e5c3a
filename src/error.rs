use std::path::PathBuf;

use thiserror::Error;

/// Failure to load or validate a pricing catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML catalog: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate provider: {0}")]
    DuplicateProvider(String),
    #[error("duplicate model {model} under provider {provider}")]
    DuplicateModel { provider: String, model: String },
    #[error("{provider} / {model}: {field} must be a non-negative number, got {value}")]
    InvalidRate {
        provider: String,
        model: String,
        field: &'static str,
        value: f64,
    },
    #[error("{provider} / {model}: max_input_tpm_per_unit must be greater than zero")]
    ZeroThroughput { provider: String, model: String },
}

/// A usage profile that cannot be priced without dividing by zero.
#[derive(Debug, Error, PartialEq)]
pub enum UsageError {
    #[error("call volume must be positive")]
    NoCalls,
    #[error("hours must be a positive number, got {0}")]
    InvalidHours(f64),
    #[error("duration must be a positive number of minutes, got {0}")]
    InvalidDuration(f64),
}
