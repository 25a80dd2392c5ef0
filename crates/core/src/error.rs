use thiserror::Error;

#[derive(Error, Debug)]
pub enum CenusError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Unknown level: {0} (expected campaign, adset or ad)")]
    InvalidLevel(String),

    #[error("Window of {days} days cannot hold a {baseline_days}-day baseline plus the latest day")]
    InvalidWindow { days: usize, baseline_days: usize },

    #[error("Client not found: {0}")]
    ClientNotFound(String),

    #[error("{0}")]
    Other(String),
}
