use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("core error: {0}")]
    Core(#[from] cenus_core::CenusError),

    #[error("{path}: {message}")]
    Format { path: String, message: String },

    #[error("{0}")]
    Other(String),
}
