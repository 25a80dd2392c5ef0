pub mod alert_log;
pub mod clients;
pub mod discover;
pub mod error;
pub mod jsonl;
pub mod records;
pub mod settings;

use std::path::{Path, PathBuf};

use tracing::info;

use cenus_core::{Config, Level};

pub use alert_log::{AlertLog, LoggedAlert};
pub use clients::{ClientEntry, ClientRegistry, WebhookTarget, FROM_SECRET};
pub use error::StorageError;
pub use jsonl::{read_observations, read_observations_from, write_jsonl, BadLine, ImportReport};
pub use records::{JsonlRecordStore, UpsertOutcome};
pub use settings::{ensure_default_settings, load_settings_or_empty, read_settings};

/// Where everything lives on disk, derived from config.
///
/// ```text
/// <data_dir>/<Client_Name>/<level>_*.jsonl   daily inputs
/// <data_dir>/<Client_Name>/records.jsonl      fatigue records
/// <data_dir>/alerts.jsonl                     alert log
/// <clients_file>                              client registry
/// ```
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub data_dir: PathBuf,
    pub clients_file: PathBuf,
}

impl StorageLayout {
    pub fn from_config(config: &Config) -> Self {
        Self {
            data_dir: config.storage.data_dir.clone(),
            clients_file: config.storage.clients_file.clone(),
        }
    }

    /// Create the data directory if needed.
    pub fn ensure_dirs(&self) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.data_dir)?;
        info!("Storage: local data dir at {}", self.data_dir.display());
        Ok(())
    }

    pub fn registry(&self) -> Result<ClientRegistry, StorageError> {
        ClientRegistry::load(&self.clients_file)
    }

    pub fn client_dir(&self, client: &ClientEntry) -> PathBuf {
        discover::client_dir(&self.data_dir, &client.dir_name())
    }

    pub fn client_inputs(&self, client: &ClientEntry, level: Level) -> Vec<PathBuf> {
        discover::discover_inputs(&self.client_dir(client), level)
    }

    pub fn record_store(&self, client: &ClientEntry) -> Result<JsonlRecordStore, StorageError> {
        JsonlRecordStore::open(self.client_dir(client).join("records.jsonl"))
    }

    pub fn alert_log(&self) -> AlertLog {
        AlertLog::new(self.data_dir.join("alerts.jsonl"))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
