//! Client registry stored in `clients.json`.
//!
//! The file is either a bare JSON array of entries or an object with a
//! `clients` array. It is always written back as a bare array.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use cenus_core::CenusError;

use crate::error::StorageError;
use crate::records::UpsertOutcome;

/// Placeholder webhook value meaning "use `SLACK_WEBHOOK_URL`".
pub const FROM_SECRET: &str = "__FROM_SECRET__";

/// One registered client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientEntry {
    pub client_name: String,
    #[serde(default)]
    pub ad_account_id: String,
    /// Threshold settings file, relative to the registry's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_webhook: Option<String>,
    /// Extra generic webhook channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<WebhookTarget>,
}

/// A generic HTTP endpoint that receives alerts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookTarget {
    /// May reference `${ENV_VAR}`s.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    /// Minijinja template for the request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_template: Option<String>,
}

impl ClientEntry {
    pub fn new(client_name: impl Into<String>, ad_account_id: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            ad_account_id: ad_account_id.into(),
            settings_file: None,
            slack_webhook: None,
            webhook: None,
        }
    }

    /// Whether `name` refers to this client (trimmed, case-insensitive).
    pub fn matches(&self, name: &str) -> bool {
        normalize(&self.client_name) == normalize(name)
    }

    /// The webhook to alert this client on.
    ///
    /// Blank means none; [`FROM_SECRET`] resolves to `secret`.
    pub fn webhook_url(&self, secret: Option<&str>) -> Option<String> {
        let raw = self.slack_webhook.as_deref().map(str::trim).unwrap_or("");
        match raw {
            "" => None,
            FROM_SECRET => secret.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string),
            url => Some(url.to_string()),
        }
    }

    /// Directory name for this client's files: spaces become underscores.
    pub fn dir_name(&self) -> String {
        self.client_name.trim().replace(' ', "_")
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RegistryFile {
    List(Vec<ClientEntry>),
    Wrapped { clients: Vec<ClientEntry> },
}

/// In-memory view of the registry file.
#[derive(Debug, Clone)]
pub struct ClientRegistry {
    path: PathBuf,
    clients: Vec<ClientEntry>,
}

impl ClientRegistry {
    /// Load the registry at `path`. A missing file is an empty registry.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if !path.exists() {
            debug!(path = %path.display(), "no client registry yet");
            return Ok(Self {
                path,
                clients: Vec::new(),
            });
        }

        let text = fs::read_to_string(&path)?;
        let clients = match serde_json::from_str::<RegistryFile>(&text) {
            Ok(RegistryFile::List(c)) | Ok(RegistryFile::Wrapped { clients: c }) => c,
            Err(e) => {
                return Err(StorageError::Format {
                    path: path.display().to_string(),
                    message: format!("expected a list of clients or {{\"clients\": [...]}}: {e}"),
                })
            }
        };
        debug!(path = %path.display(), clients = clients.len(), "loaded client registry");
        Ok(Self { path, clients })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn clients(&self) -> &[ClientEntry] {
        &self.clients
    }

    pub fn find(&self, name: &str) -> Option<&ClientEntry> {
        self.clients.iter().find(|c| c.matches(name))
    }

    /// Like [`find`](Self::find), but a missing client is an error.
    pub fn get(&self, name: &str) -> Result<&ClientEntry, CenusError> {
        self.find(name)
            .ok_or_else(|| CenusError::ClientNotFound(name.trim().to_string()))
    }

    /// Replace the entry with the same name, or append a new one.
    pub fn upsert(&mut self, entry: ClientEntry) -> UpsertOutcome {
        match self.clients.iter_mut().find(|c| c.matches(&entry.client_name)) {
            Some(existing) => {
                *existing = entry;
                UpsertOutcome::Updated
            }
            None => {
                self.clients.push(entry);
                UpsertOutcome::Created
            }
        }
    }

    /// Resolve a client's settings file against the registry's directory.
    pub fn settings_path(&self, client: &ClientEntry) -> Option<PathBuf> {
        let file = client.settings_file.as_ref()?;
        if file.is_absolute() {
            return Some(file.clone());
        }
        let base = self.path.parent().unwrap_or_else(|| Path::new(""));
        Some(base.join(file))
    }

    /// Write the registry back as a pretty-printed JSON array.
    pub fn save(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&self.clients)?;
        fs::write(&self.path, text + "\n")?;
        info!(path = %self.path.display(), clients = self.clients.len(), "client registry saved");
        Ok(())
    }
}
