// File-backed credential persistence
use anyhow::Context;
use std::fs;
use std::path::PathBuf;

use crate::application::credential_store::CredentialStore;
use crate::domain::credentials::CredentialPair;

/// Keeps the credential pair in a small TOML file so refreshed tokens
/// survive daemon restarts.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> anyhow::Result<CredentialPair> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }
}

impl CredentialStore for FileTokenStore {
    fn save(&mut self, credentials: &CredentialPair) -> anyhow::Result<()> {
        let rendered = toml::to_string_pretty(credentials)?;
        fs::write(&self.path, rendered)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}
