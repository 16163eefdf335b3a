use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// On-disk layout of `credentials.toml`
#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
struct StoredSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session_created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
}

/// Session token storage for the CLI (`credentials.toml`)
pub struct CredentialStore {
    path: PathBuf,
    session: StoredSession,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            session: StoredSession::default(),
        }
    }

    /// Read the file if it exists; a missing file means no session
    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            self.session = toml::from_str(&content)?;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, toml::to_string_pretty(&self.session)?)?;
        Ok(())
    }

    pub fn get_session_token(&self) -> Option<&String> {
        self.session.session_token.as_ref()
    }

    /// Store a fresh token and stamp its creation time
    pub fn set_session_token(&mut self, token: String) {
        self.session.session_token = Some(token);
        self.session.session_created = Some(Utc::now());
    }

    pub fn get_session_created(&self) -> Option<DateTime<Utc>> {
        self.session.session_created
    }

    pub fn get_username(&self) -> Option<&String> {
        self.session.username.as_ref()
    }

    pub fn set_username(&mut self, username: String) {
        self.session.username = Some(username);
    }

    pub fn clear_session(&mut self) {
        self.session = StoredSession::default();
    }
}
