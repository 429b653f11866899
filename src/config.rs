use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Result, SelfCareError};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_SQLITE_PATH: &str = "selfcare.db";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_SWEEP_SECONDS: u64 = 60;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// HTML file served at `/` instead of the embedded page.
    pub index_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub sqlite_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RemindersConfig {
    pub auto_complete_overdue: Option<bool>,
    pub sweep_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    pub ai: Option<AiConfig>,
    pub server: Option<ServerConfig>,
    pub database: Option<DatabaseConfig>,
    pub reminders: Option<RemindersConfig>,
}

impl Config {
    pub fn convention_defaults() -> Self {
        Self {
            ai: Some(AiConfig {
                api_key: None,
                model: Some(DEFAULT_MODEL.to_string()),
                base_url: Some(DEFAULT_BASE_URL.to_string()),
            }),
            server: Some(ServerConfig {
                host: Some(DEFAULT_HOST.to_string()),
                port: Some(DEFAULT_PORT),
                index_path: None,
            }),
            database: Some(DatabaseConfig {
                sqlite_path: Some(DEFAULT_SQLITE_PATH.to_string()),
            }),
            reminders: Some(RemindersConfig {
                auto_complete_overdue: Some(false),
                sweep_seconds: Some(DEFAULT_SWEEP_SECONDS),
            }),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| SelfCareError::Config(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw).map_err(|e| SelfCareError::Config(e.to_string()))
    }

    /// Overlays environment variables on top of the current values.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_key = read("SELFCARE_AI_API_KEY").or_else(|| read("GEMINI_API_KEY"));
        let model = read("SELFCARE_AI_MODEL");
        let base_url = read("SELFCARE_AI_BASE_URL");
        if api_key.is_some() || model.is_some() || base_url.is_some() {
            let ai = self.ai.get_or_insert_with(AiConfig::default);
            if api_key.is_some() {
                ai.api_key = api_key;
            }
            if model.is_some() {
                ai.model = model;
            }
            if base_url.is_some() {
                ai.base_url = base_url;
            }
        }

        if let Some(host) = read("SELFCARE_HOST") {
            self.server.get_or_insert_with(ServerConfig::default).host = Some(host);
        }
        if let Some(port) = read("PORT") {
            let port = port
                .parse::<u16>()
                .map_err(|e| SelfCareError::Config(format!("invalid PORT `{port}`: {e}")))?;
            self.server.get_or_insert_with(ServerConfig::default).port = Some(port);
        }
        if let Some(path) = read("SELFCARE_DB") {
            self.database
                .get_or_insert_with(DatabaseConfig::default)
                .sqlite_path = Some(path);
        }

        Ok(self)
    }

    pub fn api_key(&self) -> Option<&str> {
        self.ai
            .as_ref()
            .and_then(|ai| ai.api_key.as_deref())
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn model(&self) -> String {
        self.ai
            .as_ref()
            .and_then(|ai| ai.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    pub fn base_url(&self) -> String {
        self.ai
            .as_ref()
            .and_then(|ai| ai.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn host(&self) -> String {
        self.server
            .as_ref()
            .and_then(|server| server.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string())
    }

    pub fn port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|server| server.port)
            .unwrap_or(DEFAULT_PORT)
    }

    pub fn index_path(&self) -> Option<&str> {
        self.server
            .as_ref()
            .and_then(|server| server.index_path.as_deref())
    }

    pub fn sqlite_path(&self) -> String {
        self.database
            .as_ref()
            .and_then(|db| db.sqlite_path.clone())
            .unwrap_or_else(|| DEFAULT_SQLITE_PATH.to_string())
    }

    pub fn auto_complete_overdue(&self) -> bool {
        self.reminders
            .as_ref()
            .and_then(|reminders| reminders.auto_complete_overdue)
            .unwrap_or(false)
    }

    pub fn sweep_seconds(&self) -> u64 {
        self.reminders
            .as_ref()
            .and_then(|reminders| reminders.sweep_seconds)
            .unwrap_or(DEFAULT_SWEEP_SECONDS)
            .max(1)
    }
}
