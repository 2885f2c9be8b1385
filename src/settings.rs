use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    /// Sender address that marks a notification as relevant.
    #[serde(default = "default_channel_address")]
    pub channel_address: String,
    /// Account holder identity, one side of every classified transaction.
    #[serde(default = "default_owner_account")]
    pub owner_account: String,
    #[serde(default = "default_owner_phone")]
    pub owner_phone: String,
    #[serde(default = "default_owner_name")]
    pub owner_name: String,
}

fn default_channel_address() -> String {
    "M-Money".to_string()
}

fn default_owner_account() -> String {
    "36521838".to_string()
}

fn default_owner_phone() -> String {
    "250795963036".to_string()
}

fn default_owner_name() -> String {
    "Account Owner".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            channel_address: default_channel_address(),
            owner_account: default_owner_account(),
            owner_phone: default_owner_phone(),
            owner_name: default_owner_name(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("momo-ledger")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("momo-ledger")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| LedgerError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn get_data_dir() -> PathBuf {
    PathBuf::from(&load_settings().data_dir)
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_dir: "/tmp/momo".to_string(),
            channel_address: "M-Money".to_string(),
            owner_account: "11112222".to_string(),
            owner_phone: "250780000000".to_string(),
            owner_name: "Test Owner".to_string(),
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let loaded: Settings =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.owner_account, "11112222");
        assert_eq!(loaded.data_dir, "/tmp/momo");
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.channel_address, "M-Money");
        assert_eq!(s.owner_account, "36521838");
        assert!(!s.data_dir.is_empty());
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"data_dir": "/tmp/momo"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.channel_address, "M-Money");
        assert_eq!(s.owner_name, "Account Owner");
    }
}
