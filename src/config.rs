//! Application configuration and its persistence.
//!
//! The configuration record is read once at cycle start and never mutated
//! during a cycle; operator commands and downlink settings apply between
//! cycles. It persists as a single JSON document named `WMB_SETTINGS`; a
//! missing or corrupt file falls back to defaults.

use crate::constants::{DEFAULT_CYCLE_TIMEOUT_MS, DEFAULT_MEASURE_INTERVAL_MS};
use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the persisted settings document.
pub const SETTINGS_FILE: &str = "WMB_SETTINGS";

/// How a completed cycle's payload is shipped to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SendDataType {
    /// Parsed values packed into the LPP encoder buffer.
    #[default]
    Parsed,
    /// The last reassembled APDU as-is; decoding happens server-side.
    RawApdu,
}

impl From<u8> for SendDataType {
    fn from(value: u8) -> Self {
        match value {
            1 => SendDataType::RawApdu,
            _ => SendDataType::Parsed,
        }
    }
}

/// The persisted gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Interval between read-send cycles in milliseconds.
    pub measure_interval_ms: u64,
    /// Read-cycle timeout in milliseconds.
    pub cycle_timeout_ms: u64,
    pub send_data_type: SendDataType,
    /// Enable the GCM unwrap pre-stage for ciphered APDUs.
    pub decrypt_data: bool,
    /// Security byte placeholder followed by the 16-byte authentication key.
    pub authentication_key: [u8; 17],
    pub aes_key: [u8; 16],
    pub aes_iv: [u8; 16],
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            measure_interval_ms: DEFAULT_MEASURE_INTERVAL_MS,
            cycle_timeout_ms: DEFAULT_CYCLE_TIMEOUT_MS,
            send_data_type: SendDataType::Parsed,
            decrypt_data: false,
            authentication_key: [
                0x00, 0xD0, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0xDA, 0xDB,
                0xDC, 0xDD, 0xDE, 0xDF,
            ],
            aes_key: [
                0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C,
                0x0D, 0x0E, 0x0F,
            ],
            aes_iv: [0; 16],
        }
    }
}

/// File-backed settings store.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store the settings document inside `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SETTINGS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted configuration, falling back to defaults when the
    /// document is missing or unreadable.
    pub fn load(&self) -> AppConfig {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::debug!("Loaded configuration from {}", self.path.display());
                    config
                }
                Err(e) => {
                    log::warn!(
                        "Corrupt settings document {} ({e}), using defaults",
                        self.path.display()
                    );
                    AppConfig::default()
                }
            },
            Err(_) => {
                log::info!(
                    "No settings document at {}, using defaults",
                    self.path.display()
                );
                AppConfig::default()
            }
        }
    }

    /// Persist `config`, replacing any existing document.
    pub fn save(&self, config: &AppConfig) -> Result<(), GatewayError> {
        let json = serde_json::to_string_pretty(config)
            .map_err(|e| GatewayError::SettingsError(e.to_string()))?;
        std::fs::write(&self.path, json)
            .map_err(|e| GatewayError::SettingsError(e.to_string()))?;
        log::info!("Saved configuration to {}", self.path.display());
        Ok(())
    }

    /// Remove the persisted document and return the defaults.
    pub fn reset(&self) -> AppConfig {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to remove {}: {e}", self.path.display());
            }
        }
        log::info!("Reset configuration to default values");
        AppConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(tag: &str) -> SettingsStore {
        let dir = std::env::temp_dir().join(format!("dlms-gateway-test-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        SettingsStore::new(dir)
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.measure_interval_ms, 900_000);
        assert_eq!(config.cycle_timeout_ms, 90_000);
        assert_eq!(config.send_data_type, SendDataType::Parsed);
        assert!(!config.decrypt_data);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let store = temp_store("missing");
        let _ = std::fs::remove_file(store.path());
        assert_eq!(store.load(), AppConfig::default());
    }

    #[test]
    fn test_save_load_round_trip() {
        let store = temp_store("roundtrip");
        let mut config = AppConfig::default();
        config.measure_interval_ms = 60_000;
        config.send_data_type = SendDataType::RawApdu;
        config.decrypt_data = true;
        config.aes_key[0] = 0xAB;

        store.save(&config).unwrap();
        assert_eq!(store.load(), config);

        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn test_corrupt_file_yields_defaults() {
        let store = temp_store("corrupt");
        std::fs::write(store.path(), "{not json").unwrap();
        assert_eq!(store.load(), AppConfig::default());
        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn test_reset_removes_document() {
        let store = temp_store("reset");
        store.save(&AppConfig::default()).unwrap();
        assert_eq!(store.reset(), AppConfig::default());
        assert!(!store.path().exists());
    }
}
