//! File gateway configuration
//!
//! Loaded from a TOML table such as:
//!
//! ```toml
//! data_dir = "/home/juliet/.local/share/rostra"
//! protocol_dir = "xmpp"
//! sync_on_write = true
//! ```
//!
//! Missing keys fall back to their defaults.

use std::path::{Path, PathBuf};

use rostra_core::RostraError;
use serde::{Deserialize, Serialize};

/// Application directory name under the platform data directory
pub const APP_DIR: &str = "rostra";

/// Where and how the file gateway stores session data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGatewayConfig {
    /// Root directory for all stored sessions
    pub data_dir: PathBuf,
    /// Per-protocol subdirectory, keeps protocols from sharing files
    pub protocol_dir: String,
    /// fsync files before renaming them into place
    pub sync_on_write: bool,
}

impl Default for FileGatewayConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            protocol_dir: "xmpp".to_string(),
            sync_on_write: true,
        }
    }
}

/// Platform data directory, or the working directory if there is none
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

impl FileGatewayConfig {
    /// Store under `data_dir` with default settings otherwise
    pub fn with_data_dir<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Parse from TOML text
    pub fn from_toml_str(text: &str) -> rostra_core::Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| RostraError::config_error(format!("Invalid gateway config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> rostra_core::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            RostraError::config_error(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Directory holding every session of this protocol
    pub fn protocol_root(&self) -> PathBuf {
        self.data_dir.join(&self.protocol_dir)
    }

    fn validate(&self) -> rostra_core::Result<()> {
        if self.protocol_dir.is_empty() {
            return Err(RostraError::config_error("protocol_dir must not be empty"));
        }
        if self.protocol_dir.contains(&['/', '\\'][..]) || self.protocol_dir == "." || self.protocol_dir == ".." {
            return Err(RostraError::config_error(format!(
                "protocol_dir must be a single path component, got {:?}",
                self.protocol_dir
            )));
        }
        Ok(())
    }
}
