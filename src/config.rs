//! Configuration for message encoding and the tooling around it
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (messages.toml)
//! - Environment variables (MESSAGES__*)
//!
//! ## Example config file (messages.toml):
//! ```toml
//! [codec]
//! include_cleared_fields = true
//! freeze_on_decode = false
//!
//! [output]
//! format = "compact"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagesConfig {
    /// Array codec settings
    #[serde(default)]
    pub codec: CodecConfig,

    /// Output settings for the command line tools
    #[serde(default)]
    pub output: OutputConfig,
}

/// Array codec configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Write explicitly cleared fields as `null` so readers can tell
    /// "never set" from "unset"
    #[serde(default = "default_true")]
    pub include_cleared_fields: bool,

    /// Freeze messages as soon as they are decoded
    #[serde(default)]
    pub freeze_on_decode: bool,
}

/// Output configuration
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

fn default_true() -> bool {
    true
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            include_cleared_fields: true,
            freeze_on_decode: false,
        }
    }
}

impl MessagesConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a specific file on top of the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        for location in ["messages.toml", ".messages.toml", "config/messages.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "messages") {
            let xdg_config = config_dir.config_dir().join("messages.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // MESSAGES__CODEC__FREEZE_ON_DECODE=true
        builder = builder.add_source(
            Environment::with_prefix("MESSAGES")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    pub fn is_compact(&self) -> bool {
        self.output.format == OutputFormat::Compact
    }
}
