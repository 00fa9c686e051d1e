//! Runtime configuration.
//!
//! Loaded once at startup from a YAML file, then overridden by command-line
//! flags. Everything has a default so a bare `simsnmpd -w device.walk` works.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

fn default_port() -> u16 {
    9161
}

fn default_read_community() -> String {
    "public".to_string()
}

fn default_write_community() -> String {
    "private".to_string()
}

fn default_trap_community() -> String {
    "public".to_string()
}

fn default_walkfiles() -> Vec<PathBuf> {
    vec![PathBuf::from("walkfile.txt")]
}

/// Startup configuration for the simulator.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// UDP port to listen on. Defaults to 9161 so the simulator runs
    /// unprivileged; real agents use 161.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Community accepted for GET/GETNEXT/GETBULK.
    #[serde(default = "default_read_community")]
    pub read_community: String,

    /// Community required for SET. Also grants read access.
    #[serde(default = "default_write_community")]
    pub write_community: String,

    /// Community stamped on outgoing traps.
    #[serde(default = "default_trap_community")]
    pub trap_community: String,

    /// Walkfiles to load, merged into one object tree. An OID appearing in
    /// more than one file is a startup error.
    #[serde(default = "default_walkfiles")]
    pub walkfiles: Vec<PathBuf>,

    /// Let SET create rows for OIDs absent from the walkfiles.
    #[serde(default)]
    pub allow_set_create: bool,

    /// Require SET replacement values to keep the stored value's type.
    #[serde(default = "default_true")]
    pub require_set_type_match: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            read_community: default_read_community(),
            write_community: default_write_community(),
            trap_community: default_trap_community(),
            walkfiles: default_walkfiles(),
            allow_set_create: false,
            require_set_type_match: true,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_yaml(&text).map_err(|e| match e {
            Error::Config { message, .. } => Error::Config {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| Error::Config {
            path: PathBuf::new(),
            message: e.to_string(),
        })
    }
}
