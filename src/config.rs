use std::fs;
use std::io;
use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::error::{Error, Result};

static DEFAULT_CONFIG: &str = include_str!("default_config.toml");

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub links: LinksConfig,
    pub render: RenderConfig,
}

/// Attributes added to every rendered link. An empty value omits the attribute.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LinksConfig {
    pub target: String,
    pub rel: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            target: "_blank".to_string(),
            rel: "noopener noreferrer".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RenderConfig {
    pub passthrough_comments: bool,
    pub group_lists: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            passthrough_comments: true,
            group_lists: true,
        }
    }
}

impl Config {
    /// The configuration embedded at build time from `default_config.toml`.
    pub fn compiled_default() -> Self {
        // build.rs rejects a default config that does not parse
        toml::from_str(DEFAULT_CONFIG).unwrap_or_default()
    }

    /// Parse a TOML config. Sections and keys left out keep their defaults.
    pub fn from_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load config from a TOML file, or the compiled default if there is none.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content, path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no config at {}, using defaults", path.display());
                Ok(Self::compiled_default())
            }
            Err(source) => Err(Error::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}
