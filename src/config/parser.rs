//! Generic typed TOML parsing.
//!
//! Report configurations are order sensitive and go through
//! [`Configuration`](super::Configuration); small fixed-shape files such as
//! the tool settings deserialize straight into a struct with [`parse_config`].

use anyhow::{Context, Result};
use std::path::Path;

/// Read `path` and deserialize it as TOML into `T`.
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: T = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}
