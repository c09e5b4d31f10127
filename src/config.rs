use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable overriding the default data directory.
pub const DATA_DIR_ENV: &str = "RATEBOOK_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
}

impl Config {
    /// Resolve the data directory: explicit flag, then `RATEBOOK_DATA_DIR`,
    /// then `~/.ratebook`.
    pub fn resolve(flag: Option<&Path>) -> Result<Self> {
        Self::from_sources(flag, std::env::var_os(DATA_DIR_ENV))
    }

    pub fn from_sources(flag: Option<&Path>, env: Option<OsString>) -> Result<Self> {
        let data_dir = match (flag, env) {
            (Some(path), _) => path.to_path_buf(),
            (None, Some(value)) if !value.is_empty() => PathBuf::from(value),
            _ => default_data_dir()?,
        };
        log::debug!("Using data directory {}", data_dir.display());
        Ok(Self { data_dir })
    }
}

/// `~/.ratebook`
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".ratebook"))
        .ok_or_else(|| Error::Config("cannot determine home directory".into()))
}
