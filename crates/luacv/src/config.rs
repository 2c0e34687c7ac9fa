use std::path::{Path, PathBuf};

use luacv_chessboard::ChessboardParams;
use serde::{Deserialize, Serialize};

use crate::trackbar::DEFAULT_CAPACITY;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "LUACV_CONFIG";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown log level '{0}'")]
    LogLevel(String),
}

/// Settings of a `luacv` instance.
///
/// Every field has a default, so `{}` is a valid config file.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Number of trackbar slots.
    pub max_trackbars: usize,
    /// Detector parameters used when `FindChessboardCorners` gets no
    /// overrides.
    pub chessboard: ChessboardParams,
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_trackbars: DEFAULT_CAPACITY,
            chessboard: ChessboardParams::default(),
            log_level: None,
        }
    }
}

impl Config {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the file named by `LUACV_CONFIG`, or the defaults when it is
    /// unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::from_json_file(PathBuf::from(path)),
            _ => Ok(Self::default()),
        }
    }

    /// The configured log level, if any.
    pub fn level_filter(&self) -> Result<Option<log::LevelFilter>, ConfigError> {
        self.log_level
            .as_deref()
            .map(|level| {
                level
                    .parse()
                    .map_err(|_| ConfigError::LogLevel(level.to_owned()))
            })
            .transpose()
    }
}
