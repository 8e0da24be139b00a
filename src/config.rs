use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Munch";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_MODEL: &str = "deepseek-r1:14b";
const DEFAULT_OPENAI_URL: &str = "http://localhost:11434/v1";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const MAX_TIMEOUT_SECS: u64 = 600;
const DEFAULT_CONVERTER_TIMEOUT_SECS: u64 = 120;
const DEFAULT_BIND: &str = "127.0.0.1:8000";
const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_LOG_FILTER: &str = "munch=info,munch_lib=info,tower_http=info";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Cannot determine a data directory; set MUNCH_DB_PATH")]
    NoDataDir,
}

/// Which wire protocol the oracle endpoint speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleBackend {
    /// OpenAI-compatible `/chat/completions`.
    OpenAiCompat,
    /// Ollama native `/api/generate`.
    Ollama,
}

impl FromStr for OracleBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "openai-compat" => Ok(Self::OpenAiCompat),
            "ollama" => Ok(Self::Ollama),
            other => Err(format!("unknown backend '{other}' (expected openai or ollama)")),
        }
    }
}

impl fmt::Display for OracleBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OpenAiCompat => "openai",
            Self::Ollama => "ollama",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleConfig {
    pub backend: OracleBackend,
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

/// Everything the service needs, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub fallback_dir: PathBuf,
    pub oracle: OracleConfig,
    pub db_path: PathBuf,
    pub bind: SocketAddr,
    pub allowed_origin: String,
    pub docx_converter: Option<String>,
    pub docx_converter_timeout_secs: u64,
    pub dump_dir: Option<PathBuf>,
    pub log_filter: String,
}

impl AppConfig {
    /// Load from the process environment. Call [`load_dotenv`] first to
    /// merge a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let get_either = |primary: &str, legacy: &str| get(primary).or_else(|| get(legacy));

        let fallback_dir = get_either("MUNCH_FALLBACK_DIR", "NA_PATH")
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing("MUNCH_FALLBACK_DIR"))?;

        let backend = match get("MUNCH_ORACLE_BACKEND") {
            Some(value) => value.parse().map_err(|reason| ConfigError::Invalid {
                var: "MUNCH_ORACLE_BACKEND",
                value,
                reason,
            })?,
            None => OracleBackend::OpenAiCompat,
        };

        let base_url = get_either("MUNCH_ORACLE_URL", "RUNPOD_ENDPOINT").unwrap_or_else(|| {
            match backend {
                OracleBackend::OpenAiCompat => DEFAULT_OPENAI_URL,
                OracleBackend::Ollama => DEFAULT_OLLAMA_URL,
            }
            .to_string()
        });
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: "MUNCH_ORACLE_URL",
                value: base_url,
                reason: "must be an http(s) URL".into(),
            });
        }

        let seconds = |var: &'static str, default: u64| match get(var) {
            Some(value) => value
                .parse::<u64>()
                .map(|secs| secs.clamp(1, MAX_TIMEOUT_SECS))
                .map_err(|e| ConfigError::Invalid {
                    var,
                    value,
                    reason: e.to_string(),
                }),
            None => Ok(default),
        };
        let timeout_secs = seconds("MUNCH_ORACLE_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let docx_converter_timeout_secs =
            seconds("MUNCH_DOCX_CONVERTER_TIMEOUT_SECS", DEFAULT_CONVERTER_TIMEOUT_SECS)?;

        let db_path = match get("MUNCH_DB_PATH") {
            Some(path) => PathBuf::from(path),
            None => default_db_path().ok_or(ConfigError::NoDataDir)?,
        };

        let bind_text = get("MUNCH_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_text.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            var: "MUNCH_BIND",
            value: bind_text.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            fallback_dir,
            oracle: OracleConfig {
                backend,
                base_url,
                api_key: get_either("MUNCH_ORACLE_API_KEY", "RUNPOD_API_KEY"),
                model: get("MUNCH_ORACLE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                timeout_secs,
            },
            db_path,
            bind,
            allowed_origin: get("MUNCH_ALLOWED_ORIGIN")
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string()),
            docx_converter: get("MUNCH_DOCX_CONVERTER"),
            docx_converter_timeout_secs,
            dump_dir: get("MUNCH_DUMP_DIR").map(PathBuf::from),
            log_filter: get("MUNCH_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }
}

/// Merge `.env` from the working directory into the process environment.
/// Returns the file that was loaded. Variables already set win.
pub fn load_dotenv() -> Option<PathBuf> {
    std::env::current_dir().ok().and_then(|dir| load_dotenv_from(&dir))
}

pub fn load_dotenv_from(dir: &Path) -> Option<PathBuf> {
    let path = dir.join(".env");
    dotenvy::from_path(&path).ok().map(|()| path)
}

/// Get the application data directory (`<platform data dir>/munch`).
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("munch"))
}

fn default_db_path() -> Option<PathBuf> {
    app_data_dir().map(|d| d.join("munch.db"))
}
