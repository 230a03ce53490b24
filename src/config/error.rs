use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("NPC '{0}' not found in identity config")]
    UnknownNpc(String),

    #[error("NPC '{npc_id}' is missing required field '{field}'")]
    MissingField { npc_id: String, field: &'static str },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No API key configured for the reasoning backend")]
    MissingApiKey,
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        let path = path.into();
        if error.kind() == std::io::ErrorKind::NotFound {
            return ConfigError::NotFound(path);
        }
        ConfigError::Io {
            path,
            message: error.to_string(),
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        ConfigError::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
