use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type used across the rules core crate.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Canonical error representation shared by the workspace.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("logging setup failed: {0}")]
    Logging(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Deserialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for CoreError {
    fn from(err: serde_yaml::Error) -> Self {
        CoreError::Deserialization(err.to_string())
    }
}

/// Errors raised while loading or resolving a workflow configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read config file: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("{}", .errors.join("; "))]
    Unresolved { errors: Vec<String> },
}

impl ConfigError {
    /// Individual messages, one per problem found.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ConfigError::Unresolved { errors } => errors.clone(),
            other => vec![other.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_lists_every_problem() {
        let err = ConfigError::Unresolved {
            errors: vec!["first".into(), "second".into()],
        };
        assert_eq!(err.to_string(), "first; second");
        assert_eq!(err.messages().len(), 2);
    }

    #[test]
    fn config_errors_convert_into_core_errors() {
        let err: CoreError = ConfigError::NotFound {
            path: PathBuf::from("missing.json"),
        }
        .into();
        assert!(err.to_string().contains("Config file not found: missing.json"));
    }
}
