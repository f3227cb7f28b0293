//! # Errores del Servidor
//! src/error.rs

use thiserror::Error;

/// Errores de validación de la configuración
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("host must not be empty")]
    EmptyHost,

    #[error("max request bytes must be >= {min} (got {got})")]
    RequestLimitTooSmall { min: usize, got: usize },

    #[error("read timeout must be > 0")]
    ZeroReadTimeout,
}

/// Errores fatales del servidor
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid route pattern: {0}")]
    Route(#[from] regex::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
