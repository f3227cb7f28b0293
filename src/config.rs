//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración con soporte para argumentos CLI y variables de entorno.
//! La demora del hashing es fija y no se configura.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./hash_server --port 8080 --read-timeout-ms 2000
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! PORT=8080 HOST=127.0.0.1 RUST_LOG=debug ./hash_server
//! ```

use crate::error::ConfigError;
use clap::Parser;
use std::time::Duration;

/// Tamaño mínimo aceptado para `max_request_bytes`
pub const MIN_REQUEST_BYTES: usize = 1024;

/// Configuración del servidor HTTP/1.0
#[derive(Debug, Clone, Parser)]
#[command(name = "hash_server")]
#[command(about = "Servidor HTTP/1.0 de hashing diferido con drenado cooperativo")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "3000", env = "PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "0.0.0.0", env = "HOST")]
    pub host: String,

    /// Tamaño máximo de un request (headers + body)
    #[arg(long = "max-request-bytes", default_value = "65536", env = "MAX_REQUEST_BYTES")]
    pub max_request_bytes: usize,

    /// Timeout de lectura por conexión en milisegundos
    #[arg(long = "read-timeout-ms", default_value = "5000", env = "READ_TIMEOUT_MS")]
    pub read_timeout_ms: u64,

    /// Nivel de log por defecto (RUST_LOG tiene prioridad)
    #[arg(long = "log-level", default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use hash_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "0.0.0.0:3000");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }

        if self.max_request_bytes < MIN_REQUEST_BYTES {
            return Err(ConfigError::RequestLimitTooSmall {
                min: MIN_REQUEST_BYTES,
                got: self.max_request_bytes,
            });
        }

        if self.read_timeout_ms == 0 {
            return Err(ConfigError::ZeroReadTimeout);
        }

        Ok(())
    }

    /// Registra en el log un resumen de la configuración
    pub fn log_summary(&self) {
        log::info!("Configuration:");
        log::info!("   Address:       {}", self.address());
        log::info!("   Max request:   {} bytes", self.max_request_bytes);
        log::info!("   Read timeout:  {} ms", self.read_timeout_ms);
        log::info!("   Log level:     {}", self.log_level);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
            max_request_bytes: 65_536,
            read_timeout_ms: 5_000,
            log_level: "info".to_string(),
        }
    }
}
