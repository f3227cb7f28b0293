//! # Hash Server
//! src/lib.rs
//!
//! Servidor HTTP/1.0 concurrente que recibe un password, responde de
//! inmediato con un id y materializa el digest (SHA-512 en base64) recién
//! después de una demora fija. Lleva estadísticas del tiempo de despacho y
//! soporta un apagado cooperativo que rechaza trabajo nuevo mientras deja
//! terminar el pendiente.
//!
//! ## Arquitectura
//!
//! - `http`: Parsing y construcción de mensajes HTTP/1.0
//! - `server`: Listener TCP, un thread por conexión
//! - `router`: Dispatcher por expresiones regulares con compuerta de drenado
//! - `jobs`: Registro de jobs diferidos, digest y handlers
//! - `metrics`: Acumulador de estadísticas
//! - `shutdown`: Coordinador de drenado
//! - `service`: Agregado que comparten todos los threads
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use hash_server::config::Config;
//! use hash_server::server::Server;
//!
//! let server = Server::bind(Config::default()).expect("Error al iniciar servidor");
//! server.run().expect("Error durante el apagado");
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod jobs;
pub mod metrics;
pub mod router;
pub mod server;
pub mod service;
pub mod shutdown;
