//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Servidor TCP que:
//! 1. Escucha en un puerto
//! 2. Acepta conexiones y atiende cada una en su propio thread
//! 3. Lee, parsea y enruta el request
//! 4. Espera la secuencia de drenado antes de retornar

pub mod tcp;

pub use tcp::Server;
