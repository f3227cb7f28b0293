//! # Módulo HTTP
//! src/http/mod.rs
//!
//! Implementa el subconjunto de HTTP/1.0 que necesita el servidor, sin
//! librerías de alto nivel:
//!
//! - Parsing de requests (request line, headers, body, formularios)
//! - Construcción de responses de texto plano y JSON
//! - Códigos de estado
//!
//! Cada conexión atiende un único request y se cierra (`Connection: close`).

pub mod request;
pub mod response;
pub mod status;

// Permite usar `http::Request` en vez de `http::request::Request`
pub use request::{Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
