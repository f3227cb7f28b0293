//! # Sistema de Jobs
//! src/jobs/mod.rs
//!
//! Hashing diferido de passwords: el request recibe un id de inmediato y el
//! digest aparece recién después de [`registry::HASH_DELAY`].
//!
//! ## Endpoints
//!
//! - `POST /hash` - Encolar un password (form `password`)
//! - `GET /hash/{id}` - Obtener el digest
//! - `/stats` - Total de jobs y tiempo promedio de despacho
//! - `/shutdown` - Drenado cooperativo

pub mod digest;
pub mod handlers;
pub mod registry;

pub use registry::{JobId, JobRegistry, SubmitError, HASH_DELAY};
