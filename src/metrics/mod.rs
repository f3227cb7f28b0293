//! # Sistema de Métricas
//! src/metrics/mod.rs
//!
//! Estadísticas agregadas del servicio: cantidad de jobs enviados y el
//! promedio móvil del tiempo de despacho de cada submission.

pub mod stats;

pub use stats::{StatsAccumulator, StatsSnapshot};
