//! # Servicio de Hashing
//! src/service.rs
//!
//! Agregado que reúne el registro de jobs, las estadísticas y el coordinador
//! de apagado. Se construye una sola vez al arrancar y se comparte como
//! `Arc<HashService>` con cada thread de conexión.

use crate::jobs::registry::{JobId, JobRegistry, SubmitError};
use crate::metrics::{StatsAccumulator, StatsSnapshot};
use crate::shutdown::ShutdownCoordinator;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct HashService {
    registry: JobRegistry,
    stats: StatsAccumulator,
    shutdown: Arc<ShutdownCoordinator>,
}

impl HashService {
    pub fn new() -> Self {
        let shutdown = Arc::new(ShutdownCoordinator::new());
        Self::from_parts(JobRegistry::new(Arc::clone(&shutdown)), shutdown)
    }

    /// Servicio con una demora distinta a la estándar (tests)
    pub fn with_delay(delay: Duration) -> Self {
        let shutdown = Arc::new(ShutdownCoordinator::new());
        Self::from_parts(JobRegistry::with_delay(Arc::clone(&shutdown), delay), shutdown)
    }

    fn from_parts(registry: JobRegistry, shutdown: Arc<ShutdownCoordinator>) -> Self {
        Self {
            registry,
            stats: StatsAccumulator::new(),
            shutdown,
        }
    }

    /// Envía un job y registra el tiempo de despacho
    ///
    /// Se mide solo la parte síncrona (admisión, id y agenda), no el hash.
    pub fn submit(&self, secret: String) -> Result<JobId, SubmitError> {
        let start = Instant::now();
        let id = self.registry.submit(secret)?;
        self.stats.record(start.elapsed());
        Ok(id)
    }

    pub fn fetch(&self, id: JobId) -> Option<String> {
        self.registry.fetch(id)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn request_drain(&self) -> bool {
        self.shutdown.request_drain()
    }

    pub fn is_draining(&self) -> bool {
        self.shutdown.is_draining()
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }
}

impl Default for HashService {
    fn default() -> Self {
        Self::new()
    }
}
