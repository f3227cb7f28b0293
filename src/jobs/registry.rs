//! # Registro de Jobs Asíncronos
//! src/jobs/registry.rs
//!
//! Asigna ids crecientes, agenda el cálculo diferido del digest y guarda los
//! resultados terminados.
//!
//! ```text
//! submit(secret) ──► admit() ──► spawn thread ──► id = next_id + 1 ──► id_tx.send(id)
//!        │                            │
//!        │                  id_rx.recv() ──► sleep(delay) ──► digest ──► results[id]
//!        │                                                                  │
//!        └──► retorna id (sin esperar)                               drop(permit)
//! ```
//!
//! El thread se crea antes de asignar el id: si el sistema no puede crearlo,
//! el submit falla sin consumir ningún id.
//!
//! Un id aparece en `results` si y solo si su cálculo terminó; los jobs
//! pendientes simplemente no están en el mapa.

use crate::jobs::digest::hash_password;
use crate::shutdown::ShutdownCoordinator;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Demora fija antes de materializar el digest
pub const HASH_DELAY: Duration = Duration::from_secs(30);

/// Identificador de job, nunca reutilizado
pub type JobId = u64;

/// Errores al enviar un job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("server is draining, new jobs are rejected")]
    Draining,

    /// El sistema no pudo crear el thread del job
    #[error("could not start a thread for the job")]
    Spawn,
}

/// Registro de jobs compartido entre requests y tareas diferidas
#[derive(Debug)]
pub struct JobRegistry {
    /// Último id asignado (0 = ninguno)
    last_id: AtomicU64,

    results: Arc<DashMap<JobId, String>>,

    shutdown: Arc<ShutdownCoordinator>,

    delay: Duration,
}

impl JobRegistry {
    /// Crea un registro con la demora estándar [`HASH_DELAY`]
    pub fn new(shutdown: Arc<ShutdownCoordinator>) -> Self {
        Self::with_delay(shutdown, HASH_DELAY)
    }

    /// Crea un registro con otra demora (usado por los tests)
    pub fn with_delay(shutdown: Arc<ShutdownCoordinator>, delay: Duration) -> Self {
        Self {
            last_id: AtomicU64::new(0),
            results: Arc::new(DashMap::new()),
            shutdown,
            delay,
        }
    }

    /// Envía un secreto y retorna su id sin esperar el cálculo
    ///
    /// Si el servidor está drenando, o no se pudo crear el thread del job, no
    /// se asigna id.
    pub fn submit(&self, secret: String) -> Result<JobId, SubmitError> {
        let permit = self.shutdown.admit().ok_or(SubmitError::Draining)?;

        let (id_tx, id_rx) = mpsc::channel::<JobId>();
        let results = Arc::clone(&self.results);
        let delay = self.delay;

        // Si el spawn falla, el closure (y el permit) se liberan acá mismo
        thread::Builder::new()
            .name("hash-job".to_string())
            .spawn(move || {
                let Ok(id) = id_rx.recv() else {
                    return;
                };
                thread::sleep(delay);

                let digest = hash_password(secret.as_bytes());
                if results.insert(id, digest).is_some() {
                    log::error!("Job id {} completed twice, aborting", id);
                    std::process::abort();
                }

                log::info!("Job {} completed", id);
                drop(permit);
            })
            .map_err(|e| {
                log::error!("Failed to spawn job thread: {}", e);
                SubmitError::Spawn
            })?;

        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!("Job {} scheduled (delay {:?})", id, delay);

        if id_tx.send(id).is_err() {
            log::error!("Job thread for id {} exited before receiving it, aborting", id);
            std::process::abort();
        }

        Ok(id)
    }

    /// Busca el digest de un job terminado
    ///
    /// `None` tanto para ids desconocidos como para jobs aún pendientes.
    pub fn fetch(&self, id: JobId) -> Option<String> {
        self.results.get(&id).map(|digest| digest.value().clone())
    }

    /// Último id asignado (0 si todavía no hubo submissions)
    pub fn last_id(&self) -> JobId {
        self.last_id.load(Ordering::SeqCst)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const TEST_DELAY: Duration = Duration::from_millis(100);

    fn registry() -> (JobRegistry, Arc<ShutdownCoordinator>) {
        let shutdown = Arc::new(ShutdownCoordinator::new());
        let registry = JobRegistry::with_delay(Arc::clone(&shutdown), TEST_DELAY);
        (registry, shutdown)
    }

    #[test]
    fn test_default_delay() {
        let registry = JobRegistry::new(Arc::new(ShutdownCoordinator::new()));
        assert_eq!(registry.delay(), HASH_DELAY);
        assert_eq!(registry.last_id(), 0);
    }

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let (registry, _) = registry();

        assert_eq!(registry.submit("a".to_string()), Ok(1));
        assert_eq!(registry.submit("b".to_string()), Ok(2));
        assert_eq!(registry.submit("c".to_string()), Ok(3));
        assert_eq!(registry.last_id(), 3);
    }

    #[test]
    fn test_fetch_before_and_after_delay() {
        let (registry, shutdown) = registry();

        let id = registry.submit("angryMonkey".to_string()).unwrap();
        assert_eq!(registry.fetch(id), None);

        assert!(shutdown.wait_for_idle_timeout(Duration::from_secs(5)));
        assert_eq!(registry.fetch(id), Some(hash_password("angryMonkey")));
    }

    #[test]
    fn test_fetch_unknown_id() {
        let (registry, _) = registry();
        assert_eq!(registry.fetch(0), None);
        assert_eq!(registry.fetch(999), None);
    }

    #[test]
    fn test_outstanding_tracks_pending_jobs() {
        let (registry, shutdown) = registry();

        registry.submit("a".to_string()).unwrap();
        registry.submit("b".to_string()).unwrap();
        assert_eq!(shutdown.outstanding(), 2);

        assert!(shutdown.wait_for_idle_timeout(Duration::from_secs(5)));
        assert_eq!(shutdown.outstanding(), 0);
    }

    #[test]
    fn test_submit_rejected_while_draining() {
        let (registry, shutdown) = registry();

        registry.submit("before".to_string()).unwrap();
        shutdown.request_drain();

        assert_eq!(registry.submit("after".to_string()), Err(SubmitError::Draining));
        assert_eq!(registry.last_id(), 1);

        // El job previo al drenado termina igual
        assert!(shutdown.wait_for_idle_timeout(Duration::from_secs(5)));
        assert_eq!(registry.fetch(1), Some(hash_password("before")));
    }

    #[test]
    fn test_submit_error_messages() {
        assert_eq!(
            SubmitError::Draining.to_string(),
            "server is draining, new jobs are rejected"
        );
        assert_eq!(
            SubmitError::Spawn.to_string(),
            "could not start a thread for the job"
        );
    }

    #[test]
    fn test_concurrent_submissions_are_unique_and_gap_free() {
        let shutdown = Arc::new(ShutdownCoordinator::new());
        let registry = Arc::new(JobRegistry::with_delay(
            Arc::clone(&shutdown),
            Duration::from_millis(10),
        ));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    (0..25)
                        .map(|i| registry.submit(format!("{}-{}", t, i)).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let ids: HashSet<JobId> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();

        assert_eq!(ids.len(), 200);
        assert_eq!(ids, (1..=200).collect::<HashSet<_>>());

        assert!(shutdown.wait_for_idle_timeout(Duration::from_secs(10)));
        for id in 1..=200 {
            assert!(registry.fetch(id).is_some());
        }
    }
}
