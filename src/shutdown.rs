//! # Coordinador de Apagado
//! src/shutdown.rs
//!
//! Secuencia el drenado cooperativo del servidor:
//!
//! ```text
//! ACCEPTING ──request_drain()──► DRAINING (terminal)
//! ```
//!
//! 1. `wait_for_drain_request()` bloquea hasta que llega el primer pedido de drenado
//! 2. A partir de ahí el dispatcher rechaza todo con 503 y `admit()` deja de emitir permisos
//! 3. `wait_for_idle()` bloquea hasta que todo job admitido haya liberado su permiso
//!
//! La admisión y la transición a DRAINING se serializan con el mismo lock del
//! contador de trabajo pendiente: ningún job puede quedar admitido después de
//! que el waiter haya visto el contador en cero.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

/// Estado de apagado compartido por todo el proceso
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    /// Monótono: false → true
    draining: AtomicBool,

    /// Jobs admitidos que todavía no terminaron
    outstanding: Mutex<u64>,
    idle: Condvar,

    /// Señal one-shot "drenado solicitado"
    drain_fired: Mutex<bool>,
    drain_signal: Condvar,
}

/// Permiso de trabajo pendiente; al soltarlo se descuenta del contador
#[derive(Debug)]
#[must_use = "dropping the permit marks the job as finished"]
pub struct WorkPermit {
    coordinator: Arc<ShutdownCoordinator>,
}

impl Drop for WorkPermit {
    fn drop(&mut self) {
        self.coordinator.release();
    }
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::SeqCst)
    }

    /// Cantidad de jobs admitidos que aún no terminaron
    pub fn outstanding(&self) -> u64 {
        *self.lock_outstanding()
    }

    /// Admite un job nuevo si no estamos drenando
    pub fn admit(self: &Arc<Self>) -> Option<WorkPermit> {
        let mut outstanding = self.lock_outstanding();

        if self.is_draining() {
            return None;
        }

        *outstanding += 1;
        Some(WorkPermit {
            coordinator: Arc::clone(self),
        })
    }

    /// Pasa a DRAINING y dispara la señal de drenado
    ///
    /// Retorna `true` solo para la llamada que hizo la transición; las demás
    /// no tienen efecto.
    pub fn request_drain(&self) -> bool {
        {
            let _outstanding = self.lock_outstanding();
            if self.draining.swap(true, Ordering::SeqCst) {
                log::debug!("Drain already requested, ignoring");
                return false;
            }
        }

        let mut fired = self.drain_fired.lock().expect("drain signal lock poisoned");
        if *fired {
            return false;
        }
        *fired = true;
        self.drain_signal.notify_all();

        log::info!("Drain requested: rejecting new jobs");
        true
    }

    /// Bloquea hasta que se solicite el drenado
    pub fn wait_for_drain_request(&self) {
        let fired = self.drain_fired.lock().expect("drain signal lock poisoned");
        let _fired = self
            .drain_signal
            .wait_while(fired, |fired| !*fired)
            .expect("drain signal lock poisoned");
    }

    /// Igual que [`Self::wait_for_drain_request`] con límite de tiempo
    ///
    /// Retorna `true` si el drenado fue solicitado.
    pub fn wait_for_drain_request_timeout(&self, timeout: Duration) -> bool {
        let fired = self.drain_fired.lock().expect("drain signal lock poisoned");
        let (fired, _) = self
            .drain_signal
            .wait_timeout_while(fired, timeout, |fired| !*fired)
            .expect("drain signal lock poisoned");
        *fired
    }

    /// Bloquea hasta que no quede trabajo pendiente
    pub fn wait_for_idle(&self) {
        let outstanding = self.lock_outstanding();
        let _outstanding = self
            .idle
            .wait_while(outstanding, |outstanding| *outstanding > 0)
            .expect("outstanding lock poisoned");
    }

    /// Igual que [`Self::wait_for_idle`] con límite de tiempo
    ///
    /// Retorna `true` si el contador llegó a cero.
    pub fn wait_for_idle_timeout(&self, timeout: Duration) -> bool {
        let outstanding = self.lock_outstanding();
        let (outstanding, _) = self
            .idle
            .wait_timeout_while(outstanding, timeout, |outstanding| *outstanding > 0)
            .expect("outstanding lock poisoned");
        *outstanding == 0
    }

    /// Secuencia de apagado del proceso: esperar el pedido, luego el drenado
    pub fn wait_for_shutdown(&self) {
        self.wait_for_drain_request();
        log::info!(
            "Server shutdown: started ({} jobs outstanding)",
            self.outstanding()
        );

        self.wait_for_idle();
        log::info!("Server shutdown: finished");
    }

    fn release(&self) {
        let mut outstanding = self.lock_outstanding();

        match outstanding.checked_sub(1) {
            Some(remaining) => *outstanding = remaining,
            None => {
                log::error!("Outstanding job counter underflow, aborting");
                std::process::abort();
            }
        }

        if *outstanding == 0 {
            self.idle.notify_all();
        }
    }

    fn lock_outstanding(&self) -> MutexGuard<'_, u64> {
        self.outstanding.lock().expect("outstanding lock poisoned")
    }
}
