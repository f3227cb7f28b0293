//! # Acumulador de Estadísticas
//! src/metrics/stats.rs
//!
//! Lleva el total de submissions y el promedio móvil del tiempo de despacho
//! (en microsegundos) sin guardar el historial de muestras.
//!
//! El promedio usa el total anterior como parte del divisor, así que el par
//! `(total, average)` se actualiza y se lee siempre bajo el mismo lock.

use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;

/// Snapshot consistente de las estadísticas
///
/// Se serializa como `{"Total":N,"Average":M}`, el formato que ya consumen
/// los clientes del servicio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatsSnapshot {
    /// Jobs enviados
    pub total: u64,

    /// Promedio del tiempo de despacho en microsegundos (truncado)
    pub average: u64,
}

/// Acumulador thread-safe de `(total, average)`
#[derive(Debug, Default)]
pub struct StatsAccumulator {
    inner: Mutex<StatsSnapshot>,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra una duración de despacho
    pub fn record(&self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.record_micros(micros);
    }

    /// Registra una muestra en microsegundos
    ///
    /// `average = (average * total + t) / (total + 1)`, truncando en cada paso.
    pub fn record_micros(&self, micros: u64) {
        let mut stats = self.inner.lock().expect("stats lock poisoned");

        let total_after = stats.total + 1;
        let sum = u128::from(stats.average) * u128::from(stats.total) + u128::from(micros);
        stats.average = (sum / u128::from(total_after)) as u64;
        stats.total = total_after;
    }

    /// Lee ambos campos atómicamente
    pub fn snapshot(&self) -> StatsSnapshot {
        *self.inner.lock().expect("stats lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_empty_snapshot() {
        let stats = StatsAccumulator::new();
        assert_eq!(stats.snapshot(), StatsSnapshot { total: 0, average: 0 });
    }

    #[test]
    fn test_running_average() {
        let stats = StatsAccumulator::new();

        stats.record_micros(10);
        assert_eq!(stats.snapshot(), StatsSnapshot { total: 1, average: 10 });

        stats.record_micros(20);
        assert_eq!(stats.snapshot(), StatsSnapshot { total: 2, average: 15 });

        stats.record_micros(30);
        assert_eq!(stats.snapshot(), StatsSnapshot { total: 3, average: 20 });
    }

    #[test]
    fn test_average_truncates() {
        let stats = StatsAccumulator::new();

        stats.record_micros(1);
        stats.record_micros(2);

        // (1 + 2) / 2 = 1.5 -> 1
        assert_eq!(stats.snapshot().average, 1);
    }

    #[test]
    fn test_record_duration_in_micros() {
        let stats = StatsAccumulator::new();

        stats.record(Duration::from_millis(3));
        stats.record(Duration::from_nanos(999));

        // 3000us y 0us
        assert_eq!(stats.snapshot(), StatsSnapshot { total: 2, average: 1500 });
    }

    #[test]
    fn test_large_samples_do_not_overflow() {
        let stats = StatsAccumulator::new();

        stats.record_micros(u64::MAX);
        stats.record_micros(u64::MAX);

        assert_eq!(stats.snapshot().average, u64::MAX);
    }

    #[test]
    fn test_concurrent_records() {
        let stats = Arc::new(StatsAccumulator::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        stats.record_micros(100);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.snapshot(), StatsSnapshot { total: 8000, average: 100 });
    }

    #[test]
    fn test_snapshot_serializes_pascal_case_keys() {
        let json = serde_json::to_string(&StatsSnapshot { total: 1, average: 42 }).unwrap();
        assert_eq!(json, r#"{"Total":1,"Average":42}"#);
    }
}
