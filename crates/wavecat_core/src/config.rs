//! Capacities and tunables shared by the whole engine.

use serde::{Deserialize, Serialize};

/// Maximum number of parameters a model may declare.
pub const MAX_PARAMETERS: usize = 32;
/// Maximum number of auxiliary variables a model may declare.
pub const MAX_VARIABLES: usize = 32;
/// Maximum length of an equation state vector.
pub const MAX_EQUATIONS: usize = 32;
/// Number of scratch slots a model can stage between integration passes.
pub const MAX_STORAGE: usize = 32;

/// Default upper bound for memory held by result caches.
pub const DEFAULT_CACHE_BUDGET_BYTES: usize = 200 * 1024 * 1024;

/// A computed module outside `[-BLOWUP_LIMIT, BLOWUP_LIMIT]` aborts the sweep.
pub const BLOWUP_LIMIT: f64 = 100.0;

pub const DEFAULT_WORKERS: usize = 4;
pub const MAX_WORKERS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepMode {
    Sequential,
    Parallel,
}

/// Settings controlling a single grid sweep.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepSettings {
    pub mode: SweepMode,
    /// Number of worker threads in parallel mode, clamped to `1..=MAX_WORKERS`.
    pub workers: usize,
    /// When false every cache lookup is treated as a miss and nothing is inserted.
    pub use_cache: bool,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            mode: SweepMode::Parallel,
            workers: DEFAULT_WORKERS,
            use_cache: true,
        }
    }
}

impl SweepSettings {
    pub fn sequential() -> Self {
        Self {
            mode: SweepMode::Sequential,
            ..Self::default()
        }
    }

    pub fn parallel(workers: usize) -> Self {
        Self {
            mode: SweepMode::Parallel,
            workers,
            ..Self::default()
        }
    }

    pub fn effective_workers(&self) -> usize {
        self.workers.clamp(1, MAX_WORKERS)
    }
}

/// Process-level engine configuration assembled by the front ends.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub cache_budget_bytes: usize,
    pub sweep: SweepSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            cache_budget_bytes: DEFAULT_CACHE_BUDGET_BYTES,
            sweep: SweepSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_workers_is_clamped() {
        assert_eq!(SweepSettings::parallel(0).effective_workers(), 1);
        assert_eq!(SweepSettings::parallel(3).effective_workers(), 3);
        assert_eq!(SweepSettings::parallel(64).effective_workers(), MAX_WORKERS);
    }

    #[test]
    fn settings_deserialize_with_snake_case_mode() {
        let settings: SweepSettings =
            serde_json::from_str(r#"{"mode":"sequential","workers":2,"use_cache":false}"#)
                .expect("settings should parse");
        assert_eq!(settings.mode, SweepMode::Sequential);
        assert_eq!(settings.workers, 2);
        assert!(!settings.use_cache);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: EngineSettings =
            serde_json::from_str(r#"{"sweep":{"workers":2}}"#).expect("settings should parse");
        assert_eq!(settings.cache_budget_bytes, DEFAULT_CACHE_BUDGET_BYTES);
        assert_eq!(settings.sweep.mode, SweepMode::Parallel);
        assert_eq!(settings.sweep.workers, 2);
        assert!(settings.sweep.use_cache);
    }
}
