//! The `wavecat_core` crate provides the computation engine behind the Wavecat
//! diffraction catastrophe viewer. It evaluates catastrophe integrals over a
//! plane of two control parameters and produces a grid of module/phase values.
//!
//! Key components:
//! - **Traits**: `StateScalar` (real or complex state), `DynamicalSystem` (ODE right-hand sides), `Steppable` (Solvers).
//! - **Solvers**: fixed-step RK4 over stack buffers, shared by the real and complex equation kinds.
//! - **Registry**: model descriptors, lookup by name and fabrication of runnable instances.
//! - **Scheduler**: sequential and partitioned parallel grid sweeps.
//! - **Cache**: per-model memoization of computed points under a shared byte budget.
//! - **Models**: the built-in catastrophes (A3, B3, C3).

pub mod cache;
pub mod catastrophe;
pub mod config;
pub mod equation;
pub mod error;
pub mod grid;
pub mod models;
pub mod registry;
pub mod request;
pub mod scheduler;
pub mod solvers;
pub mod traits;
pub mod vector;

pub use catastrophe::{Instance, ModelDescriptor, Parameter, Variable};
pub use config::{EngineSettings, SweepMode, SweepSettings};
pub use error::{CatastropheError, Result};
pub use grid::{Component, GridProjection, Point, PointGrid};
pub use registry::Registry;
