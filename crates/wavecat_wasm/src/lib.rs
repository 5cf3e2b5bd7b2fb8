//! WebAssembly bindings for the Wavecat engine.

mod engine;

pub use engine::WasmEngine;
