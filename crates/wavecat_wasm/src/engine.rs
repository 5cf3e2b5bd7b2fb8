//! Engine handle exposed to the browser front end.

use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wavecat_core::config::{EngineSettings, SweepMode};
use wavecat_core::models::register_builtin;
use wavecat_core::request::{handle_request, parse_request};
use wavecat_core::{CatastropheError, Registry, SweepSettings};

fn to_js_error(err: CatastropheError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
pub struct WasmEngine {
    registry: Registry,
    settings: SweepSettings,
    last_elapsed_ms: f64,
}

#[wasm_bindgen]
impl WasmEngine {
    /// `settings_val` is an optional `EngineSettings` object. Sweeps always
    /// run sequentially since wasm32 has no OS threads.
    #[wasm_bindgen(constructor)]
    pub fn new(settings_val: JsValue) -> Result<WasmEngine, JsValue> {
        console_error_panic_hook::set_once();

        let settings: EngineSettings = if settings_val.is_undefined() || settings_val.is_null() {
            EngineSettings::default()
        } else {
            from_value(settings_val)
                .map_err(|e| JsValue::from_str(&format!("Invalid engine settings: {}", e)))?
        };

        let mut registry = Registry::new(settings.cache_budget_bytes);
        register_builtin(&mut registry);

        Ok(WasmEngine {
            registry,
            settings: SweepSettings {
                mode: SweepMode::Sequential,
                ..settings.sweep
            },
            last_elapsed_ms: 0.0,
        })
    }

    pub fn model_names(&self) -> Vec<String> {
        self.registry.names().into_iter().map(String::from).collect()
    }

    /// Runs a JSON request and returns the projected grid
    /// (`{minX, maxX, minY, maxY, data, minZ, maxZ}`).
    pub fn compute(&mut self, request_json: &str) -> Result<JsValue, JsValue> {
        let started = js_sys::Date::now();
        let request = parse_request(request_json).map_err(to_js_error)?;
        let projection =
            handle_request(&self.registry, &request, &self.settings).map_err(to_js_error)?;
        self.last_elapsed_ms = js_sys::Date::now() - started;

        to_value(&projection).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Wall-clock duration of the last successful `compute` call.
    pub fn last_elapsed_ms(&self) -> f64 {
        self.last_elapsed_ms
    }

    /// Bytes currently held by the result caches of all models.
    pub fn cache_bytes(&self) -> f64 {
        self.registry.budget().allocated_bytes() as f64
    }
}
