//! JSON sweep requests and their grid responses.
//!
//! A request names a model and supplies its bindings:
//!
//! ```json
//! {"name": "Asub3", "params": {"l1": [-3.0, 3.0, 100], "l2": [-3.0, 3.0, 100]},
//!  "vars": {}, "mode": "phase"}
//! ```
//!
//! A scalar parameter is fixed, a `[min, max, steps]` triple is swept. Object
//! key order is kept so positional models bind in the order written.

use crate::catastrophe::{Parameter, Variable};
use crate::config::SweepSettings;
use crate::error::{CatastropheError, Result};
use crate::grid::{Component, GridProjection};
use crate::registry::Registry;
use crate::scheduler::sweep;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::marker::PhantomData;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParameterSpec {
    Fixed(f64),
    Range(f64, f64, usize),
}

impl ParameterSpec {
    pub fn to_parameter(self, name: &str) -> Parameter {
        match self {
            ParameterSpec::Fixed(value) => Parameter::fixed(name, value),
            ParameterSpec::Range(min, max, steps) => Parameter::range(name, min, max, steps),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SweepRequest {
    pub name: String,
    #[serde(default, deserialize_with = "ordered_entries")]
    pub params: Vec<(String, ParameterSpec)>,
    #[serde(default, deserialize_with = "ordered_entries")]
    pub vars: Vec<(String, f64)>,
    #[serde(default)]
    pub mode: Component,
}

impl SweepRequest {
    pub fn parameters(&self) -> Vec<Parameter> {
        self.params
            .iter()
            .map(|(name, spec)| spec.to_parameter(name))
            .collect()
    }

    pub fn variables(&self) -> Vec<Variable> {
        self.vars
            .iter()
            .map(|(name, value)| Variable::new(name.as_str(), *value))
            .collect()
    }
}

/// Deserializes a JSON object into its entries in document order.
fn ordered_entries<'de, D, V>(deserializer: D) -> std::result::Result<Vec<(String, V)>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct EntriesVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
        type Value = Vec<(String, V)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a JSON object")
        }

        fn visit_map<A: MapAccess<'de>>(
            self,
            mut map: A,
        ) -> std::result::Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(EntriesVisitor(PhantomData))
}

pub fn parse_request(json: &str) -> Result<SweepRequest> {
    serde_json::from_str(json).map_err(|err| CatastropheError::InvalidRequest(err.to_string()))
}

/// Fabricates the requested model, sweeps it and projects the chosen component.
pub fn handle_request(
    registry: &Registry,
    request: &SweepRequest,
    settings: &SweepSettings,
) -> Result<GridProjection> {
    if request.name.is_empty() {
        return Err(CatastropheError::EmptyModelName);
    }
    let model = registry
        .find(&request.name)
        .ok_or_else(|| CatastropheError::UnknownModel(request.name.clone()))?;

    let expected = model.descriptor().parameters().count();
    if request.params.len() != expected {
        return Err(CatastropheError::ParameterCountMismatch {
            expected,
            got: request.params.len(),
        });
    }

    let fabricate = model.descriptor().fabricator();
    let mut instance = fabricate(&model, &request.parameters(), &request.variables())?;
    sweep(&mut instance, settings)?;
    instance
        .grid()
        .map(|grid| grid.project(request.mode))
        .ok_or_else(|| CatastropheError::InvalidRequest("sweep produced no grid".into()))
}

/// Parses `json`, runs the request and serializes the projection.
pub fn process_json(registry: &Registry, json: &str, settings: &SweepSettings) -> Result<String> {
    let request = parse_request(json)?;
    let projection = handle_request(registry, &request, settings)?;
    serde_json::to_string(&projection).map_err(|err| CatastropheError::InvalidRequest(err.to_string()))
}
