//! Model registry and default instance fabrication.

use crate::cache::{CacheBudget, ResultCache};
use crate::catastrophe::{
    AlterablePair, Instance, ModelDerivative, ModelDescriptor, Parameter, Signature, Variable,
};
use crate::config::{DEFAULT_CACHE_BUDGET_BYTES, MAX_PARAMETERS, MAX_VARIABLES};
use crate::equation::{ComplexEquation, Equation, RealEquation};
use crate::error::{CatastropheError, Result};
use crate::grid::PointGrid;
use std::sync::Arc;

/// A registered descriptor together with the result cache it owns.
#[derive(Debug)]
pub struct Model {
    descriptor: ModelDescriptor,
    cache: ResultCache,
}

impl Model {
    pub fn descriptor(&self) -> &ModelDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }
}

/// Ordered set of models. Lookup returns the first registered match.
#[derive(Debug)]
pub struct Registry {
    models: Vec<Arc<Model>>,
    budget: Arc<CacheBudget>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_BUDGET_BYTES)
    }
}

impl Registry {
    /// Every cache created by this registry shares one `cache_budget_bytes` ceiling.
    pub fn new(cache_budget_bytes: usize) -> Self {
        Self {
            models: Vec::new(),
            budget: Arc::new(CacheBudget::new(cache_budget_bytes)),
        }
    }

    pub fn register(&mut self, descriptor: ModelDescriptor) -> Arc<Model> {
        tracing::debug!(
            name = descriptor.name(),
            kind = %descriptor.kind(),
            "registering model"
        );
        let model = Arc::new(Model {
            descriptor,
            cache: ResultCache::new(Arc::clone(&self.budget)),
        });
        self.models.push(Arc::clone(&model));
        model
    }

    pub fn find(&self, name: &str) -> Option<Arc<Model>> {
        self.models.iter().find(|m| m.name() == name).cloned()
    }

    /// Removes `model` from the registry. Instances already holding it keep working.
    pub fn unregister(&mut self, model: &Arc<Model>) -> bool {
        let before = self.models.len();
        self.models.retain(|m| !Arc::ptr_eq(m, model));
        self.models.len() != before
    }

    pub fn names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn budget(&self) -> &Arc<CacheBudget> {
        &self.budget
    }

    /// Looks `name` up and fabricates an instance through the model's fabricator.
    pub fn fabricate_by_name(
        &self,
        name: &str,
        parameters: &[Parameter],
        variables: &[Variable],
    ) -> Result<Instance> {
        let model = self
            .find(name)
            .ok_or_else(|| CatastropheError::UnknownModel(name.to_string()))?;
        let fabricate = model.descriptor().fabricator();
        fabricate(&model, parameters, variables)
    }
}

fn check_capacity(what: &'static str, requested: usize, limit: usize) -> Result<()> {
    if requested > limit {
        return Err(CatastropheError::CapacityExceeded {
            what,
            requested,
            limit,
        });
    }
    Ok(())
}

fn bind_parameters(signature: &Signature, supplied: &[Parameter]) -> Result<Vec<Parameter>> {
    match signature {
        Signature::Named(names) => names
            .iter()
            .map(|name| {
                supplied
                    .iter()
                    .find(|p| &p.name == name)
                    .cloned()
                    .ok_or_else(|| CatastropheError::UnboundParameter(name.clone()))
            })
            .collect(),
        Signature::Positional(count) => (0..*count)
            .map(|idx| {
                supplied
                    .get(idx)
                    .cloned()
                    .ok_or_else(|| CatastropheError::UnboundParameter(format!("#{idx}")))
            })
            .collect(),
    }
}

fn bind_variables(signature: &Signature, supplied: &[Variable]) -> Result<Vec<Variable>> {
    match signature {
        Signature::Named(names) => names
            .iter()
            .map(|name| {
                supplied
                    .iter()
                    .find(|v| &v.name == name)
                    .cloned()
                    .ok_or_else(|| CatastropheError::UnboundVariable(name.clone()))
            })
            .collect(),
        Signature::Positional(count) => (0..*count)
            .map(|idx| {
                supplied
                    .get(idx)
                    .cloned()
                    .ok_or_else(|| CatastropheError::UnboundVariable(format!("#{idx}")))
            })
            .collect(),
    }
}

/// Default fabricator: binds parameters and variables to the descriptor's
/// signature, builds the equation state of the model's kind, locates the
/// alterable pair and allocates the output grid.
pub fn fabricate(
    model: &Arc<Model>,
    parameters: &[Parameter],
    variables: &[Variable],
) -> Result<Instance> {
    let descriptor = model.descriptor();
    check_capacity("parameters", descriptor.parameters().count(), MAX_PARAMETERS)?;
    check_capacity("variables", descriptor.variables().count(), MAX_VARIABLES)?;

    let parameters = bind_parameters(descriptor.parameters(), parameters)?;
    let variables = bind_variables(descriptor.variables(), variables)?;

    let equation = match descriptor.derivative() {
        ModelDerivative::Real(function) => {
            Equation::Real(RealEquation::new(function, descriptor.num_equations())?)
        }
        ModelDerivative::Complex(function) => {
            Equation::Complex(ComplexEquation::new(function, descriptor.num_equations())?)
        }
    };

    let pair = AlterablePair::find(&parameters)?;
    let (x, y) = (&parameters[pair.first], &parameters[pair.second]);
    let grid = PointGrid::try_new(x.min, x.max, x.steps, y.min, y.max, y.steps)?;

    Ok(Instance::new(
        Arc::clone(model),
        parameters,
        variables,
        equation,
        grid,
        pair,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catastrophe::SweepState;
    use crate::equation::DerivativeContext;
    use crate::grid::Point;

    fn zero(_ctx: &DerivativeContext<'_, f64>, _t: f64, _y: &[f64], f: &mut [f64]) {
        f[0] = 0.0;
    }

    fn noop(instance: &mut Instance, i: usize, j: usize) -> Result<()> {
        instance.set_point(i, j, Point::default());
        Ok(())
    }

    fn descriptor(name: &str) -> ModelDescriptor {
        ModelDescriptor::real(name, 1, zero, noop)
            .with_parameter_names(&["a", "b", "c"])
            .with_variable_names(&["k"])
    }

    fn supplied() -> (Vec<Parameter>, Vec<Variable>) {
        (
            vec![
                Parameter::range("b", 0.0, 1.0, 4),
                Parameter::fixed("c", 2.0),
                Parameter::range("a", -1.0, 1.0, 3),
            ],
            vec![Variable::new("k", 1.0)],
        )
    }

    fn assert_err_contains<T: std::fmt::Debug>(result: Result<T>, needle: &str) {
        let err = result.expect_err("expected an error");
        let message = err.to_string();
        assert!(
            message.contains(needle),
            "expected error containing '{needle}', got '{message}'"
        );
    }

    #[test]
    fn find_returns_first_registered_match() {
        let mut registry = Registry::default();
        let first = registry.register(descriptor("dup"));
        registry.register(descriptor("dup"));
        let found = registry.find("dup").expect("model");
        assert!(Arc::ptr_eq(&found, &first));
        assert!(registry.find("missing").is_none());
        assert_eq!(registry.names(), vec!["dup", "dup"]);
    }

    #[test]
    fn unregister_removes_only_that_model() {
        let mut registry = Registry::default();
        let first = registry.register(descriptor("dup"));
        let second = registry.register(descriptor("dup"));
        assert!(registry.unregister(&first));
        assert!(!registry.unregister(&first));
        let found = registry.find("dup").expect("model");
        assert!(Arc::ptr_eq(&found, &second));
    }

    #[test]
    fn named_binding_follows_descriptor_order() {
        let mut registry = Registry::default();
        registry.register(descriptor("m"));
        let (params, vars) = supplied();
        let instance = registry.fabricate_by_name("m", &params, &vars).expect("instance");
        let names: Vec<_> = instance.parameters().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(instance.pair().first, 0);
        assert_eq!(instance.pair().second, 1);
        assert_eq!(instance.sweep_state(), SweepState::Idle);
        assert!(instance.grid().is_none());
    }

    #[test]
    fn missing_bindings_are_reported_by_name() {
        let mut registry = Registry::default();
        registry.register(descriptor("m"));
        let (mut params, vars) = supplied();
        params.retain(|p| p.name != "c");
        assert_err_contains(registry.fabricate_by_name("m", &params, &vars), "'c'");

        let (params, _) = supplied();
        assert_err_contains(registry.fabricate_by_name("m", &params, &[]), "'k'");
    }

    #[test]
    fn positional_binding_takes_supplied_order() {
        let mut registry = Registry::default();
        registry.register(
            ModelDescriptor::real("p", 1, zero, noop)
                .with_positional_parameters(2)
                .with_positional_variables(0),
        );
        let params = vec![
            Parameter::range("x", 0.0, 1.0, 2),
            Parameter::range("y", 0.0, 1.0, 2),
            Parameter::fixed("ignored", 0.0),
        ];
        let instance = registry.fabricate_by_name("p", &params, &[]).expect("instance");
        assert_eq!(instance.parameters().len(), 2);

        assert_err_contains(registry.fabricate_by_name("p", &params[..1], &[]), "#1");
    }

    #[test]
    fn fabrication_requires_exactly_two_alterables() {
        let mut registry = Registry::default();
        registry.register(descriptor("m"));
        let params = vec![
            Parameter::fixed("a", 0.0),
            Parameter::range("b", 0.0, 1.0, 4),
            Parameter::fixed("c", 2.0),
        ];
        let err = registry
            .fabricate_by_name("m", &params, &[Variable::new("k", 0.0)])
            .expect_err("must fail");
        assert_eq!(err, CatastropheError::NoAlterablePair { found: 1 });
    }

    #[test]
    fn unknown_model_is_rejected() {
        let registry = Registry::default();
        assert_eq!(
            registry.fabricate_by_name("nope", &[], &[]).expect_err("must fail"),
            CatastropheError::UnknownModel("nope".into())
        );
    }

    #[test]
    fn caches_of_one_registry_share_a_budget() {
        let mut registry = Registry::new(1024);
        let a = registry.register(descriptor("a"));
        let b = registry.register(descriptor("b"));
        assert!(Arc::ptr_eq(a.cache().budget(), b.cache().budget()));
        assert_eq!(registry.budget().capacity_bytes(), 1024);
    }
}
