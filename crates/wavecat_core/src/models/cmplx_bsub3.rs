//! Boundary cusp catastrophe (B3) with the auxiliary exponent `k`.

use super::{complex_point, GAMMA_1_3, GAMMA_2_3, LAMBDA_1, LAMBDA_2, LAMBDA_NAMES};
use crate::catastrophe::{Instance, ModelDescriptor};
use crate::equation::DerivativeContext;
use crate::error::Result;
use num_complex::Complex64;
use std::f64::consts::PI;

pub const NAME: &str = "Bsub3";

/// Index of `k` among the bound variables.
pub const K: usize = 0;

const V: usize = 0;
const V1: usize = 1;

const STEP: f64 = 0.01;

pub fn derivative(ctx: &DerivativeContext<'_, Complex64>, t: f64, y: &[Complex64], f: &mut [Complex64]) {
    let i = Complex64::i();
    let p1 = ctx.param(LAMBDA_1);
    let p2 = ctx.param(LAMBDA_2);
    let k = ctx.var(K);
    let l1 = p1 * t;
    let l2 = p2 * t;

    let u11 = (k / 3.0) * (l1 * y[V] - 2.0 * i * l2 * y[V1] - i);
    let u12 = -(k * i / 3.0) * (y[V] + l1 * y[V1] - 2.0 * i * l2 * u11);

    f[V] = p1 * y[V1] + p2 * (-i * u11);
    f[V1] = p1 * u11 + p2 * u12;
}

pub fn calculate(instance: &mut Instance, i: usize, j: usize) -> Result<()> {
    let k = instance.var(K);
    instance.equation_mut::<Complex64>()?.set_initial(&[
        GAMMA_1_3 / 3.0 * Complex64::cis(k * PI / 6.0),
        Complex64::i() / 3.0 * GAMMA_2_3 * Complex64::cis(k * PI / 3.0),
    ]);

    instance.integrate::<Complex64>(0.0, 1.0, STEP)?;

    let value = instance.equation_mut::<Complex64>()?.result(V);
    instance.set_point(i, j, complex_point(value));
    Ok(())
}

pub fn descriptor() -> ModelDescriptor {
    ModelDescriptor::complex(NAME, 2, derivative, calculate)
        .with_parameter_names(&LAMBDA_NAMES)
        .with_variable_names(&["k"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catastrophe::{Parameter, Variable};
    use crate::models::testing::{builtin_registry, lambda_plane};

    fn assert_err_contains<T: std::fmt::Debug>(result: Result<T>, needle: &str) {
        let err = result.expect_err("expected an error");
        let message = err.to_string();
        assert!(
            message.contains(needle),
            "expected error containing '{needle}', got '{message}'"
        );
    }

    #[test]
    fn missing_k_is_an_unbound_variable() {
        let registry = builtin_registry();
        assert_err_contains(
            registry.fabricate_by_name(NAME, &lambda_plane(2, 2), &[]),
            "unbound variable 'k'",
        );
    }

    #[test]
    fn origin_reproduces_the_initial_value() {
        let registry = builtin_registry();
        let mut origin = registry
            .fabricate_by_name(
                NAME,
                &[Parameter::range("l1", 0.0, 1.0, 2), Parameter::range("l2", 0.0, 1.0, 2)],
                &[Variable::new("k", 2.0)],
            )
            .expect("instance");
        calculate(&mut origin, 0, 0).expect("calculate");
        let point = origin.point(0, 0);
        assert!((point.module - GAMMA_1_3 / 3.0).abs() < 1e-12);
        assert!((point.phase - 60.0).abs() < 1e-9);
    }

    #[test]
    fn variable_k_changes_the_result() {
        let registry = builtin_registry();
        let mut results = Vec::new();
        for k in [1.0, 2.0] {
            let mut instance = registry
                .fabricate_by_name(NAME, &lambda_plane(2, 2), &[Variable::new("k", k)])
                .expect("instance");
            calculate(&mut instance, 1, 1).expect("calculate");
            results.push(instance.point(1, 1));
        }
        assert_ne!(results[0], results[1]);
    }
}
