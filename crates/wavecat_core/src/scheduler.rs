//! Grid sweeps: a sequential row-major loop and a partitioned parallel loop
//! that runs the sequential one on scoped worker threads.

use crate::catastrophe::{Instance, Parameter, SweepState, Variable};
use crate::config::{SweepMode, SweepSettings, BLOWUP_LIMIT};
use crate::error::{CatastropheError, Result};
use crate::grid::PointGrid;
use crate::registry::Model;
use std::sync::Arc;
use std::thread;

/// Populates every cell of `instance`'s grid according to `settings`.
pub fn sweep(instance: &mut Instance, settings: &SweepSettings) -> Result<()> {
    match settings.mode {
        SweepMode::Sequential => loop_seq(instance, settings.use_cache),
        SweepMode::Parallel => loop_smp(instance, settings),
    }
}

fn ensure_idle(instance: &Instance) -> Result<()> {
    if instance.sweep_state() != SweepState::Idle {
        return Err(CatastropheError::SweepAlreadyRun);
    }
    Ok(())
}

fn finish(instance: &mut Instance, outcome: Result<()>) -> Result<()> {
    match &outcome {
        Ok(()) => {
            instance.set_sweep_state(SweepState::Succeeded);
            let cache = instance.model().cache();
            tracing::info!(
                model = instance.name(),
                cache_entries = cache.len(),
                cache_bytes = cache.budget().allocated_bytes(),
                "sweep finished"
            );
        }
        Err(err) => {
            instance.set_sweep_state(SweepState::Failed);
            tracing::info!(model = instance.name(), error = %err, "sweep failed");
        }
    }
    outcome
}

/// Single-threaded sweep over `(i, j)` in row-major order.
pub fn loop_seq(instance: &mut Instance, use_cache: bool) -> Result<()> {
    ensure_idle(instance)?;
    tracing::info!(
        model = instance.name(),
        rows = instance.parameters()[instance.pair().first].steps,
        columns = instance.parameters()[instance.pair().second].steps,
        use_cache,
        "sequential sweep started"
    );
    instance.set_sweep_state(SweepState::Running { workers: 1 });
    let outcome = sweep_cells(instance, use_cache);
    finish(instance, outcome)
}

fn sweep_cells(instance: &mut Instance, use_cache: bool) -> Result<()> {
    let pair = instance.pair();
    let first = instance.parameters()[pair.first].clone();
    let second = instance.parameters()[pair.second].clone();
    let (step_x, step_y) = (first.step_size(), second.step_size());
    let model = Arc::clone(instance.model());
    let calculate = model.descriptor().calculate();
    let cache = model.cache();

    for i in 0..first.steps {
        instance.parameter_mut(pair.first).current = first.min + i as f64 * step_x;
        for j in 0..second.steps {
            instance.parameter_mut(pair.second).current = second.min + j as f64 * step_y;

            let key = use_cache.then(|| instance.cache_key());
            if let Some(point) = key.as_ref().and_then(|key| cache.lookup(key)) {
                instance.set_point(i, j, point);
                continue;
            }

            calculate(instance, i, j)?;
            let point = instance.point(i, j);
            // NaN fails the range check too.
            if !(-BLOWUP_LIMIT..=BLOWUP_LIMIT).contains(&point.module) {
                return Err(CatastropheError::NumericBlowup {
                    i,
                    j,
                    module: point.module,
                });
            }
            if let Some(key) = key {
                cache.insert(key, point);
            }
        }
    }
    Ok(())
}

/// Parameters for partition `index`: the first alterable parameter narrowed
/// to `rows` steps starting at row `index * rows`.
fn partition_parameters(
    parameters: &[Parameter],
    first: usize,
    index: usize,
    rows: usize,
) -> Vec<Parameter> {
    let base = &parameters[first];
    let step = base.step_size();
    let mut narrowed = parameters.to_vec();
    let p = &mut narrowed[first];
    p.min = base.min + (index * rows) as f64 * step;
    p.max = p.min + rows as f64 * step;
    p.steps = rows;
    p.current = p.min;
    narrowed
}

fn run_partition(
    model: &Arc<Model>,
    parameters: &[Parameter],
    variables: &[Variable],
    use_cache: bool,
) -> Result<PointGrid> {
    let fabricate = model.descriptor().fabricator();
    let mut part = fabricate(model, parameters, variables)?;
    part.set_sweep_state(SweepState::Running { workers: 1 });
    sweep_cells(&mut part, use_cache)?;
    Ok(part.take_grid())
}

/// Parallel sweep: the rows of the first alterable parameter are split into
/// `workers` contiguous partitions of `steps / workers` rows each. Rows left
/// over by the division are not computed and keep the zero point.
pub fn loop_smp(instance: &mut Instance, settings: &SweepSettings) -> Result<()> {
    ensure_idle(instance)?;
    instance.set_sweep_state(SweepState::Partitioning);
    let outcome = run_partitions(instance, settings);
    finish(instance, outcome)
}

fn run_partitions(instance: &mut Instance, settings: &SweepSettings) -> Result<()> {
    let pair = instance.pair();
    let steps = instance.parameters()[pair.first].steps;
    let workers = settings.effective_workers().min(steps);
    let rows = steps / workers;
    let dropped = steps - rows * workers;

    tracing::info!(
        model = instance.name(),
        rows = steps,
        columns = instance.parameters()[pair.second].steps,
        workers,
        use_cache = settings.use_cache,
        "parallel sweep started"
    );
    if dropped > 0 {
        tracing::warn!(
            steps,
            workers,
            dropped,
            "row count is not a multiple of the worker count; trailing rows are not computed"
        );
    }

    let partitions: Vec<Vec<Parameter>> = (0..workers)
        .map(|k| partition_parameters(instance.parameters(), pair.first, k, rows))
        .collect();
    let model = Arc::clone(instance.model());
    let variables = instance.variables().to_vec();
    let use_cache = settings.use_cache;

    instance.set_sweep_state(SweepState::Running { workers });
    let (outcomes, spawn_error) = thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        let mut spawn_error = None;
        for (k, parameters) in partitions.iter().enumerate() {
            let (model, variables) = (&model, &variables);
            tracing::debug!(
                partition = k,
                first_row = k * rows,
                rows,
                min = parameters[pair.first].min,
                max = parameters[pair.first].max,
                "spawning partition worker"
            );
            let spawned = thread::Builder::new()
                .name(format!("wavecat-sweep-{k}"))
                .spawn_scoped(scope, move || {
                    run_partition(model, parameters, variables, use_cache)
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    spawn_error = Some(CatastropheError::ThreadSpawnFailure(err.to_string()));
                    break;
                }
            }
        }

        let outcomes: Vec<Result<PointGrid>> = handles
            .into_iter()
            .enumerate()
            .map(|(k, handle)| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(CatastropheError::WorkerPanicked(k)))
            })
            .collect();
        (outcomes, spawn_error)
    });

    instance.set_sweep_state(SweepState::Joining);
    join_partitions(instance.grid_mut(), rows, outcomes, spawn_error)
}

/// Copies each successful partition into `grid` at its first row. A spawn
/// failure wins over partition errors; otherwise the first failing partition
/// in row order is reported, with blow-up rows translated to grid rows.
fn join_partitions(
    grid: &mut PointGrid,
    rows: usize,
    outcomes: Vec<Result<PointGrid>>,
    spawn_error: Option<CatastropheError>,
) -> Result<()> {
    if let Some(err) = spawn_error {
        return Err(err);
    }

    let mut first_error = None;
    for (k, outcome) in outcomes.into_iter().enumerate() {
        let first_row = k * rows;
        match outcome {
            Ok(part) => {
                tracing::debug!(partition = k, first_row, "joining partition");
                grid.copy_rows_from(&part, first_row);
            }
            Err(err) => {
                tracing::debug!(partition = k, error = %err, "partition failed");
                if first_error.is_none() {
                    first_error = Some(match err {
                        CatastropheError::NumericBlowup { i, j, module } => {
                            CatastropheError::NumericBlowup {
                                i: first_row + i,
                                j,
                                module,
                            }
                        }
                        other => other,
                    });
                }
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
