use thiserror::Error;

/// Errors raised while fabricating instances or sweeping their grids.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatastropheError {
    #[error("unbound parameter '{0}'")]
    UnboundParameter(String),

    #[error("unbound variable '{0}'")]
    UnboundVariable(String),

    /// Exactly two parameters must have `steps > 0` and `min != max`.
    #[error("expected exactly two alterable parameters, found {found}")]
    NoAlterablePair { found: usize },

    #[error("allocation failure: {0}")]
    AllocationFailure(String),

    #[error("numeric blow-up at cell ({i}, {j}): module = {module}")]
    NumericBlowup { i: usize, j: usize, module: f64 },

    #[error("failed to spawn worker thread: {0}")]
    ThreadSpawnFailure(String),

    #[error("worker thread for partition {0} panicked")]
    WorkerPanicked(usize),

    #[error("catastrophe model '{0}' is not registered")]
    UnknownModel(String),

    #[error("model name cannot be empty")]
    EmptyModelName,

    #[error("incorrect number of parameters: expected {expected}, got {got}")]
    ParameterCountMismatch { expected: usize, got: usize },

    #[error("too many {what}: {requested} exceeds the limit of {limit}")]
    CapacityExceeded {
        what: &'static str,
        requested: usize,
        limit: usize,
    },

    #[error("equation kind mismatch: model is {expected}, integrator is {requested}")]
    EquationKindMismatch {
        expected: &'static str,
        requested: &'static str,
    },

    #[error("integration step must be positive and finite, got {0}")]
    InvalidStep(f64),

    #[error("sweep already ran on this instance")]
    SweepAlreadyRun,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

pub type Result<T> = std::result::Result<T, CatastropheError>;
