use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum, ValueHint};
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wavecat_core::config::{DEFAULT_CACHE_BUDGET_BYTES, DEFAULT_WORKERS};
use wavecat_core::models::register_builtin;
use wavecat_core::request::{handle_request, parse_request};
use wavecat_core::{Component, EngineSettings, Registry, SweepMode, SweepSettings};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Sweep a diffraction catastrophe over a plane of two control parameters"
)]
struct Cli {
    /// JSON request; read from --request or STDIN when omitted
    json: Option<String>,

    /// Path to a file holding the JSON request
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "json")]
    request: Option<PathBuf>,

    /// Run the sweep on the calling thread only
    #[arg(long)]
    sequential: bool,

    /// Number of worker threads for the parallel sweep
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Compute every point even if it is already cached
    #[arg(long = "no-cache", action = ArgAction::SetFalse, default_value_t = true)]
    use_cache: bool,

    /// Upper bound for memory held by the result caches
    #[arg(long, default_value_t = DEFAULT_CACHE_BUDGET_BYTES)]
    cache_budget: usize,

    /// Override the component selected by the request
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Print the registered model names and exit
    #[arg(long)]
    list: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Module,
    Phase,
}

impl From<ModeArg> for Component {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Module => Component::Module,
            ModeArg::Phase => Component::Phase,
        }
    }
}

impl Cli {
    fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            cache_budget_bytes: self.cache_budget,
            sweep: SweepSettings {
                mode: if self.sequential {
                    SweepMode::Sequential
                } else {
                    SweepMode::Parallel
                },
                workers: self.workers,
                use_cache: self.use_cache,
            },
        }
    }

    fn read_request(&self) -> Result<String> {
        let json = match (&self.json, &self.request) {
            (Some(json), _) => json.clone(),
            (None, Some(path)) => fs::read_to_string(path)
                .with_context(|| format!("failed to read request from {}", path.display()))?,
            (None, None) => {
                let mut buffer = String::new();
                io::stdin()
                    .read_to_string(&mut buffer)
                    .context("failed to read request from STDIN")?;
                buffer
            }
        };
        if json.trim().is_empty() {
            bail!("empty request");
        }
        Ok(json)
    }
}

/// Logs go to STDERR so that STDOUT carries only the JSON grid.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr);
    tracing_subscriber::Registry::default()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = cli.engine_settings();

    let mut registry = Registry::new(settings.cache_budget_bytes);
    register_builtin(&mut registry);

    if cli.list {
        for name in registry.names() {
            println!("{name}");
        }
        return Ok(());
    }

    let json = cli.read_request()?;
    let mut request = parse_request(&json).context("failed to parse request")?;
    if let Some(mode) = cli.mode {
        request.mode = mode.into();
    }

    let started = Instant::now();
    let projection = handle_request(&registry, &request, &settings.sweep)
        .with_context(|| format!("sweep of model '{}' failed", request.name))?;
    tracing::info!(
        model = %request.name,
        elapsed_ms = started.elapsed().as_secs_f64() * 1e3,
        "request completed"
    );

    let output = serde_json::to_string(&projection).context("failed to serialize grid")?;
    println!("{output}");
    Ok(())
}
