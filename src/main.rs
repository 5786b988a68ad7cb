//! exprfn - function registry bootstrap and completeness audit

use anyhow::{bail, Context, Result};
use clap::Parser as ClapParser;
use exprfn::registry::{CompletenessReport, Registry, RegistryConfig, DEFAULT_MAX_EVAL_DEPTH};
use exprfn::BackendTarget;

/// exprfn - bootstrap the expression function registry and audit it
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Additional recognised query backend kind (repeatable)
    #[arg(short = 'q', long = "query-backend")]
    query_backends: Vec<String>,

    /// Extra function identifier to register after the built-ins (repeatable)
    #[arg(short, long = "custom")]
    custom: Vec<String>,

    /// Maximum nesting depth for eval
    #[arg(long, default_value_t = DEFAULT_MAX_EVAL_DEPTH)]
    max_eval_depth: usize,

    /// Exit with an error when any store has unbound operators
    #[arg(long)]
    strict: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    fn config(&self) -> RegistryConfig {
        let config = self
            .query_backends
            .iter()
            .fold(RegistryConfig::default(), |config, kind| {
                config.with_query_backend(kind.as_str())
            });
        self.custom
            .iter()
            .fold(config, |config, identifier| {
                config.with_custom_function(identifier.as_str())
            })
            .with_max_eval_depth(self.max_eval_depth)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = args.config();
    println!("exprfn v{}", env!("CARGO_PKG_VERSION"));
    println!("   - Query backends: {}", config.query_backends.join(", "));
    println!("   - Max eval depth: {}", config.max_eval_depth);
    if !config.custom_functions.is_empty() {
        println!("   - Custom functions: {}", config.custom_functions.join(", "));
    }

    let registry = Registry::bootstrap(config);
    let reports = registry.check_all();
    if reports.is_empty() {
        bail!("No function store was created");
    }

    println!();
    for (backend, report) in &reports {
        print_report(backend, report);
    }

    if args.strict {
        let incomplete = reports
            .iter()
            .filter(|(_, report)| !report.is_complete())
            .map(|(backend, _)| backend.to_string())
            .collect::<Vec<_>>();
        if !incomplete.is_empty() {
            return Err(anyhow::anyhow!("{}", incomplete.join(", ")))
                .context("Unbound operators in function stores");
        }
    }

    Ok(())
}

fn print_report(backend: &BackendTarget, report: &CompletenessReport) {
    let status = if report.is_complete() { "complete" } else { "incomplete" };
    println!("[{}] {}", backend, status);
    println!("   - Operators bound: {}", report.filled.len());
    if !report.missing.is_empty() {
        let missing = report
            .missing
            .iter()
            .map(|op| op.to_string())
            .collect::<Vec<_>>();
        println!("   - Missing: {}", missing.join(" "));
    }
    println!("   - Named functions: {}", report.named.join(", "));
}
