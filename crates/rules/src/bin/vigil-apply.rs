//! vigil-apply: load a configuration directory and run every apply rule.
//!
//! Loads objects and apply rules, runs one apply pass per rule kind, warns
//! about rules that matched nothing and optionally dumps the resulting
//! object set as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{info, warn};

use vigil_core::config::load_dotenv;
use vigil_core::{Config, ConfigObject};
use vigil_rules::apply::{ApplyEngine, ApplyRuleRegistry};
use vigil_rules::loader::ConfigLoader;
use vigil_rules::store::ObjectRegistry;

// ── CLI ─────────────────────────────────────────────────────────────

/// Apply-rule evaluation over a configuration directory.
#[derive(Parser, Debug)]
#[command(name = "vigil-apply", version, about)]
struct Cli {
    /// Directory holding object and apply-rule YAML files [default: $VIGIL_CONFIG_DIR].
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Worker threads for apply passes [default: $APPLY_WORKER_THREADS].
    #[arg(long)]
    threads: Option<usize>,

    /// Print every object after the run as JSON.
    #[arg(long)]
    dump: bool,

    /// Exit non-zero when any file failed to load or any apply error was reported.
    #[arg(long, env = "APPLY_STRICT")]
    strict: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(dir) = cli.config_dir {
        config.apply.config_dir = dir;
    }
    if let Some(threads) = cli.threads {
        config.apply.worker_threads = threads.max(1);
    }
    config.log_summary();

    let rules = Arc::new(ApplyRuleRegistry::with_default_targets());
    let store = Arc::new(ObjectRegistry::new());

    let loader = ConfigLoader::new(config.apply.config_dir.clone());
    let results = loader
        .load_all(&rules, store.as_ref())
        .with_context(|| format!("failed to scan {}", loader.config_dir().display()))?;
    let failed_files = results.iter().filter(|r| r.is_failed()).count();

    info!(
        files = results.len(),
        failed = failed_files,
        objects = store.len(),
        rules = rules.rule_count(),
        "configuration loaded"
    );

    let engine = ApplyEngine::new(Arc::clone(&rules), Arc::clone(&store), config.apply.worker_threads)
        .context("failed to start apply engine")?;
    let report = engine.run_all();

    if config.apply.warn_unmatched {
        engine.rules().warn_unmatched();
    }

    let stats = store.stats();
    info!(
        created = report.created,
        matched = report.matched,
        errors = report.errors.len(),
        objects = stats.object_count,
        "apply run complete"
    );

    if cli.dump {
        let objects = store.all_objects();
        let objects: Vec<&ConfigObject> = objects.iter().map(Arc::as_ref).collect();
        let json = serde_json::to_string_pretty(&objects).context("failed to serialize objects")?;
        println!("{}", json);
    }

    if cli.strict && (failed_files > 0 || report.has_errors()) {
        warn!(failed_files, errors = report.errors.len(), "strict mode: errors were reported");
        bail!(
            "{} file(s) failed to load, {} apply error(s) reported",
            failed_files,
            report.errors.len()
        );
    }

    Ok(())
}
