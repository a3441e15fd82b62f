//! DoroBot configuration tool.
//!
//! Inspects and edits the bot's configuration through the same store the bot
//! uses, so every command sees defaults, legacy files, and migrations exactly
//! as the bot would.
//!
//! # Usage
//!
//! ```text
//! doro-config [OPTIONS] <COMMAND>
//!
//! Commands:
//!   init      Load and write back the full merged document
//!   show      Print the merged document (YAML, or JSON with --json)
//!   get       Print one value, e.g. `get toggles ShopCash`
//!   set       Update one value, e.g. `set tasks arena_task true`
//!   validate  Report out-of-range values; non-zero exit if any
//!   schema    Write the JSON schema artifact
//!   export    Write the legacy INI export
//!   plan      List enabled tasks in run order
//!   watch     Reload on every file change until Ctrl-C
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                 | Default                 |
//! |--------------------------|-------------------------|
//! | `DORO_CONFIG`            | `config.yaml`           |
//! | `DORO_LEGACY_SETTINGS`   | `settings.json`         |
//! | `DORO_LEGACY_NUMERIC`    | `numeric_settings.json` |
//! | `DORO_EXPORT`            | `settings.ini`          |
//! | `DORO_WATCH_INTERVAL_MS` | `1000`                  |

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_yaml::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use doro_config::domain::options::DEFAULT_SCHEMA_FILE;
use doro_config::infrastructure::legacy::{LegacyFiles, LegacySettings};
use doro_config::infrastructure::storage::schema_file::write_schema;
use doro_config::{ConfigStore, HotReload, StoreOptions, TaskPlan, VisionDefaults, WatchOptions};

// ── CLI argument definitions ──────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name = "doro-config",
    about = "Inspect and edit DoroBot configuration",
    version
)]
struct Cli {
    /// Backing configuration file.  A `.toml` extension selects TOML.
    #[arg(long, default_value = "config.yaml", env = "DORO_CONFIG", global = true)]
    config: PathBuf,

    /// Legacy toggles JSON file.
    #[arg(long, default_value = "settings.json", env = "DORO_LEGACY_SETTINGS", global = true)]
    legacy_settings: PathBuf,

    /// Legacy numeric settings JSON file.
    #[arg(
        long,
        default_value = "numeric_settings.json",
        env = "DORO_LEGACY_NUMERIC",
        global = true
    )]
    legacy_numeric: PathBuf,

    /// INI export written after every save.
    #[arg(long, default_value = "settings.ini", env = "DORO_EXPORT", global = true)]
    export: PathBuf,

    /// Poll interval for `watch`, in milliseconds.
    #[arg(long, default_value_t = 1000, env = "DORO_WATCH_INTERVAL_MS", global = true)]
    watch_interval_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load and write back the full merged document.
    Init,
    /// Print the merged document.
    Show {
        /// Print JSON instead of YAML.
        #[arg(long)]
        json: bool,
    },
    /// Print the value at a section/key path.
    Get {
        #[arg(required = true)]
        path: Vec<String>,
    },
    /// Set one value and save.  The value is parsed as a YAML scalar.
    Set {
        section: String,
        key: String,
        value: String,
    },
    /// Report out-of-range values.
    Validate,
    /// Write the JSON schema of the document.
    Schema {
        /// Destination file.
        #[arg(long, default_value = DEFAULT_SCHEMA_FILE)]
        out: PathBuf,
    },
    /// Write the legacy INI export.
    Export,
    /// List enabled tasks in run order.
    Plan,
    /// Reload on every change to the backing file until Ctrl-C.
    Watch,
}

impl Cli {
    fn store_options(&self) -> StoreOptions {
        StoreOptions {
            config_path: self.config.clone(),
            legacy_toggles_path: self.legacy_settings.clone(),
            legacy_numeric_path: self.legacy_numeric.clone(),
            export_path: self.export.clone(),
            ..StoreOptions::default()
        }
    }

    fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            interval: Duration::from_millis(self.watch_interval_ms.max(1)),
            ..WatchOptions::default()
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = cli.store_options();
    let watch_options = cli.watch_options();
    let store = Arc::new(ConfigStore::open(&options));

    // A broken file still leaves the store on defaults; report and carry on.
    let loaded = store.load();
    if let Err(e) = &loaded {
        warn!("{e}");
    }

    match cli.command {
        Command::Init => {
            write_merged(&store)?;
            println!("wrote {}", options.config_path.display());
        }
        Command::Show { json } => {
            let doc = store.snapshot();
            let text = if json {
                serde_json::to_string_pretty(&*doc).context("failed to render JSON")?
            } else {
                serde_yaml::to_string(&*doc).context("failed to render YAML")?
            };
            println!("{}", text.trim_end());
        }
        Command::Get { path } => {
            let segments: Vec<&str> = path.iter().map(String::as_str).collect();
            let Some(value) = store.get(&segments) else {
                bail!("no value at {}", segments.join("."));
            };
            println!("{}", render_value(&value)?);
        }
        Command::Set {
            section,
            key,
            value,
        } => {
            let parsed: Value = serde_yaml::from_str(&value)
                .with_context(|| format!("`{value}` is not a valid YAML scalar"))?;
            store
                .update(&section, &key, parsed)
                .with_context(|| format!("failed to set {section}.{key}"))?;
            let stored = store
                .get(&[section.as_str(), key.as_str()])
                .unwrap_or(Value::Null);
            println!("{section}.{key} = {}", render_value(&stored)?);
        }
        Command::Validate => {
            let report = loaded.context("cannot validate an unusable config file")?;
            for warning in &report.merge_warnings {
                println!("skipped: {warning}");
            }
            for issue in &report.validation {
                println!("invalid: {issue}");
            }
            let problems = report.merge_warnings.len() + report.validation.len();
            if problems > 0 {
                bail!("{problems} problem(s) in {}", options.config_path.display());
            }
            println!("{} is valid (version {})", options.config_path.display(), report.version);
        }
        Command::Schema { out } => {
            write_schema(&out).with_context(|| format!("failed to write {}", out.display()))?;
            println!("wrote {}", out.display());
        }
        Command::Export => {
            LegacyFiles::from_options(&options)
                .export(&store.snapshot())
                .with_context(|| format!("failed to write {}", options.export_path.display()))?;
            println!("wrote {}", options.export_path.display());
        }
        Command::Plan => {
            let plan = TaskPlan::from_reader(store.as_ref());
            for (i, task) in plan.tasks.iter().enumerate() {
                println!("{:>2}. {task}", i + 1);
            }
            println!("break_on_failure: {}", plan.break_on_failure);
        }
        Command::Watch => watch(&store, watch_options).await?,
    }

    Ok(())
}

/// Writes the loaded document back, filling in defaults and the current
/// version, the way the bot does once at startup.
fn write_merged(store: &ConfigStore) -> anyhow::Result<()> {
    store
        .save()
        .with_context(|| format!("failed to write {}", store.location().display()))
}

/// Hot-reloads `store` and prints a line per change until Ctrl-C.
///
/// The merged document is saved first, so the watched file starts out
/// complete and at the current version.
async fn watch(store: &Arc<ConfigStore>, options: WatchOptions) -> anyhow::Result<()> {
    write_merged(store)?;

    let vision = Arc::new(VisionDefaults::attach(store.as_ref()));
    let shown = Arc::clone(&vision);
    store.subscribe("cli-printer", move |doc| {
        let enabled: Vec<&str> = doc.enabled_tasks().collect();
        println!(
            "reloaded: version {}, confidence {}, tasks [{}]",
            doc.meta.version,
            shown.confidence(),
            enabled.join(", ")
        );
        Ok(())
    });

    let reload = HotReload::new(store, options);
    reload.start().context("failed to start watcher")?;
    info!(
        "watching {} every {:?}; press Ctrl-C to exit",
        store.location().display(),
        options.interval
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("shutdown signal received");
    reload.stop();
    Ok(())
}

/// Renders scalars bare and collections as YAML.
fn render_value(value: &Value) -> anyhow::Result<String> {
    Ok(match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .context("failed to render value")?
            .trim_end()
            .to_string(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
