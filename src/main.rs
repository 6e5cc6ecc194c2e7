//! Trialstore CLI - inspect and initialize study databases

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use trialstore::config::{self, StoreConfig};
use trialstore::storage::Store;
use trialstore::ui::{self, Icons};
use trialstore::{TrialAttributeKind, TrialFilter, TrialState};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "trialstore")]
#[command(version)]
#[command(about = "Relational storage for hyperparameter-optimization studies and trials")]
#[command(long_about = r#"
Trialstore keeps studies, trials and their attributes in a shared SQLite
database that many optimization workers can write to at once.

Example usage:
  trialstore init --database runs.db
  trialstore studies
  trialstore count --study 1 --state complete
  trialstore attrs --kind user --study 1
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum AttrKind {
    Study,
    User,
    System,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database (if needed) and write the version marker
    Init {
        /// Also write the effective settings to the config file
        #[arg(long)]
        save_config: bool,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show library and stored schema versions
    Version,

    /// Show statistics about the stored studies and trials
    Stats,

    /// List studies with their trial counts
    Studies,

    /// Count trials, optionally narrowed by study and state
    Count {
        /// Only trials of this study
        #[arg(short, long)]
        study: Option<i64>,

        /// Only trials in this state (running, complete, pruned, fail)
        #[arg(long)]
        state: Option<String>,
    },

    /// Export attributes as JSON
    Attrs {
        /// Attribute table to read
        #[arg(short, long, value_enum)]
        kind: AttrKind,

        /// Only attributes of this study (for trial kinds: of its trials)
        #[arg(short, long, conflicts_with = "trial")]
        study: Option<i64>,

        /// Only attributes of this trial
        #[arg(short, long)]
        trial: Option<i64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let mut settings = config::load_config(Some(&config_path))?.unwrap_or_default();
    if let Some(database) = &cli.database {
        settings.database = Some(database.to_string_lossy().to_string());
    }
    let db_path = settings.database_path();
    config::ensure_db_dir(&db_path)?;
    tracing::debug!("using database {:?}", db_path);

    match cli.command {
        Commands::Init { save_config, force } => {
            let mut store = open(&settings)?;
            ui::header("Trialstore database ready");
            ui::info("Database", &db_path.display().to_string());
            if let Some(info) = store.version_info()? {
                ui::info("Version marker", &info.to_string());
            }
            if save_config {
                config::write_config(&config_path, &settings, force)?;
                ui::success(&format!("Config written to {}", config_path.display()));
            }
        }

        Commands::Version => {
            println!("{} trialstore {}", Icons::PACKAGE, env!("CARGO_PKG_VERSION"));
            ui::summary_row("Schema version:", &trialstore::SCHEMA_VERSION.to_string());
            if db_path.exists() {
                let mut store = open(&settings)?;
                ui::section(&db_path.display().to_string());
                match store.version_info()? {
                    Some(info) => {
                        ui::summary_row("Stored schema:", &info.schema_version.to_string());
                        ui::summary_row("Written by:", &info.library_version);
                    }
                    None => ui::warn("Database has no version marker"),
                }
            }
        }

        Commands::Stats => {
            let mut store = open(&settings)?;
            let stats = store.stats()?;

            println!("{} Trialstore Statistics ({:?})", Icons::STATS, db_path);
            println!("{}", ui::stats_table(&stats));
        }

        Commands::Studies => {
            let mut store = open(&settings)?;
            let uow = store.read()?;
            let trials = uow.trials();
            let studies = uow
                .studies()
                .all()?
                .into_iter()
                .map(|study| -> trialstore::Result<(trialstore::Study, usize)> {
                    let count = trials.count(&TrialFilter::all().study(study.study_id))?;
                    Ok((study, count))
                })
                .collect::<trialstore::Result<Vec<_>>>()?;

            if studies.is_empty() {
                ui::warn("No studies stored yet");
            } else {
                println!("{}", ui::studies_table(&studies));
            }
        }

        Commands::Count { study, state } => {
            let mut store = open(&settings)?;
            let mut filter = TrialFilter::all();
            if let Some(study) = study {
                filter = filter.study(study);
            }
            if let Some(state) = state {
                filter = filter.state(state.parse::<TrialState>()?);
            }

            let uow = store.read()?;
            let count = uow.trials().count(&filter)?;
            println!("{}", count);
        }

        Commands::Attrs { kind, study, trial } => {
            let mut store = open(&settings)?;
            let uow = store.read()?;

            let rows: Vec<serde_json::Value> = match kind {
                AttrKind::Study => {
                    let Some(study) = study else {
                        anyhow::bail!("--kind study requires --study");
                    };
                    uow.study_attributes()
                        .where_study_id(study)?
                        .into_iter()
                        .map(|a| -> trialstore::Result<serde_json::Value> {
                            let value = a.value()?;
                            Ok(serde_json::json!({
                                "study_id": a.study_id,
                                "key": a.key,
                                "value": value,
                            }))
                        })
                        .collect::<trialstore::Result<Vec<_>>>()?
                }
                AttrKind::User | AttrKind::System => {
                    let kind = if matches!(kind, AttrKind::User) {
                        TrialAttributeKind::User
                    } else {
                        TrialAttributeKind::System
                    };
                    let repo = uow.trial_attributes(kind);
                    let attrs = match (study, trial) {
                        (Some(study), _) => repo.where_study(study)?,
                        (None, Some(trial)) => repo.where_trial(trial)?,
                        (None, None) => repo.all()?,
                    };
                    attrs
                        .into_iter()
                        .map(|a| -> trialstore::Result<serde_json::Value> {
                            let value = a.value()?;
                            Ok(serde_json::json!({
                                "trial_id": a.trial_id,
                                "kind": a.kind,
                                "key": a.key,
                                "value": value,
                            }))
                        })
                        .collect::<trialstore::Result<Vec<_>>>()?
                }
            };

            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    Ok(())
}

fn open(settings: &StoreConfig) -> anyhow::Result<Store> {
    match Store::from_config(settings) {
        Ok(store) => Ok(store),
        Err(err) => {
            ui::error(&format!("Could not open database: {}", err));
            Err(err.into())
        }
    }
}
