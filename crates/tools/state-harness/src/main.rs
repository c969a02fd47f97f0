//! CLI harness for inspecting and migrating persisted wallet state
//!
//! This tool allows:
//! - Inspecting a snapshot's version and slices
//! - Running the migration chain offline
//! - Moving snapshots between JSON files and the SQLite store
//! - Listing, restoring and pruning SQLite backups
//! - Running the startup sequence from a config file

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use wallet_state_core::{
    MigrationContext, MigrationRegistry, MigrationRunner, PersistedState, LATEST_VERSION,
};
use wallet_state_storage::{
    open_store, Bootstrap, PersistConfig, SnapshotStore, SqliteSnapshotStore, DEFAULT_PERSIST_KEY,
};

#[derive(Parser)]
#[command(name = "state-harness")]
#[command(about = "Persisted wallet state migration harness", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a snapshot's version, slices and pending step count
    Inspect {
        /// Snapshot JSON file
        file: PathBuf,
    },

    /// Migrate a snapshot file
    Migrate {
        /// Snapshot JSON file
        file: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Target version (defaults to the latest)
        #[arg(short, long)]
        to: Option<i64>,

        /// Pin the clock for steps that stamp times (ms since epoch)
        #[arg(long)]
        now_ms: Option<i64>,
    },

    /// List the built-in migrations
    Registry {
        /// Only check that the registry has no gaps
        #[arg(long)]
        verify: bool,
    },

    /// Store a snapshot file in a SQLite database
    Import {
        /// Snapshot JSON file
        file: PathBuf,

        /// SQLite database
        #[arg(long)]
        db: PathBuf,

        /// Persist key
        #[arg(short, long, default_value = DEFAULT_PERSIST_KEY)]
        key: String,
    },

    /// Write a snapshot from a SQLite database as JSON
    Export {
        /// SQLite database
        #[arg(long)]
        db: PathBuf,

        /// Persist key
        #[arg(short, long, default_value = DEFAULT_PERSIST_KEY)]
        key: String,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List, restore or prune the backups kept in a SQLite database
    Backups {
        /// SQLite database
        #[arg(long)]
        db: PathBuf,

        /// Persist key
        #[arg(short, long, default_value = DEFAULT_PERSIST_KEY)]
        key: String,

        /// Restore the backup with this id as the current snapshot
        #[arg(long, conflicts_with = "prune")]
        restore: Option<i64>,

        /// Keep only this many of the most recent backups
        #[arg(long)]
        prune: Option<usize>,
    },

    /// Run the startup sequence described by a config file
    Bootstrap {
        /// Persistence config (JSON)
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { file } => run_inspect(&file)?,
        Commands::Migrate {
            file,
            output,
            to,
            now_ms,
        } => run_migrate(&file, output.as_deref(), to, now_ms)?,
        Commands::Registry { verify } => run_registry(verify)?,
        Commands::Import { file, db, key } => run_import(&file, &db, key)?,
        Commands::Export { db, key, output } => run_export(&db, key, output.as_deref())?,
        Commands::Backups {
            db,
            key,
            restore,
            prune,
        } => run_backups(&db, key, restore, prune)?,
        Commands::Bootstrap { config } => run_bootstrap(&config)?,
    }

    Ok(())
}

fn read_snapshot(file: &Path) -> anyhow::Result<PersistedState> {
    let json =
        std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    PersistedState::from_json_str(&json).with_context(|| format!("parsing {}", file.display()))
}

fn write_output(output: Option<&Path>, contents: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, contents)
                .with_context(|| format!("writing {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{contents}"),
    }
    Ok(())
}

fn run_inspect(file: &Path) -> anyhow::Result<()> {
    let state = read_snapshot(file)?;
    let version = state.version()?;
    let runner = MigrationRunner::new();

    println!("version: {version}");
    if let Some(meta) = state.meta() {
        println!("rehydrated: {}", meta.rehydrated);
    }
    println!("slices: {}", state.slice_names().collect::<Vec<_>>().join(", "));
    if version > LATEST_VERSION {
        warn!(
            "Snapshot version {} is newer than this build ({})",
            version, LATEST_VERSION
        );
        return Ok(());
    }

    println!("pending steps: {}", runner.pending_count(version));
    for migration in runner.registry().pending(version, runner.target_version())? {
        println!("{:>3}  {}", migration.version, migration.description);
    }
    Ok(())
}

fn run_migrate(
    file: &Path,
    output: Option<&Path>,
    to: Option<i64>,
    now_ms: Option<i64>,
) -> anyhow::Result<()> {
    let state = read_snapshot(file)?;
    let runner = MigrationRunner::with_registry(
        MigrationRegistry::builtin(),
        to.unwrap_or(LATEST_VERSION),
    );
    let ctx = now_ms.map(MigrationContext::at).unwrap_or_else(MigrationContext::now);

    let (state, report) = runner.migrate_state(state, &ctx)?;
    info!(
        "Migrated {} from version {} to {} ({} steps)",
        file.display(),
        report.from_version,
        report.to_version,
        report.steps_applied()
    );
    write_output(output, &state.to_json_pretty()?)
}

fn run_registry(verify: bool) -> anyhow::Result<()> {
    let registry = MigrationRegistry::builtin();
    registry.verify()?;
    if verify {
        info!(
            "Registry is complete: {} steps up to version {}",
            registry.len(),
            registry.latest_version()
        );
        return Ok(());
    }
    for migration in registry.iter() {
        println!("{:>3}  {}", migration.version, migration.description);
    }
    Ok(())
}

fn run_import(file: &Path, db: &Path, key: String) -> anyhow::Result<()> {
    let state = read_snapshot(file)?;
    let version = state.version()?;
    let store = SqliteSnapshotStore::open(db, key)?;
    store.save(&state)?;
    info!(
        "Imported {} into {} at version {}",
        file.display(),
        store.describe(),
        version
    );
    Ok(())
}

fn run_export(db: &Path, key: String, output: Option<&Path>) -> anyhow::Result<()> {
    let store = SqliteSnapshotStore::open(db, key)?;
    let state = store
        .load()?
        .with_context(|| format!("no snapshot stored under key {}", store.key()))?;
    write_output(output, &state.to_json_pretty()?)
}

fn run_backups(
    db: &Path,
    key: String,
    restore: Option<i64>,
    prune: Option<usize>,
) -> anyhow::Result<()> {
    let store = SqliteSnapshotStore::open(db, key)?;

    if let Some(id) = restore {
        let state = store.restore_backup(id)?;
        info!("Restored backup {} at version {}", id, state.version()?);
        return Ok(());
    }
    if let Some(keep) = prune {
        let removed = store.prune_backups(keep)?;
        info!("Removed {} backups of {}", removed, store.describe());
        return Ok(());
    }

    for backup in store.list_backups()? {
        println!(
            "{:>4}  v{:<3} {}  {}",
            backup.id, backup.state_version, backup.created_at, backup.reason
        );
    }
    Ok(())
}

fn run_bootstrap(config: &Path) -> anyhow::Result<()> {
    let config = PersistConfig::from_file(config)?;
    let store = open_store(&config)?;
    info!("Bootstrapping {}", store.describe());

    let result =
        Bootstrap::from_config(&config).run(store.as_ref(), &MigrationContext::now())?;
    println!("{}", serde_json::to_string_pretty(&result.outcome)?);
    Ok(())
}
