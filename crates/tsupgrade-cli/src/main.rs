mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tsupgrade_config::{AppConfig, ConfigLoader};
use tsupgrade_db::{MigrationPlan, SqliteConnector, TsDatabaseUpgradeService, supported_versions};

#[derive(Parser)]
#[command(
    name = "tsupgrade",
    version,
    about = "tsupgrade - timeseries schema upgrade"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error); defaults to the config file value
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Directory holding config.yml or config.toml
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upgrade the timeseries schema of a live database
    Upgrade {
        /// Schema version the database is currently at
        #[arg(long)]
        from_version: String,

        /// Database url, overrides the config file and TSUPGRADE_DATABASE_URL
        #[arg(long)]
        database_url: Option<String>,

        /// Install scripts root, overrides the config file and TSUPGRADE_INSTALL_DIR
        #[arg(long)]
        install_dir: Option<PathBuf>,

        /// Run all steps and cleanup in one transaction
        #[arg(long)]
        single_transaction: bool,

        /// Abort when the upgrade routines cannot be loaded
        #[arg(long)]
        strict_routine_load: bool,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the steps an upgrade would run, without touching a database
    Plan {
        #[arg(long)]
        from_version: String,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the schema versions that can be upgraded
    Versions,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_loader = match &cli.config_dir {
        Some(dir) => ConfigLoader::with_dir(dir),
        None => ConfigLoader::new(),
    };
    let config = config_loader.load()?;

    let log_level = cli
        .log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .init();

    match config_loader.config_file() {
        Some(path) => info!("loaded config from {}", path.display()),
        None => info!("no config file found, using defaults"),
    }

    match cli.command {
        Commands::Upgrade {
            from_version,
            database_url,
            install_dir,
            single_transaction,
            strict_routine_load,
            json,
        } => {
            let mut config = config;
            if let Some(url) = database_url {
                config.database.url = url;
            }
            if let Some(dir) = install_dir {
                config.install.scripts_dir = dir;
            }
            config.upgrade.single_transaction |= single_transaction;
            config.upgrade.strict_routine_load |= strict_routine_load;

            let outcome = tokio::task::spawn_blocking(move || run_upgrade(config, &from_version))
                .await
                .context("upgrade task did not complete")??;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print!("{}", report::render_outcome(&outcome));
            }
        }
        Commands::Plan { from_version, json } => {
            let plan = MigrationPlan::find(&from_version).with_context(|| {
                format!("no upgrade plan for fromVersion: {from_version}")
            })?;
            if json {
                println!("{}", serde_json::to_string_pretty(plan)?);
            } else {
                print!("{}", report::render_plan(plan));
            }
        }
        Commands::Versions => {
            println!("Supported source versions:");
            for version in supported_versions() {
                println!("  {version}");
            }
        }
    }

    Ok(())
}

fn run_upgrade(config: AppConfig, from_version: &str) -> Result<tsupgrade_db::UpgradeOutcome> {
    let connector = SqliteConnector::from_config(&config.database)?;
    info!(
        "upgrading {} using scripts from {}",
        connector.path().display(),
        config.install.scripts_dir.display()
    );
    let service =
        TsDatabaseUpgradeService::new(connector, config.install.scripts_dir, config.upgrade);
    let outcome = service
        .upgrade(from_version)
        .with_context(|| format!("timeseries upgrade from {from_version} failed"))?;
    Ok(outcome)
}
