//! Operator CLI for the matjip database.
//!
//! # Responsibility
//! - Resolve configuration from `matjip.json` plus command-line overrides.
//! - Run schema migration and print per-table row counts.

use clap::{Parser, Subcommand};
use log::info;
use matjip_core::config::DEFAULT_CONFIG_FILE;
use matjip_core::db::{migrations, table_row_counts};
use matjip_core::{init_logging, open_db, ConfigError, MatjipConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Overrides `database_path` from the configuration
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the database, apply pending migrations and print the schema version
    Migrate,
    /// Print row counts for every entity table
    Stats,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = resolve_config(&args)?;

    if let Some(log_dir) = config.log_dir.as_ref() {
        init_logging(&config.log_level, &log_dir.to_string_lossy())?;
    }

    let conn = open_db(&config.database_path)?;
    match args.command {
        Command::Migrate => {
            let version = migrations::current_user_version(&conn)?;
            info!("event=cli_migrate module=cli status=ok schema_version={version}");
            println!(
                "{} schema_version={version}",
                config.database_path.display()
            );
        }
        Command::Stats => {
            for (table, count) in table_row_counts(&conn)? {
                println!("{table:<24}{count}");
            }
        }
    }
    Ok(())
}

/// A missing default config file is not an error; an explicitly named one is.
fn resolve_config(args: &Args) -> Result<MatjipConfig, ConfigError> {
    let mut config = match MatjipConfig::load(&args.config) {
        Ok(config) => config,
        Err(ConfigError::NotFound { .. }) if args.config == PathBuf::from(DEFAULT_CONFIG_FILE) => {
            MatjipConfig::default()
        }
        Err(err) => return Err(err),
    };
    if let Some(db) = args.db.as_ref() {
        config.database_path = db.clone();
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::{resolve_config, Args, Command};
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn db_flag_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args::parse_from([
            "matjip",
            "--config",
            "matjip.json",
            "--db",
            dir.path().join("x.sqlite3").to_str().unwrap(),
            "stats",
        ]);
        assert!(matches!(args.command, Command::Stats));
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.database_path, dir.path().join("x.sqlite3"));
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let args = Args::parse_from(["matjip", "--config", "/nonexistent/matjip.json", "migrate"]);
        assert!(resolve_config(&args).is_err());
        assert_eq!(args.config, PathBuf::from("/nonexistent/matjip.json"));
    }
}
