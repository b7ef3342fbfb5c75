use std::path::{Path, PathBuf};
use chrono::Local;
use clap::Args;
use crate::config::{Config, DEFAULT_DATABASE_FILE};
use crate::controller::{credentials_path, rebuild_database};

#[derive(Args, Debug)]
pub(crate) struct SyncArgs {
    /// File with the login and password for drebedengi.ru [default: credentials.txt]
    #[arg(short, long, value_name = "FILE")]
    pub(crate) credentials: Option<PathBuf>,

    /// Database file [default: drebedengi.sqlite3]
    #[arg(short, long, value_name = "FILE")]
    pub(crate) database: Option<PathBuf>,
}

impl SyncArgs {
    fn database_path(&self, config: &Config) -> PathBuf {
        self.database.as_deref()
            .or(config.database.as_deref())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FILE))
    }
}

/// Replace the database file with the content of a freshly downloaded backup
pub(crate) fn run_sync(args: &SyncArgs, config: &Config) -> anyhow::Result<()> {
    let database = args.database_path(config);
    let credentials_file = credentials_path(args.credentials.as_deref(), config);
    rebuild_database(config, &credentials_file, Some(&database), Local::now().naive_local())?;
    println!("Backup saved to {}", database.display());
    Ok(())
}
