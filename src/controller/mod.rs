use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::Context;
use chrono::NaiveDateTime;
use log::{info, warn};
use crate::backup::{self, Backup};
use crate::config::{Config, DEFAULT_CREDENTIALS_FILE};
use crate::credentials::Credentials;
use crate::db::Database;

mod chart;
mod sync;

pub(crate) use chart::{run_chart, ChartArgs};
pub(crate) use sync::{run_sync, SyncArgs};

/// A fresh backup is needed when forced, when there is no database file to reuse
/// or when the database file does not exist yet.
pub(crate) fn needs_update(force: bool, database: Option<&Path>) -> bool {
    force || database.map_or(true, |path| !path.exists())
}

fn credentials_path(cli_value: Option<&Path>, config: &Config) -> PathBuf {
    cli_value
        .or(config.credentials.as_deref())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_FILE))
}

/// Download a backup and load it into a new database. The old database file is replaced
/// only after the new one is fully loaded.
fn rebuild_database(config: &Config, credentials_file: &Path, database: Option<&Path>, now: NaiveDateTime) -> anyhow::Result<Database> {
    let credentials = Credentials::load(credentials_file)?;
    let backup = backup::fetch(config, &credentials, now)?;
    replace_database(&backup, database)
}

fn replace_database(backup: &Backup, database: Option<&Path>) -> anyhow::Result<Database> {
    let path = match database {
        Some(path) => path,
        None => return load_database(backup, None),
    };

    let staging = staging_path(path);
    Database::remove_file(&staging)?;
    if let Err(e) = load_database(backup, Some(&staging)) {
        if let Err(cleanup) = Database::remove_file(&staging) {
            warn!("{:#}", cleanup);
        }
        return Err(e);
    }

    fs::rename(&staging, path)
        .with_context(|| format!("Unable to replace {} with {}", path.display(), staging.display()))?;
    Database::open(Some(path))
}

fn load_database(backup: &Backup, path: Option<&Path>) -> anyhow::Result<Database> {
    let mut db = Database::open(path)?;
    db.create_schema()?;
    let summary = db.load(backup)?;
    info!("Database is up to date, {} records", summary.records);
    Ok(db)
}

/// `money.sqlite3` is built as `money.sqlite3.new` next to it
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".new");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;
    use crate::backup::tests::{backup_responses, backup_zip, datetime, fixture_backup, fixture_filename, StubServer};
    use crate::backup::Backup;
    use crate::config::Config;
    use crate::controller::{credentials_path, needs_update, rebuild_database, replace_database, staging_path};
    use crate::db::Database;

    fn record_count(path: &Path) -> i64 {
        let db = Database::open(Some(path)).unwrap();
        db.connection().query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0)).unwrap()
    }

    #[test]
    fn test_needs_update() {
        let existing = fixture_filename("backup.txt");
        let missing = fixture_filename("missing.sqlite3");

        assert!(needs_update(true, Some(&existing)));
        assert!(needs_update(false, None));
        assert!(needs_update(false, Some(&missing)));
        assert!(!needs_update(false, Some(&existing)));
    }

    #[test]
    fn test_credentials_path() {
        let mut config = Config::empty();
        assert_eq!(credentials_path(None, &config), PathBuf::from("credentials.txt"));

        config.credentials = Some(PathBuf::from("/etc/drebedengi/credentials"));
        assert_eq!(credentials_path(None, &config), PathBuf::from("/etc/drebedengi/credentials"));
        assert_eq!(credentials_path(Some(Path::new("mine.txt")), &config), PathBuf::from("mine.txt"));
    }

    #[test]
    fn test_staging_path() {
        assert_eq!(staging_path(Path::new("/data/money.sqlite3")), PathBuf::from("/data/money.sqlite3.new"));
        assert_eq!(staging_path(Path::new("money")), PathBuf::from("money.new"));
    }

    #[test]
    fn test_replace_database() {
        let dir = TempDir::new().unwrap();
        let database = dir.path().join("money.sqlite3");
        fs::write(&database, b"not a database").unwrap();

        let db = replace_database(&fixture_backup(), Some(&database)).unwrap();
        drop(db);
        assert_eq!(record_count(&database), 5);
        assert!(!staging_path(&database).exists());

        let db = replace_database(&fixture_backup(), None).unwrap();
        let count: i64 = db.connection().query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0)).unwrap();
        assert_eq!(count, 5);
    }

    #[test]
    fn test_failed_load_keeps_database() {
        let dir = TempDir::new().unwrap();
        let database = dir.path().join("money.sqlite3");
        replace_database(&fixture_backup(), Some(&database)).unwrap();

        let broken = Backup::parse("[currency]\n1;Рубль;1.0;RUB;f;yes;f\n[objects]\n[records]\n").unwrap();
        let err = replace_database(&broken, Some(&database)).err().unwrap();
        assert_eq!(err.to_string(), "Section [currency] row 1: invalid flag value 'yes'");

        assert_eq!(record_count(&database), 5);
        assert!(!staging_path(&database).exists());
        assert!(!needs_update(false, Some(&database)));
    }

    #[test]
    fn test_rebuild_database() {
        let dir = TempDir::new().unwrap();
        let credentials = dir.path().join("credentials.txt");
        fs::write(&credentials, "alice@example.com\ns3cret\n").unwrap();
        let database = dir.path().join("money.sqlite3");

        let now = datetime("2024-03-05 14:30:00");
        let text = fs::read_to_string(fixture_filename("backup.txt")).unwrap();
        let zip_bytes = backup_zip(datetime("2024-03-05 14:02:11"), &text);
        let server = StubServer::start(backup_responses(&zip_bytes));
        let config = Config { base_url: Some(server.base_url.clone()), ..Config::empty() };

        let db = rebuild_database(&config, &credentials, Some(&database), now).unwrap();
        drop(db);
        assert_eq!(server.requests().len(), 3);
        assert_eq!(record_count(&database), 5);
    }
}
