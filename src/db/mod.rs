mod load;

use std::fs;
use std::path::Path;
use anyhow::Context;
use log::info;
use rusqlite::Connection;

const SCHEMA: &str = "
    CREATE TABLE currency (
        [id] int NOT NULL,
        [name] text,
        [course] numeric(18,4),
        [code] text,
        [is_autoupdate] int,
        [is_hidden] int,
        [is_default] int
    );
    CREATE TABLE objects (
        [id] int NOT NULL,
        [parent_id] int,
        [type] int,
        [name] text,
        [user_id] int,
        [is_credit_card] int,
        [is_hidden] int,
        [is_for_duty] int,
        [sort] int,
        [icon_id] int,
        [is_autohide] int
    );
    CREATE TABLE records (
        [id] int NOT NULL,
        [sum] int,
        [currency_id] int,
        [object_id] int,
        [account_id] int,
        [date] text,
        [comment] text,
        [user_id] int,
        [group_id] int
    );
    CREATE TABLE tags (
        [record_id] int NOT NULL,
        [tag] text NOT NULL
    );
";

/// SQLite store holding one imported backup
pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database file, or an in-memory database when no path is given.
    pub(crate) fn open(path: Option<&Path>) -> anyhow::Result<Database> {
        let conn = match path {
            Some(path) => {
                info!("Opening database {}", path.display());
                Connection::open(path).with_context(|| format!("Unable to open database {}", path.display()))?
            }
            None => {
                info!("Using in-memory database");
                Connection::open_in_memory()?
            }
        };
        Ok(Database { conn })
    }

    /// Remove the database file so it can be rebuilt from a fresh backup. Returns whether a file was removed.
    pub(crate) fn remove_file(path: &Path) -> anyhow::Result<bool> {
        if path.exists() {
            info!("Removing old database {}", path.display());
            fs::remove_file(path).with_context(|| format!("Unable to remove {}", path.display()))?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn create_schema(&self) -> anyhow::Result<()> {
        self.conn.execute_batch(SCHEMA).context("Unable to create database schema")
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}
