use anyhow::{anyhow, Context};
use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;
use rusqlite::{params, Transaction};
use crate::backup::{Backup, Row};
use crate::db::Database;

const CURRENCY: &str = "currency";
const OBJECTS: &str = "objects";
const RECORDS: &str = "records";

lazy_static! {
    /// Tags are written in a record comment in square brackets, e.g. `lunch [food] [work]`
    static ref TAG_REGEX: Regex = Regex::new(r"\[([^\[\]]+)\]").unwrap();
}

/// Number of rows inserted into each table
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct LoadSummary {
    pub(crate) currencies: usize,
    pub(crate) objects: usize,
    pub(crate) records: usize,
    pub(crate) tags: usize,
}

impl Database {
    /// Insert all rows of a backup in a single transaction. Schema must already exist.
    pub(crate) fn load(&mut self, backup: &Backup) -> anyhow::Result<LoadSummary> {
        for name in backup.section_names() {
            if ![CURRENCY, OBJECTS, RECORDS].contains(&name) {
                debug!("Ignoring section [{}]", name);
            }
        }

        let tx = self.conn.transaction()?;
        let currencies = insert_currency(&tx, required_section(backup, CURRENCY)?)?;
        let objects = insert_objects(&tx, required_section(backup, OBJECTS)?)?;
        let records = required_section(backup, RECORDS)?;
        let summary = LoadSummary {
            currencies,
            objects,
            records: insert_records(&tx, records)?,
            tags: insert_tags(&tx, records)?,
        };
        tx.commit()?;

        info!("Loaded {} currencies, {} objects, {} records, {} tags",
            summary.currencies, summary.objects, summary.records, summary.tags);
        Ok(summary)
    }
}

/// All `[tag]` markers in a record comment, in order of appearance
pub(crate) fn extract_tags(comment: &str) -> Vec<&str> {
    TAG_REGEX.captures_iter(comment)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect()
}

fn required_section<'a>(backup: &'a Backup, name: &str) -> anyhow::Result<&'a [Row]> {
    backup.section(name).ok_or_else(|| anyhow!("Section [{}] is missing from backup", name))
}

fn insert_currency(tx: &Transaction, rows: &[Row]) -> anyhow::Result<usize> {
    let mut stmt = tx.prepare("INSERT INTO currency VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)")?;
    for (i, row) in rows.iter().enumerate() {
        let [id, name, course, code, is_autoupdate, is_hidden, is_default] = columns::<7>(CURRENCY, i, row)?;
        stmt.execute(params![
            id,
            name,
            course,
            code,
            flag(CURRENCY, i, is_autoupdate)?,
            flag(CURRENCY, i, is_hidden)?,
            flag(CURRENCY, i, is_default)?,
        ]).with_context(|| format!("Unable to insert [{}] row {}", CURRENCY, i + 1))?;
    }
    Ok(rows.len())
}

fn insert_objects(tx: &Transaction, rows: &[Row]) -> anyhow::Result<usize> {
    let mut stmt = tx.prepare("INSERT INTO objects VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)")?;
    for (i, row) in rows.iter().enumerate() {
        let [id, parent_id, object_type, name, user_id, is_credit_card, is_hidden, is_for_duty, sort, icon_id, is_autohide] =
            columns::<11>(OBJECTS, i, row)?;
        stmt.execute(params![
            id,
            parent_id,
            object_type,
            name,
            user_id,
            flag(OBJECTS, i, is_credit_card)?,
            flag(OBJECTS, i, is_hidden)?,
            flag(OBJECTS, i, is_for_duty)?,
            sort,
            icon_id,
            flag(OBJECTS, i, is_autohide)?,
        ]).with_context(|| format!("Unable to insert [{}] row {}", OBJECTS, i + 1))?;
    }
    Ok(rows.len())
}

/// Records carry no id in the backup, the position in the section is used instead.
fn insert_records(tx: &Transaction, rows: &[Row]) -> anyhow::Result<usize> {
    let mut stmt = tx.prepare("INSERT INTO records VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)")?;
    for (i, row) in rows.iter().enumerate() {
        let [sum, currency_id, object_id, account_id, date, comment, user_id, group_id] = columns::<8>(RECORDS, i, row)?;
        stmt.execute(params![i as i64, sum, currency_id, object_id, account_id, date, comment, user_id, group_id])
            .with_context(|| format!("Unable to insert [{}] row {}", RECORDS, i + 1))?;
    }
    Ok(rows.len())
}

fn insert_tags(tx: &Transaction, rows: &[Row]) -> anyhow::Result<usize> {
    let mut stmt = tx.prepare("INSERT INTO tags VALUES (?1, ?2)")?;
    let mut count = 0;
    for (i, row) in rows.iter().enumerate() {
        let [.., comment, _, _] = columns::<8>(RECORDS, i, row)?;
        for tag in extract_tags(comment) {
            stmt.execute(params![i as i64, tag])?;
            count += 1;
        }
    }
    Ok(count)
}

fn columns<'a, const N: usize>(section: &str, index: usize, row: &'a Row) -> anyhow::Result<[&'a str; N]> {
    let values: Vec<&str> = row.iter().map(String::as_str).collect();
    let found = values.len();
    values.try_into().map_err(|_| anyhow!(
        "Section [{}] row {}: expected {} columns, found {}", section, index + 1, N, found
    ))
}

/// Backup booleans are `t` / `f`
fn flag(section: &str, index: usize, value: &str) -> anyhow::Result<i64> {
    match value {
        "t" => Ok(1),
        "f" => Ok(0),
        _ => Err(anyhow!("Section [{}] row {}: invalid flag value '{}'", section, index + 1, value)),
    }
}
