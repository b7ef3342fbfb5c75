mod archive;
mod download;

use std::collections::BTreeMap;
use std::fmt;
use chrono::NaiveDateTime;
use log::{info, warn};

use crate::config::Config;
use crate::credentials::Credentials;
pub(crate) use archive::extract_backup;
pub(crate) use download::BackupClient;

/// One row of a backup section, the raw `;` separated fields.
pub(crate) type Row = Vec<String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BackupError {
    InvalidArchive(String),
    UnexpectedEntries(Vec<String>),
    InvalidFileName(String),
    StaleBackup(String),
    InvalidEncoding(String),
    LineOutsideSection(usize),
    InvalidSection(String, String),
}

impl fmt::Display for BackupError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BackupError::InvalidArchive(s) => write!(f, "backup error: invalid zip archive: {}", s),
            BackupError::UnexpectedEntries(names) => write!(f, "backup error: expected exactly one file in archive, found {:?}", names),
            BackupError::InvalidFileName(s) => write!(f, "backup error: unexpected file name '{}'", s),
            BackupError::StaleBackup(s) => write!(f, "backup error: backup '{}' is too old", s),
            BackupError::InvalidEncoding(s) => write!(f, "backup error: backup is not valid UTF-8: {}", s),
            BackupError::LineOutsideSection(line) => write!(f, "backup error: line {} precedes the first section header", line),
            BackupError::InvalidSection(section, s) => write!(f, "backup error: unable to parse section [{}]: {}", section, s),
        }
    }
}

impl std::error::Error for BackupError {}

/// Parsed content of a backup file, rows grouped by section name.
#[derive(Debug, Default)]
pub(crate) struct Backup {
    sections: BTreeMap<String, Vec<Row>>,
}

impl Backup {
    /// Split backup text into `[section]` blocks and parse each block as `;` delimited csv.
    pub(crate) fn parse(text: &str) -> Result<Backup, BackupError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let mut bodies: Vec<(String, String)> = vec![];
        for (line_no, line) in text.lines().enumerate() {
            if let Some(name) = section_header(line) {
                if bodies.iter().any(|(n, _)| n == name) {
                    warn!("Section [{}] appears more than once, appending rows", name);
                }
                bodies.push((name.to_string(), String::new()));
                continue;
            }

            match bodies.last_mut() {
                Some((_, body)) => {
                    body.push_str(line);
                    body.push('\n');
                }
                None if line.trim().is_empty() => {}
                None => return Err(BackupError::LineOutsideSection(line_no + 1)),
            }
        }

        let mut sections: BTreeMap<String, Vec<Row>> = BTreeMap::new();
        for (name, body) in bodies {
            let rows = parse_rows(&body).map_err(|e| BackupError::InvalidSection(name.clone(), e.to_string()))?;
            sections.entry(name).or_default().extend(rows);
        }

        for (name, rows) in &sections {
            info!("Section [{}]: {} rows", name, rows.len());
        }

        Ok(Backup { sections })
    }

    pub(crate) fn section(&self, name: &str) -> Option<&[Row]> {
        self.sections.get(name).map(|rows| rows.as_slice())
    }

    pub(crate) fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }
}

/// Login, request a fresh archive and parse it.
pub(crate) fn fetch(config: &Config, credentials: &Credentials, now: NaiveDateTime) -> anyhow::Result<Backup> {
    let client = BackupClient::new(config.base_url())?;
    let zip_bytes = client.download(credentials)?;
    let text = extract_backup(&zip_bytes, now, config.max_backup_age())?;
    Ok(Backup::parse(&text)?)
}

fn section_header(line: &str) -> Option<&str> {
    let line = line.trim_end();
    if line.len() >= 2 && line.starts_with('[') && line.ends_with(']') {
        Some(&line[1..line.len() - 1])
    } else {
        None
    }
}

fn parse_rows(body: &str) -> Result<Vec<Row>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut rows = vec![];
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}
