use std::io::{Cursor, Read};
use chrono::{Duration, NaiveDateTime};
use log::info;
use zip::ZipArchive;
use crate::backup::BackupError;

/// Backup file inside the archive is named after its creation time, e.g. `2024-03-05_14_02_11.txt`
const BACKUP_FILE_NAME_FORMAT: &str = "%Y-%m-%d_%H_%M_%S.txt";

/// Unpack the single text file from a backup archive. Rejects archives created more than
/// `max_age` before `now`.
pub(crate) fn extract_backup(zip_bytes: &[u8], now: NaiveDateTime, max_age: Duration) -> Result<String, BackupError> {
    let mut archive = ZipArchive::new(Cursor::new(zip_bytes))
        .map_err(|e| BackupError::InvalidArchive(e.to_string()))?;

    if archive.len() != 1 {
        let names = archive.file_names().map(str::to_string).collect();
        return Err(BackupError::UnexpectedEntries(names));
    }

    let mut entry = archive.by_index(0).map_err(|e| BackupError::InvalidArchive(e.to_string()))?;
    let name = entry.name().to_string();

    let created = NaiveDateTime::parse_from_str(&name, BACKUP_FILE_NAME_FORMAT)
        .map_err(|_| BackupError::InvalidFileName(name.clone()))?;
    if now - created > max_age {
        return Err(BackupError::StaleBackup(name));
    }

    let mut buffer: Vec<u8> = vec![];
    entry.read_to_end(&mut buffer).map_err(|e| BackupError::InvalidArchive(e.to_string()))?;
    let text = String::from_utf8(buffer).map_err(|e| BackupError::InvalidEncoding(e.to_string()))?;

    info!("Extracted {} ({} bytes)", name, text.len());
    Ok(text)
}
