//! Line-oriented flat files
//!
//! Both the alias file and the monitoring file are plain text, one record
//! per line. Blank lines and `#` comments are ignored on read. Writes go to
//! a uniquely named sibling temp file which is synced and renamed over the
//! target, so readers never observe a half-written file.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{AppError, Result};

/// A non-blank, non-comment line with its 1-based line number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub line_number: usize,
    pub content: String,
}

/// Read the records of a flat file.
///
/// Returns `Ok(None)` when the file does not exist yet.
pub fn read_records(path: &Path) -> Result<Option<Vec<Record>>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(AppError::Io(format!(
                "failed to read {}: {}",
                path.display(),
                e
            )));
        }
    };

    let records = text
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let content = line.trim();
            if content.is_empty() || content.starts_with('#') {
                None
            } else {
                Some(Record {
                    line_number: i + 1,
                    content: content.to_string(),
                })
            }
        })
        .collect();

    Ok(Some(records))
}

/// Atomically replace `path` with `header` comment lines followed by `lines`.
pub fn write_atomic<I>(path: &Path, header: &[&str], lines: I) -> Result<()>
where
    I: IntoIterator<Item = String>,
{
    let mut payload = String::new();
    for comment in header {
        payload.push_str("# ");
        payload.push_str(comment);
        payload.push('\n');
    }
    for line in lines {
        payload.push_str(&line);
        payload.push('\n');
    }

    let temp_path = temp_path_for(path);
    let result = write_and_rename(path, &temp_path, payload.as_bytes());
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result.map_err(|e| AppError::write_failed(path.display(), e))
}

fn write_and_rename(path: &Path, temp_path: &Path, payload: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::File::create(temp_path)?;
    file.write_all(payload)?;
    file.sync_all()?;
    drop(file);

    fs::rename(temp_path, path)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "penwatch".to_string());
    path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()))
}
