use crate::record::ProductRecord;
use crate::storage::traits::{RecordSink, StorageResult};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Append-only JSON Lines file of product records
///
/// The file is opened in append mode and never truncated, so records from
/// earlier runs are kept. Writers serialize on a mutex and every line is
/// written with a single `write_all` followed by a flush, which keeps lines
/// from concurrent workers whole.
pub struct JsonlSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlSink {
    /// Opens `path` for appending, creating it if needed
    pub fn open(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for JsonlSink {
    fn append(&self, record: &ProductRecord) -> StorageResult<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

/// Records read back from a JSONL file
#[derive(Debug, Default)]
pub struct RecordLoad {
    /// Parsed records in file order
    pub records: Vec<ProductRecord>,
    /// Lines that could not be parsed
    pub skipped: usize,
}

/// Reads every record from a JSONL file
///
/// Blank lines are ignored. Malformed lines, such as a line torn by a crash
/// mid-write, are logged and skipped.
pub fn load_records(path: &Path) -> StorageResult<RecordLoad> {
    let reader = BufReader::new(File::open(path)?);
    let mut load = RecordLoad::default();

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<ProductRecord>(&line) {
            Ok(record) => load.records.push(record),
            Err(e) => {
                tracing::warn!("Error parsing line {}: {}", number + 1, e);
                load.skipped += 1;
            }
        }
    }

    Ok(load)
}
