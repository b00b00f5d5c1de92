//! # File I/O Module
//!
//! Reading rig exports and writing analysis outputs:
//! - **Loading**: rig CSV exports into a cleaned [`RawTable`]
//! - **Atomic writes**: write to .tmp, sync, rename so a crashed run never
//!   leaves a half-written report behind
//! - **Locked appends**: results CSVs are shared by every run that targets the
//!   same output directory, so appends hold an exclusive OS lock
//!
//! ## Input Format
//!
//! ```text
//! 1 _ 1,,                  <- free-form title line (skipped)
//! "Time","Force","Stroke"  <- header, quoted or not
//! "sec","N","mm"           <- units row (dropped)
//! 0.0,0.0,0.0              <- data
//! 0.1,1.2,0.05
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use tensile_core::file_io::load_table;
//! use std::path::Path;
//!
//! let table = load_table(Path::new("data/group_A/10in/test--line-crimp-21--1.csv"))?;
//! println!("{} samples", table.len());
//! # Ok::<(), tensile_core::errors::TensileError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use fs2::FileExt;
use serde::Serialize;

use crate::errors::{TensileError, TensileResult};
use crate::table::RawTable;

/// Column names the loader looks for in the header row
const FORCE_COLUMN: &str = "Force";
const STROKE_COLUMN: &str = "Stroke";
const TIME_COLUMN: &str = "Time";

/// Load a rig CSV export.
///
/// # Returns
///
/// * `Ok(RawTable)` - cleaned samples in acquisition order
/// * `Err(TensileError::FormatError)` - not a `.csv`, unreadable, or missing `Force`/`Stroke`
/// * `Err(TensileError::InvalidData)` - more than half of a required column unparsable
/// * `Err(TensileError::EmptyData)` - no rows left after cleaning
/// * `Err(TensileError::FileError)` - I/O error opening the file
pub fn load_table(path: &Path) -> TensileResult<RawTable> {
    let path_text = path.display().to_string();
    tracing::debug!(path = %path_text, "loading file");

    if !path_text.ends_with(".csv") {
        return Err(TensileError::format_error(
            path_text,
            "File must be CSV format",
        ));
    }

    let file = File::open(path)
        .map_err(|e| TensileError::file_error("open", path_text.clone(), e.to_string()))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut records = reader.records();
    let mut next_record = |what: &str| -> TensileResult<Option<csv::StringRecord>> {
        match records.next() {
            None => Ok(None),
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(TensileError::format_error(
                path_text.clone(),
                format!("Unreadable {}: {}", what, e),
            )),
        }
    };

    // Title line, then header
    let empty = || TensileError::format_error(path_text.clone(), "Empty CSV file");
    next_record("title line")?.ok_or_else(empty)?;
    let header = next_record("header")?.ok_or_else(empty)?;

    let column = |name: &str| header.iter().position(|h| h == name);
    let missing: Vec<&str> = [FORCE_COLUMN, STROKE_COLUMN]
        .into_iter()
        .filter(|name| column(*name).is_none())
        .collect();
    if !missing.is_empty() {
        let available: Vec<&str> = header.iter().collect();
        return Err(TensileError::format_error(
            path_text.clone(),
            format!(
                "Missing required columns: {:?}. Available columns: {:?}",
                missing, available
            ),
        ));
    }
    let (force_idx, stroke_idx) = match (column(FORCE_COLUMN), column(STROKE_COLUMN)) {
        (Some(f), Some(s)) => (f, s),
        _ => return Err(empty()),
    };
    let time_idx = column(TIME_COLUMN);

    let mut rows = Vec::new();
    while let Some(record) = next_record("data row")? {
        rows.push(record);
    }
    if rows.is_empty() {
        return Err(empty());
    }

    // First row under the header carries units
    let cell = |record: &csv::StringRecord, idx: usize| record.get(idx).unwrap_or("").to_string();
    let data = &rows[1..];
    let force: Vec<String> = data.iter().map(|r| cell(r, force_idx)).collect();
    let stroke: Vec<String> = data.iter().map(|r| cell(r, stroke_idx)).collect();
    let time: Option<Vec<String>> =
        time_idx.map(|idx| data.iter().map(|r| cell(r, idx)).collect());

    let table = RawTable::from_cells(path_text.clone(), time.as_deref(), &force, &stroke)?;
    tracing::debug!(path = %path_text, samples = table.len(), "file loaded");
    Ok(table)
}

/// Create a directory and its parents; succeeds if it already exists.
pub fn ensure_dir(dir: &Path) -> TensileResult<()> {
    fs::create_dir_all(dir).map_err(|e| {
        TensileError::file_error("create directory", dir.display().to_string(), e.to_string())
    })
}

/// Write a file with atomic semantics.
///
/// The write process:
/// 1. Write to a temporary file (`<name>.tmp`)
/// 2. Sync to disk (fsync)
/// 3. Rename over the target (atomic on most filesystems)
pub fn write_atomic(path: &Path, contents: &[u8]) -> TensileResult<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name).to_path_buf();

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        TensileError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(contents).map_err(|e| {
        TensileError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        TensileError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        // Clean up temp file if rename fails
        let _ = fs::remove_file(&tmp_path);
        TensileError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    Ok(())
}

/// Append serializable rows to a CSV file, writing the header only when the
/// file is new or empty.
///
/// Holds an exclusive OS-level lock (via fs2) for the whole append so
/// concurrent runs never interleave rows.
pub fn append_csv_rows<T: Serialize>(path: &Path, rows: &[T]) -> TensileResult<()> {
    let path_text = path.display().to_string();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            TensileError::file_error("open for append", path_text.clone(), e.to_string())
        })?;

    file.lock_exclusive()
        .map_err(|e| TensileError::file_error("lock", path_text.clone(), e.to_string()))?;

    let result = (|| -> TensileResult<()> {
        let is_new = file
            .metadata()
            .map_err(|e| TensileError::file_error("stat", path_text.clone(), e.to_string()))?
            .len()
            == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(&file);
        for row in rows {
            writer.serialize(row)?;
        }
        writer
            .flush()
            .map_err(|e| TensileError::file_error("write", path_text.clone(), e.to_string()))?;
        Ok(())
    })();

    // Lock is released when the handle closes; unlock early so waiters proceed
    let _ = FileExt::unlock(&file);
    result
}
