//! Sheets stored as JSON files.
//!
//! A location's `source` is either a single `.json` file or a directory of
//! them (one sheet per file, sheet title = file stem). A sheet file is either
//! a bare array of row objects, or a stamped object:
//!
//! ```json
//! { "updated": "2024-06-15T14:30:45Z", "records": [ { "begin": "PS3568.U8", ... } ] }
//! ```
//!
//! Stamped sheets report `updated` as their modification time; bare arrays
//! fall back to the file's mtime.
//!
//! Listing never builds rows. A bare array is recognized from its first
//! byte and not parsed at all; a stamped object is scanned once for
//! `updated`, with its records skipped.

use jwalk::WalkDir;
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::{RawRecord, RecordSource, SheetInfo, SourceError};
use crate::config::LocationConfig;
use crate::utils::date::parse_system_time;
use crate::utils::mtime::get_mtime;

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSheetSource;

#[derive(Deserialize)]
#[serde(untagged)]
enum SheetFile {
    Records(Vec<RawRecord>),
    Stamped { records: Vec<RawRecord> },
}

/// The `updated` stamp of a stamped sheet; every other key is skipped.
#[derive(Deserialize)]
struct SheetStamp {
    #[serde(default)]
    updated: Option<String>,
}

impl SheetFile {
    fn into_records(self) -> Vec<RawRecord> {
        match self {
            Self::Records(records) | Self::Stamped { records } => records,
        }
    }
}

impl RecordSource for JsonSheetSource {
    fn sheets(&self, location: &LocationConfig) -> Result<Vec<SheetInfo>, SourceError> {
        let files = sheet_files(&location.source)?;
        if files.is_empty() {
            return Err(SourceError::NoSheets(location.source.display().to_string()));
        }

        let mut sheets = files
            .into_iter()
            .map(|path| sheet_info(&path))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(worksheet) = &location.worksheet {
            sheets.retain(|s| s.title.eq_ignore_ascii_case(worksheet));
            if sheets.is_empty() {
                return Err(SourceError::WorksheetNotFound {
                    origin: location.source.display().to_string(),
                    worksheet: worksheet.clone(),
                });
            }
        }

        Ok(sheets)
    }

    fn records(&self, sheet: &SheetInfo) -> Result<Vec<RawRecord>, SourceError> {
        let path = PathBuf::from(&sheet.key);
        let content = fs::read_to_string(&path).map_err(|e| SourceError::Open(path.clone(), e))?;
        let file: SheetFile =
            serde_json::from_str(&content).map_err(|e| SourceError::Malformed(path, e))?;
        Ok(file.into_records())
    }
}

/// Sheet files of a source path, sorted by path.
fn sheet_files(source: &Path) -> Result<Vec<PathBuf>, SourceError> {
    if source.is_file() {
        return Ok(vec![source.to_path_buf()]);
    }
    if !source.is_dir() {
        return Err(SourceError::Open(
            source.to_path_buf(),
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
        ));
    }

    let mut files: Vec<_> = WalkDir::new(source)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .filter(|p| is_sheet_file(p))
        .collect();
    files.sort();
    Ok(files)
}

fn is_sheet_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'));
    !hidden && path.extension().is_some_and(|ext| ext == "json")
}

fn sheet_info(path: &Path) -> Result<SheetInfo, SourceError> {
    let modified = match first_byte(path)? {
        Some(b'{') => {
            let file = File::open(path).map_err(|e| SourceError::Open(path.to_path_buf(), e))?;
            let stamp: SheetStamp = serde_json::from_reader(BufReader::new(file))
                .map_err(|e| SourceError::Malformed(path.to_path_buf(), e))?;
            match stamp.updated {
                Some(stamp) => parse_stamp(&stamp, path),
                None => get_mtime(path),
            }
        }
        _ => get_mtime(path),
    };

    let title = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(SheetInfo {
        title,
        key: path.display().to_string(),
        modified,
    })
}

/// First non-whitespace byte of a file, `None` if there is none.
fn first_byte(path: &Path) -> Result<Option<u8>, SourceError> {
    let open_error = |e| SourceError::Open(path.to_path_buf(), e);
    let mut reader = BufReader::new(File::open(path).map_err(open_error)?);
    loop {
        let buf = reader.fill_buf().map_err(open_error)?;
        if buf.is_empty() {
            return Ok(None);
        }
        if let Some(&b) = buf.iter().find(|b| !b.is_ascii_whitespace()) {
            return Ok(Some(b));
        }
        let len = buf.len();
        reader.consume(len);
    }
}

fn parse_stamp(stamp: &str, path: &Path) -> Option<SystemTime> {
    let parsed = parse_system_time(stamp);
    if parsed.is_none() {
        crate::log!("warning"; "unreadable `updated` stamp {:?} in {}", stamp, path.display());
    }
    parsed
}
