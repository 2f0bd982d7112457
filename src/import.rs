//! Load sheet import
//!
//! A load sheet is a plain text file with one equipment entry per line:
//!
//! ```text
//! # name       | power | qty | hours/day | mode
//! Fridge       | 150 W | x1  | 24 h      | simultaneous
//! Water pump   | 750 W | x1  | 1.5 h     | standalone
//! LED lamp     | 9 W   | x6  | 5 h
//! ```
//!
//! The mode column is optional and defaults to simultaneous.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use rusqlite::Connection;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::db;
use crate::error::SizingError;
use crate::models::Equipment;

pub const LOAD_SHEET_EXTENSION: &str = "loads";

fn line_pattern() -> Result<Regex> {
    Ok(Regex::new(
        r"(?x)
        ^\s*(?P<name>[^|]*?)\s*
        \|\s*(?P<power>\d+(?:\.\d+)?)\s*(?:[wW])?\s*
        \|\s*[xX]?\s*(?P<qty>\d+)\s*
        \|\s*(?P<hours>\d+(?:\.\d+)?)\s*(?:[hH])?\s*
        (?:\|\s*(?P<mode>[A-Za-z-]+)\s*)?$",
    )?)
}

/// Find all load sheets beneath a directory, in path order
pub fn find_load_sheets(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut sheets = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if entry.file_type().is_file()
            && path.extension().is_some_and(|ext| ext == LOAD_SHEET_EXTENSION)
        {
            sheets.push(path.to_path_buf());
        }
    }

    sheets.sort();
    Ok(sheets)
}

/// Parse and validate every entry of a load sheet
///
/// A single bad line rejects the whole sheet.
pub fn parse_load_sheet(content: &str) -> Result<Vec<Equipment>> {
    let pattern = line_pattern()?;
    let mut entries = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let cap = pattern.captures(line).ok_or_else(|| SizingError::LoadSheet {
            line: line_no,
            message: format!("expected 'name | power W | xQTY | hours h [| mode]', got '{line}'"),
        })?;

        let bad_number = |field: &str| SizingError::LoadSheet {
            line: line_no,
            message: format!("{field} is not a number"),
        };
        let power_watts: f64 = cap["power"].parse().map_err(|_| bad_number("power"))?;
        let quantity: u32 = cap["qty"].parse().map_err(|_| bad_number("quantity"))?;
        let hours_per_day: f64 = cap["hours"].parse().map_err(|_| bad_number("hours"))?;

        let runs_simultaneously = match cap.name("mode").map(|m| m.as_str().to_ascii_lowercase()) {
            None => true,
            Some(mode) => match mode.as_str() {
                "simultaneous" | "simult" | "yes" => true,
                "standalone" | "no" => false,
                other => {
                    return Err(SizingError::LoadSheet {
                        line: line_no,
                        message: format!("unknown mode '{other}', use simultaneous or standalone"),
                    }
                    .into());
                }
            },
        };

        let equipment = Equipment {
            name: cap["name"].to_string(),
            power_watts,
            quantity,
            hours_per_day,
            runs_simultaneously,
        };
        equipment.validate().map_err(|e| SizingError::LoadSheet {
            line: line_no,
            message: e.to_string(),
        })?;

        entries.push(equipment);
    }

    Ok(entries)
}

fn read_sheet(path: &Path) -> Result<Vec<Equipment>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    parse_load_sheet(&content).with_context(|| format!("In {}", path.display()))
}

/// Read a single load sheet, or every sheet beneath a directory
///
/// A broken sheet inside a directory is counted and skipped; a broken
/// single file is an error.
fn collect_entries(path: &Path) -> Result<(Vec<Equipment>, ImportStats)> {
    let mut stats = ImportStats::default();

    if !path.is_dir() {
        let entries = read_sheet(path)?;
        stats.sheets = 1;
        stats.equipment = entries.len();
        return Ok((entries, stats));
    }

    let sheets = find_load_sheets(path)?;
    info!(dir = %path.display(), found = sheets.len(), "scanning for load sheets");

    let mut entries = Vec::new();
    for sheet in &sheets {
        match read_sheet(sheet) {
            Ok(parsed) => {
                stats.sheets += 1;
                stats.equipment += parsed.len();
                entries.extend(parsed);
            }
            Err(e) => {
                warn!("{:#}", e);
                stats.errors += 1;
            }
        }
    }

    Ok((entries, stats))
}

/// Import load sheets into the store, optionally replacing the current list
///
/// Everything is parsed before the store is touched, and the clear and the
/// inserts commit together, so a failed import leaves the list unchanged.
pub fn import_to_database(conn: &Connection, path: &Path, clear: bool) -> Result<ImportStats> {
    let (entries, stats) = collect_entries(path)?;

    let tx = conn.unchecked_transaction()?;
    if clear {
        db::clear_equipment(&tx)?;
    }
    for equipment in &entries {
        db::insert_equipment(&tx, equipment)?;
    }
    tx.commit()?;

    info!(path = %path.display(), entries = entries.len(), "load sheets imported");
    Ok(stats)
}

#[derive(Debug, Default, PartialEq)]
pub struct ImportStats {
    pub sheets: usize,
    pub equipment: usize,
    pub errors: usize,
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Imported {} equipment entries from {} load sheets. Errors: {}",
            self.equipment, self.sheets, self.errors
        )
    }
}
