//! Directory scanning, ordering and size formatting for listings.
use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

use crate::domain::{DirectoryEntry, SortOrder, SortSpec};
use crate::services::{ServiceError, ServiceResult};

const UNITS: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];

/// Collect the immediate children of `dir`. Symlinks are followed; entries
/// whose metadata cannot be read (e.g. dangling links) are skipped.
pub fn scan_directory(dir: &Path) -> ServiceResult<Vec<DirectoryEntry>> {
    let entries = fs::read_dir(dir)
        .map_err(ServiceError::ListEntries)?
        .filter_map(|e| e.ok())
        .filter_map(|entry| {
            let path = entry.path();
            let metadata = match fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(err) => {
                    log::debug!("Skipping {}: {err}", path.display());
                    return None;
                }
            };
            let is_directory = metadata.is_dir();

            Some(DirectoryEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_directory,
                size_bytes: if is_directory { 0 } else { metadata.len() },
                last_modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            })
        })
        .collect();

    Ok(entries)
}

/// Order entries directories-first. Descending order flips each partition
/// internally but never moves files ahead of directories.
pub fn sort_entries(entries: &mut [DirectoryEntry], spec: SortSpec) {
    entries.sort_by(|a, b| match (a.is_directory, b.is_directory) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => {
            let ordering = a.cmp_by(b, spec.field);
            match spec.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        }
    });
}

/// Human readable size using 1024-based units, e.g. `1,023 B` or `3 MB`.
///
/// The scaled value is rounded half to even, so `1536` is `2 KB` and `2560`
/// is `2 KB`.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", group_thousands(bytes));
    }

    let mut unit = 0;
    while unit + 1 < UNITS.len() && bytes >> (10 * (unit + 2)) > 0 {
        unit += 1;
    }
    let divisor = 1u64 << (10 * (unit + 1));
    let (quotient, remainder) = (bytes / divisor, bytes % divisor);
    let twice = u128::from(remainder) * 2;
    let rounds_up = match twice.cmp(&u128::from(divisor)) {
        Ordering::Greater => true,
        Ordering::Equal => quotient % 2 == 1,
        Ordering::Less => false,
    };
    let value = if rounds_up { quotient + 1 } else { quotient };
    format!("{} {}B", group_thousands(value), UNITS[unit])
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
