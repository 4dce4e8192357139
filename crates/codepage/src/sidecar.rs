//! `.cpg` sidecar discovery.
//!
//! Shapefile tooling writes the encoding of a `.dbf` into a sibling text file
//! with the same base name and a `.cpg` extension. Only the first line is
//! meaningful.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Extension of the encoding sidecar, compared case-insensitively.
pub const SIDECAR_EXTENSION: &str = "cpg";

/// Finds `<stem>.cpg` in the same directory as `dbf_path`.
///
/// Both the stem and the extension are matched case-insensitively, so
/// `ROADS.DBF` pairs with `roads.cpg`. Returns `Ok(None)` when no sidecar
/// exists.
pub fn find_sidecar(dbf_path: &Path) -> io::Result<Option<PathBuf>> {
    let stem = match dbf_path.file_stem().and_then(|s| s.to_str()) {
        Some(s) => s.to_lowercase(),
        None => return Ok(None),
    };
    let dir = match dbf_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !dir.is_dir() {
        return Ok(None);
    }

    for entry in fs::read_dir(&dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let ext_matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(SIDECAR_EXTENSION))
            .unwrap_or(false);
        let stem_matches = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase() == stem)
            .unwrap_or(false);
        if ext_matches && stem_matches {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

/// Reads the codec name declared on the first line of a `.cpg` file.
///
/// Returns `Ok(None)` for an empty or whitespace-only file.
pub fn read_declared_encoding(cpg_path: &Path) -> io::Result<Option<String>> {
    let bytes = fs::read(cpg_path)?;
    let text = String::from_utf8_lossy(&bytes);
    let first = text
        .lines()
        .next()
        .map(|l| l.trim_start_matches('\u{feff}').trim())
        .unwrap_or("");
    if first.is_empty() {
        Ok(None)
    } else {
        Ok(Some(first.to_string()))
    }
}
