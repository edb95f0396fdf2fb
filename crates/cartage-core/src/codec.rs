//! Canonical library list files: one id per line, sorted, deduplicated, with
//! a trailing newline.

use crate::CoreError;
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// Parse list text. Blank lines are skipped and entries are trimmed.
pub fn parse_list(text: &str) -> BTreeSet<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect()
}

pub fn render_list(ids: &BTreeSet<String>) -> String {
    let mut out = String::with_capacity(ids.iter().map(|id| id.len() + 1).sum());
    for id in ids {
        out.push_str(id);
        out.push('\n');
    }
    out
}

/// Read a list file. A missing file reads as the empty list.
pub fn read_list(path: &Path) -> Result<BTreeSet<String>, CoreError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(parse_list(&text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("list file {} not found, treating as empty", path.display());
            Ok(BTreeSet::new())
        }
        Err(e) => Err(CoreError::Io(e)),
    }
}

/// Overwrite `path` with the canonical form of `ids`.
pub fn write_list(path: &Path, ids: &BTreeSet<String>) -> Result<(), CoreError> {
    write_atomic(path, render_list(ids).as_bytes())?;
    debug!("wrote {} ids to {}", ids.len(), path.display());
    Ok(())
}

/// Write through a temp file in the target directory, then rename over the target.
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> Result<(), std::io::Error> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    // Make the rename durable.
    if let Ok(f) = fs::File::open(dir) {
        let _ = f.sync_all();
    }
    Ok(())
}
