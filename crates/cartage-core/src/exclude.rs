//! Baseline exclusion: ids the platform already provides are dropped from a
//! computed manifest. Matching is on the full id, so a different version of a
//! baselined library stays in the manifest.

use crate::codec::read_list;
use crate::CoreError;
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filtered {
    pub kept: BTreeSet<String>,
    pub removed: BTreeSet<String>,
}

pub fn exclude<'a>(
    manifest: &BTreeSet<String>,
    baselines: impl IntoIterator<Item = &'a BTreeSet<String>>,
) -> Filtered {
    let baselines: Vec<&BTreeSet<String>> = baselines.into_iter().collect();
    let (removed, kept) = manifest
        .iter()
        .cloned()
        .partition(|id| baselines.iter().any(|b| b.contains(id)));
    Filtered { kept, removed }
}

/// Union of the baseline list files. Missing files read as empty.
pub fn load_baseline(paths: &[PathBuf]) -> Result<BTreeSet<String>, CoreError> {
    let mut union = BTreeSet::new();
    for path in paths {
        union.extend(read_list(path)?);
    }
    Ok(union)
}
