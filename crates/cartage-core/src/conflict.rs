//! Version conflict resolution for one library key.
//!
//! Policy: the highest requested version wins. Requests that differ from it in
//! the minor component are logged at `warn`, patch and qualifier differences at
//! `info`. A major mismatch or an unparseable version aborts the run.

use crate::aggregate::ConflictGroup;
use cartage_schema::{CartridgeName, LibraryKey, Version, VersionDelta, VersionError};
use serde::Serialize;
use std::fmt::{self, Write as _};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionConflictError {
    #[error("{key}: incompatible major versions {higher} and {lower}; requested as {}", describe_requests(.requests))]
    MajorMismatch {
        key: LibraryKey,
        higher: String,
        lower: String,
        requests: ConflictGroup,
    },
    #[error("{key}: {source}; requested as {}", describe_requests(.requests))]
    UnparseableVersion {
        key: LibraryKey,
        source: VersionError,
        requests: ConflictGroup,
    },
    #[error("{key}: no versions requested")]
    NoVersions { key: LibraryKey },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftKind {
    Minor,
    Patch,
    Qualifier,
}

impl DriftKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DriftKind::Minor => "minor",
            DriftKind::Patch => "patch",
            DriftKind::Qualifier => "qualifier",
        }
    }
}

impl fmt::Display for DriftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tolerated difference between the chosen version and another requested one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionDrift {
    pub key: LibraryKey,
    pub kind: DriftKind,
    pub chosen: String,
    /// The lower version of the adjacent pair that produced this drift.
    pub other: String,
    pub requests: ConflictGroup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub version: String,
    pub drifts: Vec<VersionDrift>,
}

/// `1.2.0 by [a, b], 1.3.1 by [c]`
pub(crate) fn describe_requests(requests: &ConflictGroup) -> String {
    let mut out = String::new();
    for (i, (version, cartridges)) in requests.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let names: Vec<&str> = cartridges.iter().map(CartridgeName::as_str).collect();
        let _ = write!(out, "{version} by [{}]", names.join(", "));
    }
    out
}

/// Pick one version of `key` out of every requested version.
pub fn resolve(key: &LibraryKey, requests: &ConflictGroup) -> Result<Resolution, VersionConflictError> {
    if requests.len() == 1 {
        if let Some(version) = requests.keys().next() {
            return Ok(Resolution {
                version: version.clone(),
                drifts: Vec::new(),
            });
        }
    }

    let mut parsed = requests
        .keys()
        .map(|v| Version::parse(v))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| VersionConflictError::UnparseableVersion {
            key: key.clone(),
            source,
            requests: requests.clone(),
        })?;
    parsed.sort_by(|a, b| b.cmp(a));

    let Some(chosen) = parsed.first() else {
        return Err(VersionConflictError::NoVersions { key: key.clone() });
    };

    let mut drifts = Vec::new();
    for pair in parsed.windows(2) {
        let (higher, lower) = (&pair[0], &pair[1]);
        let kind = match higher.delta(lower) {
            VersionDelta::Major => {
                return Err(VersionConflictError::MajorMismatch {
                    key: key.clone(),
                    higher: higher.to_string(),
                    lower: lower.to_string(),
                    requests: requests.clone(),
                });
            }
            VersionDelta::Minor => DriftKind::Minor,
            VersionDelta::Patch => DriftKind::Patch,
            VersionDelta::Qualifier | VersionDelta::Same => DriftKind::Qualifier,
        };
        let detail = describe_requests(requests);
        if kind == DriftKind::Minor {
            warn!("{key}: minor version drift, using {chosen} over {lower}; requested as {detail}");
        } else {
            info!("{key}: version drift, using {chosen} over {lower}; requested as {detail}");
        }
        drifts.push(VersionDrift {
            key: key.clone(),
            kind,
            chosen: chosen.to_string(),
            other: lower.to_string(),
            requests: requests.clone(),
        });
    }

    Ok(Resolution {
        version: chosen.to_string(),
        drifts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Run `f` under a subscriber that records every event, one line each.
    fn with_logs<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
        let buffer = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_target(false)
            .without_time()
            .finish();
        let out = tracing::subscriber::with_default(subscriber, f);
        let text = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        (out, text.lines().map(str::to_owned).collect())
    }

    fn key() -> LibraryKey {
        LibraryKey::new("org.slf4j", "slf4j-api")
    }

    fn group(entries: &[(&str, &[&str])]) -> ConflictGroup {
        entries
            .iter()
            .map(|(version, names)| {
                (
                    (*version).to_owned(),
                    names.iter().map(|n| CartridgeName::new(*n)).collect::<BTreeSet<_>>(),
                )
            })
            .collect()
    }

    #[test]
    fn single_version_is_returned_unchanged() {
        let r = resolve(&key(), &group(&[("1.2.0", &["a"])])).unwrap();
        assert_eq!(r.version, "1.2.0");
        assert!(r.drifts.is_empty());
    }

    #[test]
    fn single_version_logs_nothing() {
        let (r, logs) = with_logs(|| resolve(&key(), &group(&[("1.2.0", &["a", "b"])])));
        assert_eq!(r.unwrap().version, "1.2.0");
        assert!(logs.is_empty(), "{logs:?}");
    }

    #[test]
    fn minor_drift_logs_exactly_one_warning() {
        let (r, logs) = with_logs(|| {
            resolve(&key(), &group(&[("1.2.0", &["A"]), ("1.3.1", &["B"])]))
        });
        assert_eq!(r.unwrap().version, "1.3.1");
        assert_eq!(logs.len(), 1, "{logs:?}");
        assert!(logs[0].contains("WARN"), "{logs:?}");
        assert!(logs[0].contains("1.3.1") && logs[0].contains("1.2.0"), "{logs:?}");
    }

    #[test]
    fn patch_drift_logs_at_info() {
        let (_, logs) = with_logs(|| {
            resolve(&key(), &group(&[("1.2.0", &["A"]), ("1.2.5", &["B"])]))
        });
        assert_eq!(logs.len(), 1, "{logs:?}");
        assert!(logs[0].contains("INFO"), "{logs:?}");
    }

    #[test]
    fn numbered_qualifiers_pick_the_newest() {
        let r = resolve(&key(), &group(&[("1.2.3.9", &["A"]), ("1.2.3.10", &["B"])])).unwrap();
        assert_eq!(r.version, "1.2.3.10");
        assert_eq!(r.drifts[0].other, "1.2.3.9");

        let r = resolve(&key(), &group(&[("1.0.0-rc9", &["A"]), ("1.0.0-rc10", &["B"])])).unwrap();
        assert_eq!(r.version, "1.0.0-rc10");
    }

    #[test]
    fn single_version_is_not_parsed() {
        let r = resolve(&key(), &group(&[("latest.release", &["a"])])).unwrap();
        assert_eq!(r.version, "latest.release");
    }

    #[test]
    fn minor_drift_picks_higher_and_reports_once() {
        let r = resolve(&key(), &group(&[("1.2.0", &["A"]), ("1.3.1", &["B"])])).unwrap();
        assert_eq!(r.version, "1.3.1");
        assert_eq!(r.drifts.len(), 1);
        let drift = &r.drifts[0];
        assert_eq!(drift.kind, DriftKind::Minor);
        assert_eq!(drift.chosen, "1.3.1");
        assert_eq!(drift.other, "1.2.0");
        let detail = describe_requests(&drift.requests);
        for needle in ["A", "B", "1.2.0", "1.3.1"] {
            assert!(detail.contains(needle), "{detail}");
        }
    }

    #[test]
    fn patch_and_qualifier_drift() {
        let r = resolve(
            &key(),
            &group(&[("1.2.0", &["a"]), ("1.2.3", &["b"]), ("1.2.3-rc1", &["c"])]),
        )
        .unwrap();
        assert_eq!(r.version, "1.2.3");
        let kinds: Vec<_> = r.drifts.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DriftKind::Qualifier, DriftKind::Patch]);
        assert!(r.drifts.iter().all(|d| d.chosen == "1.2.3"));
    }

    #[test]
    fn ordering_is_numeric_not_lexical() {
        let r = resolve(&key(), &group(&[("1.9.0", &["a"]), ("1.10.0", &["b"])])).unwrap();
        assert_eq!(r.version, "1.10.0");
    }

    #[test]
    fn highest_keeps_original_text() {
        let r = resolve(&key(), &group(&[("31.1-jre", &["a"]), ("31.0.1-jre", &["b"])])).unwrap();
        assert_eq!(r.version, "31.1-jre");
    }

    #[test]
    fn major_mismatch_is_fatal_and_names_everyone() {
        let err = resolve(&key(), &group(&[("1.0.0", &["A"]), ("2.0.0", &["B"])])).unwrap_err();
        assert!(matches!(
            err,
            VersionConflictError::MajorMismatch { ref higher, ref lower, .. }
                if higher == "2.0.0" && lower == "1.0.0"
        ));
        let msg = err.to_string();
        assert!(msg.starts_with("org.slf4j:slf4j-api:"), "{msg}");
        for needle in ["1.0.0 by [A]", "2.0.0 by [B]"] {
            assert!(msg.contains(needle), "{msg}");
        }
    }

    #[test]
    fn major_mismatch_after_minor_drift_still_fails() {
        let err = resolve(
            &key(),
            &group(&[("2.1.0", &["a"]), ("2.0.0", &["b"]), ("1.9.0", &["c"])]),
        )
        .unwrap_err();
        assert!(matches!(err, VersionConflictError::MajorMismatch { .. }));
    }

    #[test]
    fn unparseable_version_is_fatal() {
        let err = resolve(
            &key(),
            &group(&[("1.0.0", &["a"]), ("[1.0,2.0)", &["b", "c"])]),
        )
        .unwrap_err();
        assert!(matches!(err, VersionConflictError::UnparseableVersion { .. }));
        let msg = err.to_string();
        for needle in ["org.slf4j:slf4j-api", "[1.0,2.0)", "a", "b", "c"] {
            assert!(msg.contains(needle), "{msg}");
        }
    }
}
