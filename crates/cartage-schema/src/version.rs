//! Structured version parsing for library conflict resolution.
//!
//! Accepted grammar: `MAJOR[.MINOR[.PATCH]][SEP QUALIFIER]`, where the numeric
//! parts are decimal digits, `SEP` is one of `-`, `.`, `+`, `_`, and the
//! qualifier starts with an ASCII letter or digit. A qualifier may also follow
//! the last number directly when it starts with a letter (`1.0rc1`).
//! Missing minor/patch parts are zero.

use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unparseable version '{version}': {reason}")]
pub struct VersionError {
    pub version: String,
    pub reason: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    major: u64,
    minor: u64,
    patch: u64,
    qualifier: Option<String>,
    original: String,
}

/// The most significant component in which two versions differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VersionDelta {
    Major,
    Minor,
    Patch,
    Qualifier,
    Same,
}

impl Version {
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let err = |reason| VersionError {
            version: input.to_owned(),
            reason,
        };
        let text = input.trim();
        if text.is_empty() {
            return Err(err("empty version"));
        }

        let mut numbers = [0u64; 3];
        let mut rest = text;
        for (index, slot) in numbers.iter_mut().enumerate() {
            let digits = if index == 0 {
                rest
            } else {
                match rest.strip_prefix('.') {
                    Some(after) if after.starts_with(|c: char| c.is_ascii_digit()) => after,
                    _ => break,
                }
            };
            let end = digits
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(digits.len());
            if end == 0 {
                return Err(err("must start with a numeric major version"));
            }
            *slot = digits[..end]
                .parse()
                .map_err(|_| err("numeric component out of range"))?;
            rest = &digits[end..];
        }

        let qualifier = if rest.is_empty() {
            None
        } else if rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
            Some(rest)
        } else {
            match rest.strip_prefix(|c: char| matches!(c, '-' | '.' | '+' | '_')) {
                Some(q) if q.starts_with(|c: char| c.is_ascii_alphanumeric()) => Some(q),
                _ => return Err(err("malformed qualifier")),
            }
        };
        if let Some(q) = qualifier {
            if !q
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '+' | '_'))
            {
                return Err(err("malformed qualifier"));
            }
        }

        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            qualifier: qualifier.map(str::to_owned),
            original: input.to_owned(),
        })
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// The version exactly as it was written.
    pub fn as_str(&self) -> &str {
        &self.original
    }

    pub fn delta(&self, other: &Version) -> VersionDelta {
        if self.major != other.major {
            VersionDelta::Major
        } else if self.minor != other.minor {
            VersionDelta::Minor
        } else if self.patch != other.patch {
            VersionDelta::Patch
        } else if self.original != other.original {
            VersionDelta::Qualifier
        } else {
            VersionDelta::Same
        }
    }
}

impl Ord for Version {
    /// Numeric triple first, then a release outranks any qualified build of the
    /// same triple. Qualifiers compare in natural order and the
    /// original text breaks remaining ties so
    /// the order is total.
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.qualifier, &other.qualifier) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => compare_qualifiers(a, b),
            })
            .then_with(|| self.original.cmp(&other.original))
    }
}

/// Natural order over qualifiers: digit runs compare by numeric value and text
/// runs case-insensitively, so `rc10` follows `rc9` and `10` follows `9`. A
/// digit run outranks a text run at the same position; a qualifier that is a
/// prefix of another ranks lower.
fn compare_qualifiers(a: &str, b: &str) -> Ordering {
    let mut left = QualifierRuns(a);
    let mut right = QualifierRuns(b);
    loop {
        let ordering = match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => compare_runs(x, y),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

fn compare_runs(a: &str, b: &str) -> Ordering {
    let is_digits = |s: &str| s.starts_with(|c: char| c.is_ascii_digit());
    match (is_digits(a), is_digits(b)) {
        (true, true) => {
            let a = a.trim_start_matches('0');
            let b = b.trim_start_matches('0');
            a.len().cmp(&b.len()).then_with(|| a.cmp(b))
        }
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a
            .bytes()
            .map(|c| c.to_ascii_lowercase())
            .cmp(b.bytes().map(|c| c.to_ascii_lowercase())),
    }
}

/// Maximal runs of ASCII digits and of everything else.
struct QualifierRuns<'a>(&'a str);

impl<'a> Iterator for QualifierRuns<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let first = self.0.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .0
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(self.0.len());
        let (run, rest) = self.0.split_at(end);
        self.0 = rest;
        Some(run)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}
