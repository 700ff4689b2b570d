//! Round identification from input file names.
//!
//! A round's label is the file name without its extension. Labels are ordered
//! the way people read them: "L2R2" before "L2R10", "Round 2" before "Round 10".

use crate::error::{Result, TcoError};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One run of a round label: either all digits or no digits.
#[derive(Debug, Clone, PartialEq, Eq)]
enum KeyPart {
    /// Digits with leading zeros removed ("007" -> "7", "0" -> "0").
    Number(String),
    /// Text run, compared as written.
    Text(String),
}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            // Shorter digit strings are smaller numbers once zeros are stripped.
            (KeyPart::Number(a), KeyPart::Number(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (KeyPart::Text(a), KeyPart::Text(b)) => a.cmp(b),
            (KeyPart::Number(_), KeyPart::Text(_)) => Ordering::Less,
            (KeyPart::Text(_), KeyPart::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Natural ordering key for a round label.
///
/// Compares element-wise; a key that is a prefix of another sorts first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RoundKey(Vec<KeyPart>);

impl RoundKey {
    pub fn from_label(label: &str) -> Self {
        lazy_static::lazy_static! {
            static ref RUN_PATTERN: Regex = Regex::new(r"[0-9]+|[^0-9]+").unwrap();
        }

        let parts = RUN_PATTERN
            .find_iter(label)
            .map(|m| {
                let run = m.as_str();
                if run.as_bytes()[0].is_ascii_digit() {
                    let trimmed = run.trim_start_matches('0');
                    KeyPart::Number(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
                } else {
                    KeyPart::Text(run.to_string())
                }
            })
            .collect();
        RoundKey(parts)
    }
}

/// A round label with its ordering key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundId {
    pub label: String,
    pub key: RoundKey,
}

impl RoundId {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        let key = RoundKey::from_label(&label);
        Self { label, key }
    }
}

impl Ord for RoundId {
    /// Orders by natural key, falling back to the raw label so "R1" and
    /// "R01" still have a fixed order.
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| self.label.cmp(&other.label))
    }
}

impl PartialOrd for RoundId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Round label for a file: its name without the extension.
pub fn round_label(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_string()
}

/// Identify the round a file belongs to.
pub fn identify(path: &Path) -> RoundId {
    RoundId::new(round_label(path))
}

/// Identify every input file, failing if two files share a round label.
///
/// The returned ids are in input order.
pub fn identify_all(paths: &[PathBuf]) -> Result<Vec<RoundId>> {
    let mut seen: HashMap<String, &PathBuf> = HashMap::new();
    let mut ids = Vec::with_capacity(paths.len());

    for path in paths {
        let id = identify(path);
        if let Some(first) = seen.get(&id.label) {
            return Err(TcoError::AmbiguousRoundName {
                label: id.label,
                first: (*first).clone(),
                second: path.clone(),
            });
        }
        seen.insert(id.label.clone(), path);
        ids.push(id);
    }

    Ok(ids)
}

/// Sort round labels into their natural order.
pub fn sort_labels<S: AsRef<str>>(labels: &[S]) -> Vec<String> {
    let mut ids: Vec<RoundId> = labels.iter().map(|l| RoundId::new(l.as_ref())).collect();
    ids.sort();
    ids.into_iter().map(|id| id.label).collect()
}
