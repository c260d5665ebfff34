//! Known-bad version list ingestion.
//!
//! The list is delimited text with one row per package. A row's version
//! field may hold several exact versions joined by `||`, each optionally
//! written with a leading `=`:
//!
//! ```text
//! Package,Version
//! posthog-node,= 5.11.3 || = 5.13.3
//! "@scope/pkg","1.0.1"
//! ```
//!
//! Every alternative becomes its own [`BadVersionEntry`].

use crate::error::{Error, Result};
use crate::model::BadVersionEntry;
use csv::ReaderBuilder;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Parses a known-bad list into flat `(package, version)` pairs.
///
/// Blank lines, `#` comments and a `package`/`name` header as the first row
/// are skipped. Repeated pairs are kept once, in first-seen order.
///
/// # Errors
///
/// Returns [`Error::Catalog`] for a row without a version field.
///
/// # Example
///
/// ```
/// use depsentry::catalog::parse_known_bad;
///
/// let entries = parse_known_bad("posthog-node,= 5.11.3 || = 5.13.3\n")?;
/// assert_eq!(entries.len(), 2);
/// assert_eq!(entries[1].version, "5.13.3");
/// # Ok::<(), depsentry::Error>(())
/// ```
pub fn parse_known_bad(text: &str) -> Result<Vec<BadVersionEntry>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(text.as_bytes());

    let mut entries: Vec<BadVersionEntry> = Vec::new();
    let mut seen = HashSet::new();
    let mut first_row = true;

    for result in reader.records() {
        let record = result.map_err(|e| Error::Catalog {
            line: e.position().map(|p| p.line() as usize).unwrap_or_default(),
            details: e.to_string(),
        })?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or_default();

        let package = record.get(0).unwrap_or_default();
        if record.iter().all(str::is_empty) || package.starts_with('#') {
            continue;
        }
        if std::mem::take(&mut first_row) && is_header(package) {
            continue;
        }
        if package.is_empty() {
            return Err(Error::Catalog {
                line,
                details: "missing package name".to_string(),
            });
        }

        let Some(versions) = record.get(1) else {
            return Err(Error::Catalog {
                line,
                details: format!("no version field for '{}'", package),
            });
        };

        for version in expand_versions(versions) {
            let entry = BadVersionEntry::new(package, version);
            if seen.insert(entry.clone()) {
                entries.push(entry);
            }
        }
    }

    Ok(entries)
}

/// Reads and parses a known-bad list from disk.
pub fn load_known_bad(path: &Path) -> Result<Vec<BadVersionEntry>> {
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let entries = parse_known_bad(&text)?;
    tracing::info!(path = %path.display(), entries = entries.len(), "loaded known-bad list");
    Ok(entries)
}

/// Splits a `||` alternation into bare versions.
pub fn expand_versions(field: &str) -> Vec<String> {
    field
        .split("||")
        .map(|alt| alt.trim())
        .map(|alt| alt.strip_prefix('=').unwrap_or(alt).trim())
        .filter(|alt| !alt.is_empty())
        .map(|alt| alt.to_string())
        .collect()
}

fn is_header(first_field: &str) -> bool {
    first_field.eq_ignore_ascii_case("package") || first_field.eq_ignore_ascii_case("name")
}

/// Package name → known-bad versions, in list order.
#[derive(Debug, Clone, Default)]
pub struct KnownBad {
    versions: HashMap<String, Vec<String>>,
}

impl KnownBad {
    pub fn from_entries(entries: &[BadVersionEntry]) -> Self {
        let mut versions: HashMap<String, Vec<String>> = HashMap::new();
        for entry in entries {
            let list = versions.entry(entry.package.clone()).or_default();
            if !list.contains(&entry.version) {
                list.push(entry.version.clone());
            }
        }
        Self { versions }
    }

    pub fn versions_of(&self, package: &str) -> Option<&[String]> {
        self.versions.get(package).map(|v| v.as_slice())
    }

    pub fn contains(&self, package: &str) -> bool {
        self.versions.contains_key(package)
    }

    pub fn package_count(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

impl From<&[BadVersionEntry]> for KnownBad {
    fn from(entries: &[BadVersionEntry]) -> Self {
        Self::from_entries(entries)
    }
}
