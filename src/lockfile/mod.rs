//! Resolved-version extraction from lock files.
//!
//! Each supported format reduces lock file text to a flat
//! [`LockedVersions`] map of package name to exact version. The parsers are
//! tolerant: malformed input produces an empty map, never an error, because
//! lock files only corroborate what the manifest declares.
//!
//! | Format | Files | Parser |
//! |--------|-------|--------|
//! | [`LockFormat::PackageLock`] | `package-lock.json`, `npm-shrinkwrap.json` | [`PackageLockParser`] |
//! | [`LockFormat::YarnLock`] | `yarn.lock` | [`YarnLockParser`] |
//! | [`LockFormat::PnpmLock`] | `pnpm-lock.yaml` | [`PnpmLockParser`] |
//!
//! # Example
//!
//! ```
//! use depsentry::lockfile::{merge_locks, LockFormat, LockInput};
//!
//! let yarn = "posthog-node@^5.0.0:\n  version \"5.11.3\"\n";
//! let pnpm = "packages:\n  /posthog-node@5.13.3:\n    resolution: {}\n";
//!
//! let locked = merge_locks(&[
//!     LockInput::new(LockFormat::YarnLock, yarn),
//!     LockInput::new(LockFormat::PnpmLock, pnpm),
//! ]);
//!
//! // The later lock file wins.
//! assert_eq!(locked.get("posthog-node"), Some("5.13.3"));
//! ```

mod npm;
mod pnpm;
mod yarn;

pub use npm::PackageLockParser;
pub use pnpm::PnpmLockParser;
pub use yarn::YarnLockParser;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lock file formats understood by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LockFormat {
    /// npm's nested-object JSON lock (`packages` and `dependencies` sections)
    PackageLock,
    /// yarn's declaration line plus indented `version` line format
    YarnLock,
    /// pnpm's `/name@version:` keyed YAML
    PnpmLock,
}

impl LockFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockFormat::PackageLock => "package-lock",
            LockFormat::YarnLock => "yarn-lock",
            LockFormat::PnpmLock => "pnpm-lock",
        }
    }

    /// Maps a lock file name to its format.
    pub fn from_file_name(name: &str) -> Option<Self> {
        match name {
            "package-lock.json" | "npm-shrinkwrap.json" => Some(LockFormat::PackageLock),
            "yarn.lock" => Some(LockFormat::YarnLock),
            "pnpm-lock.yaml" => Some(LockFormat::PnpmLock),
            _ => None,
        }
    }
}

impl std::fmt::Display for LockFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lock file text tagged with its format.
#[derive(Debug, Clone)]
pub struct LockInput {
    pub format: LockFormat,
    pub text: String,
}

impl LockInput {
    pub fn new(format: LockFormat, text: impl Into<String>) -> Self {
        Self {
            format,
            text: text.into(),
        }
    }
}

/// Reduces one lock format to a name → version map.
pub trait LockParser: Send + Sync {
    fn format(&self) -> LockFormat;

    /// Extracts resolved versions. Must not fail: unreadable input yields an
    /// empty map.
    fn extract(&self, content: &str) -> LockedVersions;
}

/// Returns the parser for a format.
pub fn parser_for(format: LockFormat) -> &'static dyn LockParser {
    match format {
        LockFormat::PackageLock => &PackageLockParser,
        LockFormat::YarnLock => &YarnLockParser,
        LockFormat::PnpmLock => &PnpmLockParser,
    }
}

/// Extracts and merges several lock files.
///
/// Inputs are applied in order, so a later lock file overwrites an earlier
/// one's version for the same package. Blank texts are skipped.
pub fn merge_locks(inputs: &[LockInput]) -> LockedVersions {
    let mut merged = LockedVersions::default();
    for input in inputs {
        if input.text.trim().is_empty() {
            continue;
        }
        let locked = parser_for(input.format).extract(&input.text);
        tracing::debug!(
            format = %input.format,
            packages = locked.len(),
            "extracted locked versions"
        );
        merged.extend(locked);
    }
    merged
}

/// Package name → exact resolved version, iterated in first-insertion order.
///
/// Re-inserting a name replaces its version but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockedVersions {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl LockedVersions {
    pub fn insert(&mut self, name: impl Into<String>, version: impl Into<String>) {
        let name = name.into();
        let version = version.into();
        match self.index.get(&name) {
            Some(&pos) => self.entries[pos].1 = version,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, version));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.index
            .get(name)
            .map(|&pos| self.entries[pos].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, version)| (name.as_str(), version.as_str()))
    }
}

impl Extend<(String, String)> for LockedVersions {
    fn extend<I: IntoIterator<Item = (String, String)>>(&mut self, iter: I) {
        for (name, version) in iter {
            self.insert(name, version);
        }
    }
}

impl IntoIterator for LockedVersions {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for LockedVersions {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut locked = LockedVersions::default();
        for (name, version) in iter {
            locked.insert(name, version);
        }
        locked
    }
}
