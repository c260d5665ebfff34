//! Dependency classification against a known-bad list.
//!
//! A project is classified in two passes:
//!
//! 1. Every declared range in the manifest is evaluated against each
//!    known-bad version of the same package. A match is a direct, high
//!    severity finding.
//! 2. Every exact version in the merged lock files is compared verbatim with
//!    the known-bad versions. A match is direct if the manifest declares the
//!    package and transitive (medium severity) otherwise.
//!
//! Packages with known-bad versions that neither pass selects are reported
//! as affected. A package is never both vulnerable and affected.
//!
//! # Example
//!
//! ```
//! use depsentry::{classify, BadVersionEntry, MatchType};
//!
//! let manifest = r#"{"dependencies": {"posthog-node": "^5.0.0"}}"#;
//! let known_bad = [BadVersionEntry::new("posthog-node", "5.11.3")];
//!
//! let result = classify(manifest, &[], &known_bad)?;
//! assert_eq!(result.vulnerabilities.len(), 1);
//! assert_eq!(result.vulnerabilities[0].match_type, MatchType::Direct);
//! assert!(result.affected_packages.is_empty());
//! # Ok::<(), depsentry::Error>(())
//! ```

use crate::catalog::KnownBad;
use crate::error::Result;
use crate::lockfile::{merge_locks, LockInput};
use crate::manifest::{DependencyGroup, Manifest, ALL_GROUPS};
use crate::model::{AffectedEntry, BadVersionEntry, Classification, Finding, MatchType};
use crate::version::satisfies;
use std::collections::{HashMap, HashSet};

/// Classifies one manifest (plus optional lock files) against a known-bad
/// list.
///
/// # Errors
///
/// Fails only when the manifest is not a JSON object. Unreadable lock files
/// and unreadable ranges are treated as carrying no match.
pub fn classify(
    manifest_text: &str,
    locks: &[LockInput],
    known_bad: &[BadVersionEntry],
) -> Result<Classification> {
    Classifier::new(KnownBad::from_entries(known_bad)).classify(manifest_text, locks)
}

/// True if a declared range selects `bad_version`.
///
/// Anything the range grammar rejects falls back to verbatim comparison, so
/// a declaration like `npm:pkg@1.0.0` only matches an identical known-bad
/// string.
pub fn declared_range_matches(bad_version: &str, declared: &str) -> bool {
    satisfies(bad_version, declared) || bad_version.trim() == declared.trim()
}

/// Reusable classifier holding the known-bad lookup.
pub struct Classifier {
    known_bad: KnownBad,
    groups: Vec<DependencyGroup>,
}

impl Classifier {
    pub fn new(known_bad: KnownBad) -> Self {
        Self {
            known_bad,
            groups: ALL_GROUPS.to_vec(),
        }
    }

    /// Whether `optionalDependencies` count as declared. Defaults to true.
    pub fn with_optional(mut self, include: bool) -> Self {
        self.groups = ALL_GROUPS
            .iter()
            .copied()
            .filter(|g| include || *g != DependencyGroup::Optional)
            .collect();
        self
    }

    pub fn known_bad(&self) -> &KnownBad {
        &self.known_bad
    }

    pub fn classify(&self, manifest_text: &str, locks: &[LockInput]) -> Result<Classification> {
        let manifest = Manifest::parse(manifest_text)?;
        let declared: HashMap<&str, &str> = manifest
            .in_groups(&self.groups)
            .map(|d| (d.name.as_str(), d.range.as_str()))
            .collect();

        let mut results = Accumulator::default();

        for dep in manifest.in_groups(&self.groups) {
            let Some(bad_versions) = self.known_bad.versions_of(&dep.name) else {
                continue;
            };

            let mut matched = false;
            for bad in bad_versions {
                if declared_range_matches(bad, &dep.range) {
                    matched = true;
                    results.vulnerable(Finding::new(&dep.name, &dep.range, bad, MatchType::Direct));
                }
            }

            if !matched {
                results.affected(AffectedEntry::new(
                    &dep.name,
                    &dep.range,
                    bad_versions.to_vec(),
                ));
            }
        }

        if !locks.is_empty() {
            let locked = merge_locks(locks);
            for (name, version) in locked.iter() {
                let Some(bad_versions) = self.known_bad.versions_of(name) else {
                    continue;
                };

                let declared_range = declared.get(name).copied();
                let match_type = match declared_range {
                    Some(_) => MatchType::Direct,
                    None => MatchType::Transitive,
                };

                if bad_versions.iter().any(|bad| bad == version) {
                    let declared_version = declared_range.unwrap_or(version);
                    results.vulnerable(Finding::new(name, declared_version, version, match_type));
                } else {
                    results.locked_affected(name, version, bad_versions, match_type);
                }
            }
        }

        let classification = results.finish();
        tracing::debug!(
            declared = declared.len(),
            vulnerabilities = classification.vulnerabilities.len(),
            affected = classification.affected_packages.len(),
            "classified manifest"
        );
        Ok(classification)
    }
}

/// Collects results in first-encountered order without duplicates.
#[derive(Default)]
struct Accumulator {
    vulnerabilities: Vec<Finding>,
    seen: HashSet<(String, String)>,
    vulnerable_packages: HashSet<String>,
    affected: Vec<AffectedEntry>,
    affected_index: HashMap<String, usize>,
}

impl Accumulator {
    fn vulnerable(&mut self, finding: Finding) {
        let key = (finding.package.clone(), finding.malicious_version.clone());
        if !self.seen.insert(key) {
            return;
        }
        self.vulnerable_packages.insert(finding.package.clone());
        self.vulnerabilities.push(finding);
    }

    fn affected(&mut self, entry: AffectedEntry) {
        if self.vulnerable_packages.contains(&entry.package)
            || self.affected_index.contains_key(&entry.package)
        {
            return;
        }
        self.affected_index
            .insert(entry.package.clone(), self.affected.len());
        self.affected.push(entry);
    }

    /// Records or updates an affected entry from a lock file resolution.
    fn locked_affected(
        &mut self,
        name: &str,
        version: &str,
        bad_versions: &[String],
        match_type: MatchType,
    ) {
        if self.vulnerable_packages.contains(name) {
            return;
        }
        match self.affected_index.get(name) {
            Some(&pos) => {
                let entry = &mut self.affected[pos];
                entry.locked_version = Some(version.to_string());
                entry.match_type = Some(match_type);
            }
            None => self.affected(
                AffectedEntry::new(name, version, bad_versions.to_vec()).with_lock(version, match_type),
            ),
        }
    }

    fn finish(self) -> Classification {
        let vulnerable = self.vulnerable_packages;
        let affected_packages = self
            .affected
            .into_iter()
            .filter(|entry| !vulnerable.contains(&entry.package))
            .collect();

        Classification {
            vulnerabilities: self.vulnerabilities,
            affected_packages,
        }
    }
}
