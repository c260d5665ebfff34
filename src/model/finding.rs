use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One exact vulnerable version of a package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BadVersionEntry {
    pub package: String,
    pub version: String,
}

impl BadVersionEntry {
    pub fn new(package: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            version: version.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a package reached the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Declared in the project's own manifest
    Direct,
    /// Only visible through a lock file
    Transitive,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Direct => "direct",
            MatchType::Transitive => "transitive",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            MatchType::Direct => Severity::High,
            MatchType::Transitive => Severity::Medium,
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A dependency whose declared range or locked version selects a known-bad
/// version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub package: String,
    pub declared_version: String,
    pub malicious_version: String,
    pub match_type: MatchType,
    pub severity: Severity,
}

impl Finding {
    /// Creates a finding; severity follows from the match type.
    pub fn new(
        package: impl Into<String>,
        declared_version: impl Into<String>,
        malicious_version: impl Into<String>,
        match_type: MatchType,
    ) -> Self {
        Self {
            package: package.into(),
            declared_version: declared_version.into(),
            malicious_version: malicious_version.into(),
            match_type,
            severity: match_type.severity(),
        }
    }
}

/// A dependency on a package that has known-bad versions, none of which
/// the project currently selects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedEntry {
    pub package: String,
    pub declared_version: String,
    pub malicious_versions: Vec<String>,
    /// Only set when a lock file resolved the package.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_type: Option<MatchType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_version: Option<String>,
}

impl AffectedEntry {
    pub fn new(
        package: impl Into<String>,
        declared_version: impl Into<String>,
        malicious_versions: Vec<String>,
    ) -> Self {
        Self {
            package: package.into(),
            declared_version: declared_version.into(),
            malicious_versions,
            match_type: None,
            locked_version: None,
        }
    }

    pub fn with_lock(mut self, locked_version: impl Into<String>, match_type: MatchType) -> Self {
        self.locked_version = Some(locked_version.into());
        self.match_type = Some(match_type);
        self
    }
}

/// Results for one project. A package never appears in both lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub vulnerabilities: Vec<Finding>,
    pub affected_packages: Vec<AffectedEntry>,
}

impl Classification {
    pub fn is_clean(&self) -> bool {
        self.vulnerabilities.is_empty() && self.affected_packages.is_empty()
    }

    pub fn highest_severity(&self) -> Option<Severity> {
        self.vulnerabilities.iter().map(|f| f.severity).max()
    }

    pub fn vulnerable_packages(&self) -> HashSet<&str> {
        self.vulnerabilities
            .iter()
            .map(|f| f.package.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_follows_match_type() {
        assert_eq!(
            Finding::new("a", "^1.0.0", "1.0.1", MatchType::Direct).severity,
            Severity::High
        );
        assert_eq!(
            Finding::new("a", "1.0.1", "1.0.1", MatchType::Transitive).severity,
            Severity::Medium
        );
        assert!(Severity::High > Severity::Medium);
    }

    #[test]
    fn test_finding_serialization() {
        let finding = Finding::new("posthog-node", "^5.0.0", "5.11.3", MatchType::Direct);
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "package": "posthog-node",
                "declared_version": "^5.0.0",
                "malicious_version": "5.11.3",
                "match_type": "direct",
                "severity": "high"
            })
        );
    }

    #[test]
    fn test_affected_entry_omits_lock_fields_when_unset() {
        let entry = AffectedEntry::new("posthog-node", "^6.0.0", vec!["5.11.3".into()]);
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("match_type").is_none());
        assert!(json.get("locked_version").is_none());

        let locked = entry.with_lock("6.0.1", MatchType::Transitive);
        let json = serde_json::to_value(&locked).unwrap();
        assert_eq!(json["match_type"], "transitive");
        assert_eq!(json["locked_version"], "6.0.1");
    }

    #[test]
    fn test_classification_summary() {
        let classification = Classification {
            vulnerabilities: vec![
                Finding::new("a", "1.0.0", "1.0.0", MatchType::Transitive),
                Finding::new("b", "^1.0.0", "1.0.2", MatchType::Direct),
            ],
            affected_packages: vec![AffectedEntry::new("c", "^2.0.0", vec!["1.0.0".into()])],
        };
        assert_eq!(classification.highest_severity(), Some(Severity::High));
        assert!(!classification.is_clean());
        assert!(Classification::default().is_clean());
        assert_eq!(Classification::default().highest_severity(), None);
    }
}
