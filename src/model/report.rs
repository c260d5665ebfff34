use super::{Classification, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Classification of a single project directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectReport {
    pub manifest_path: PathBuf,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lock_files: Vec<PathBuf>,
    #[serde(flatten)]
    pub classification: Classification,
    /// Set when the manifest could not be evaluated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProjectReport {
    pub fn new(manifest_path: PathBuf, classification: Classification) -> Self {
        Self {
            manifest_path,
            lock_files: Vec::new(),
            classification,
            error: None,
        }
    }

    pub fn failed(manifest_path: PathBuf, error: impl std::fmt::Display) -> Self {
        Self {
            manifest_path,
            lock_files: Vec::new(),
            classification: Classification::default(),
            error: Some(error.to_string()),
        }
    }

    pub fn with_lock_files(mut self, lock_files: Vec<PathBuf>) -> Self {
        self.lock_files = lock_files;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub scan_time: DateTime<Utc>,
    pub projects: Vec<ProjectReport>,
}

impl ScanReport {
    pub fn new(projects: Vec<ProjectReport>) -> Self {
        Self {
            scan_time: Utc::now(),
            projects,
        }
    }

    pub fn total_vulnerabilities(&self) -> usize {
        self.projects
            .iter()
            .map(|p| p.classification.vulnerabilities.len())
            .sum()
    }

    pub fn total_affected(&self) -> usize {
        self.projects
            .iter()
            .map(|p| p.classification.affected_packages.len())
            .sum()
    }

    pub fn failed_projects(&self) -> usize {
        self.projects.iter().filter(|p| p.error.is_some()).count()
    }

    pub fn highest_severity(&self) -> Option<Severity> {
        self.projects
            .iter()
            .filter_map(|p| p.classification.highest_severity())
            .max()
    }
}
