//! Local project discovery and loading.
//!
//! A project is a directory holding a `package.json`. Lock files next to it
//! are picked up in a fixed order, which is also the order in which their
//! versions are merged (later files win):
//!
//! 1. `package-lock.json`
//! 2. `npm-shrinkwrap.json`
//! 3. `yarn.lock`
//! 4. `pnpm-lock.yaml`
//!
//! # Example
//!
//! ```no_run
//! use depsentry::scanner::{discover, load_project};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     for manifest in discover(".".as_ref(), &["node_modules".to_string()]) {
//!         let project = load_project(&manifest).await?;
//!         println!("{}: {} lock files", manifest.display(), project.locks.len());
//!     }
//!     Ok(())
//! }
//! ```

use crate::classifier::Classifier;
use crate::error::{Error, Result};
use crate::lockfile::{LockFormat, LockInput};
use crate::model::ProjectReport;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const MANIFEST_FILE: &str = "package.json";

/// Lock file names in merge order.
pub const LOCK_FILES: [&str; 4] = [
    "package-lock.json",
    "npm-shrinkwrap.json",
    "yarn.lock",
    "pnpm-lock.yaml",
];

/// A manifest and its lock files, read into memory.
#[derive(Debug, Clone)]
pub struct Project {
    pub manifest_path: PathBuf,
    pub manifest_text: String,
    pub lock_paths: Vec<PathBuf>,
    pub locks: Vec<LockInput>,
}

impl Project {
    pub fn classify(&self, classifier: &Classifier) -> ProjectReport {
        let report = match classifier.classify(&self.manifest_text, &self.locks) {
            Ok(classification) => ProjectReport::new(self.manifest_path.clone(), classification),
            Err(e) => {
                tracing::warn!(manifest = %self.manifest_path.display(), error = %e, "skipping project");
                ProjectReport::failed(self.manifest_path.clone(), e)
            }
        };
        report.with_lock_files(self.lock_paths.clone())
    }
}

/// Finds every `package.json` under `root`, sorted by path.
///
/// Directories whose name is in `skip_dirs` are not entered. A `root` that is
/// itself a manifest file is returned as-is.
pub fn discover(root: &Path, skip_dirs: &[String]) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }

    let mut manifests: Vec<PathBuf> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !skip_dirs
                    .iter()
                    .any(|skip| entry.file_name().to_str() == Some(skip.as_str()))
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable path");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == MANIFEST_FILE)
        .map(|entry| entry.into_path())
        .collect();

    manifests.sort();
    tracing::info!(root = %root.display(), projects = manifests.len(), "discovered projects");
    manifests
}

/// Reads a manifest and whichever sibling lock files exist.
///
/// # Errors
///
/// Returns [`Error::Io`] if the manifest or an existing lock file cannot be
/// read.
pub async fn load_project(manifest_path: &Path) -> Result<Project> {
    let manifest_text = read(manifest_path).await?;
    let dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));

    let mut lock_paths = Vec::new();
    let mut locks = Vec::new();
    for name in LOCK_FILES {
        let path = dir.join(name);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            continue;
        }
        let Some(format) = LockFormat::from_file_name(name) else {
            continue;
        };
        let text = read(&path).await?;
        locks.push(LockInput::new(format, text));
        lock_paths.push(path);
    }

    Ok(Project {
        manifest_path: manifest_path.to_path_buf(),
        manifest_text,
        lock_paths,
        locks,
    })
}

/// Loads an explicit manifest and lock file set.
///
/// Lock formats are inferred from file names; unknown names are rejected.
pub async fn load_files(manifest_path: &Path, lock_paths: &[PathBuf]) -> Result<Project> {
    let manifest_text = read(manifest_path).await?;

    let mut locks = Vec::new();
    for path in lock_paths {
        let format = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(LockFormat::from_file_name)
            .ok_or_else(|| Error::Io {
                path: path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "unrecognised lock file name",
                ),
            })?;
        locks.push(LockInput::new(format, read(path).await?));
    }

    Ok(Project {
        manifest_path: manifest_path.to_path_buf(),
        manifest_text,
        lock_paths: lock_paths.to_vec(),
        locks,
    })
}

/// Loads and classifies every manifest, concurrently when `parallel` is set.
///
/// A project that cannot be read or evaluated is reported with an error and
/// does not stop the scan.
pub async fn scan_projects(
    manifests: &[PathBuf],
    classifier: &Classifier,
    parallel: bool,
) -> Vec<ProjectReport> {
    let classify_one = |manifest: &PathBuf| {
        let manifest = manifest.clone();
        async move {
            match load_project(&manifest).await {
                Ok(project) => project.classify(classifier),
                Err(e) => {
                    tracing::warn!(manifest = %manifest.display(), error = %e, "failed to load project");
                    ProjectReport::failed(manifest, e)
                }
            }
        }
    };

    if parallel {
        join_all(manifests.iter().map(classify_one)).await
    } else {
        let mut reports = Vec::with_capacity(manifests.len());
        for manifest in manifests {
            reports.push(classify_one(manifest).await);
        }
        reports
    }
}

async fn read(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
}
