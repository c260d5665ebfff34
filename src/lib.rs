//! Detects npm dependencies that resolve to known-bad package versions.
//!
//! ```
//! use depsentry::{classify, BadVersionEntry, MatchType};
//!
//! let manifest = r#"{"dependencies": {"posthog-node": "^5.0.0"}}"#;
//! let known_bad = [BadVersionEntry::new("posthog-node", "5.11.3")];
//!
//! let result = classify(manifest, &[], &known_bad)?;
//! assert_eq!(result.vulnerabilities[0].match_type, MatchType::Direct);
//! # Ok::<(), depsentry::Error>(())
//! ```

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod error;
pub mod lockfile;
pub mod manifest;
pub mod model;
pub mod output;
pub mod scanner;
pub mod version;

pub use catalog::KnownBad;
pub use classifier::{classify, Classifier};
pub use config::Config;
pub use error::{Error, Result};
pub use manifest::Manifest;
pub use model::{
    AffectedEntry, BadVersionEntry, Classification, Finding, MatchType, ProjectReport,
    ScanReport, Severity,
};
