//! Core data types for findings and scan reports.
//!
//! - [`BadVersionEntry`] - one known-bad `(package, version)` pair
//! - [`Finding`] - a dependency that resolves to a known-bad version
//! - [`AffectedEntry`] - a dependency on a package with known-bad versions,
//!   none of which is currently selected
//! - [`Classification`] - both result lists for one project
//! - [`ScanReport`] - classifications for every scanned project
//!
//! # Example
//!
//! ```
//! use depsentry::{Finding, MatchType, Severity};
//!
//! let finding = Finding::new("posthog-node", "^5.0.0", "5.11.3", MatchType::Direct);
//! assert_eq!(finding.severity, Severity::High);
//! ```

mod finding;
mod report;

pub use finding::*;
pub use report::*;
