//! Read-only view of a `package.json`.
//!
//! Only the dependency groups are exposed. Everything else in the document
//! is ignored.

use crate::error::Result;
use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which manifest group a declaration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyGroup {
    Production,
    Development,
    Optional,
}

impl DependencyGroup {
    fn key(&self) -> &'static str {
        match self {
            DependencyGroup::Production => "dependencies",
            DependencyGroup::Development => "devDependencies",
            DependencyGroup::Optional => "optionalDependencies",
        }
    }
}

/// Every group, in declaration precedence order.
pub const ALL_GROUPS: [DependencyGroup; 3] = [
    DependencyGroup::Production,
    DependencyGroup::Development,
    DependencyGroup::Optional,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredDependency {
    pub name: String,
    pub range: String,
    pub group: DependencyGroup,
}

/// Declared dependencies in document order: production first, then
/// development, then optional.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    declared: Vec<DeclaredDependency>,
}

impl Manifest {
    /// Parses manifest text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Manifest`](crate::Error::Manifest) if the text is not
    /// a JSON object. Dependency groups that are not objects, and
    /// declarations whose value is not a string, are skipped.
    ///
    /// # Example
    ///
    /// ```
    /// use depsentry::Manifest;
    ///
    /// let manifest = Manifest::parse(r#"{"dependencies": {"posthog-node": "^5.0.0"}}"#)?;
    /// assert_eq!(manifest.range_of("posthog-node"), Some("^5.0.0"));
    /// # Ok::<(), depsentry::Error>(())
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let Value::Object(mut document) = serde_json::from_str::<Value>(text)? else {
            return Err(serde_json::Error::custom("manifest must be a JSON object").into());
        };
        let mut manifest = Manifest::default();

        for group in ALL_GROUPS {
            if let Some(Value::Object(entries)) = document.remove(group.key()) {
                manifest.add_group(group, entries);
            }
        }

        Ok(manifest)
    }

    fn add_group(&mut self, group: DependencyGroup, entries: Map<String, Value>) {
        for (name, value) in entries {
            let Value::String(range) = value else {
                tracing::debug!(package = %name, group = group.key(), "skipping non-string declaration");
                continue;
            };
            // A name declared in two groups keeps its first declaration.
            if self.contains(&name) {
                continue;
            }
            self.declared.push(DeclaredDependency { name, range, group });
        }
    }

    pub fn dependencies(&self) -> &[DeclaredDependency] {
        &self.declared
    }

    /// Declarations restricted to the given groups.
    pub fn in_groups<'a>(
        &'a self,
        groups: &'a [DependencyGroup],
    ) -> impl Iterator<Item = &'a DeclaredDependency> {
        self.declared.iter().filter(move |d| groups.contains(&d.group))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.declared.iter().any(|d| d.name == name)
    }

    pub fn range_of(&self, name: &str) -> Option<&str> {
        self.declared
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.range.as_str())
    }

    pub fn len(&self) -> usize {
        self.declared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }
}
