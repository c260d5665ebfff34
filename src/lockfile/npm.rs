use super::{LockFormat, LockParser, LockedVersions};
use serde_json::Value;

const NODE_MODULES: &str = "node_modules/";

/// Parser for `package-lock.json` and `npm-shrinkwrap.json`.
///
/// Reads both schema variants that may coexist in one document:
/// - `packages` (lockfileVersion 2/3): keys are install paths such as
///   `node_modules/a/node_modules/@scope/b`
/// - `dependencies` (lockfileVersion 1/2): keys are package names, with
///   nested `dependencies` objects for non-hoisted copies
pub struct PackageLockParser;

impl LockParser for PackageLockParser {
    fn format(&self) -> LockFormat {
        LockFormat::PackageLock
    }

    fn extract(&self, content: &str) -> LockedVersions {
        match serde_json::from_str::<Value>(content) {
            Ok(doc) => extract_document(&doc),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring unreadable package-lock");
                LockedVersions::default()
            }
        }
    }
}

fn extract_document(doc: &Value) -> LockedVersions {
    let mut locked = LockedVersions::default();

    if let Some(packages) = doc.get("packages").and_then(Value::as_object) {
        for (path, entry) in packages {
            // "" is the project itself
            if path.is_empty() {
                continue;
            }
            let Some(version) = entry.get("version").and_then(Value::as_str) else {
                continue;
            };
            if let Some(name) = name_from_install_path(path, entry) {
                locked.insert(name, version);
            }
        }
    }

    if let Some(dependencies) = doc.get("dependencies") {
        collect_dependency_tree(dependencies, &mut locked);
    }

    locked
}

/// Recovers the package name from a `packages` key.
///
/// Everything up to and including the last `node_modules/` is dropped.
/// Workspace members (`packages/foo`) carry their name in the entry itself.
fn name_from_install_path(path: &str, entry: &Value) -> Option<String> {
    match path.rfind(NODE_MODULES) {
        Some(pos) => {
            let name = &path[pos + NODE_MODULES.len()..];
            (!name.is_empty()).then(|| name.to_string())
        }
        None => entry
            .get("name")
            .and_then(Value::as_str)
            .map(|name| name.to_string()),
    }
}

fn collect_dependency_tree(dependencies: &Value, locked: &mut LockedVersions) {
    let Some(deps) = dependencies.as_object() else {
        return;
    };

    for (name, entry) in deps {
        // Only objects describe installed copies.
        if !entry.is_object() {
            continue;
        }
        if let Some(version) = entry.get("version").and_then(Value::as_str) {
            locked.insert(name.clone(), version);
        }
        if let Some(nested) = entry.get("dependencies") {
            collect_dependency_tree(nested, locked);
        }
    }
}
