use super::{LockFormat, LockParser, LockedVersions};
use regex::Regex;
use std::sync::LazyLock;

/// Indented package key: optional quote, optional `/`, name (scoped or
/// bare), `@`, a version starting with an ASCII digit, an optional peer suffix in
/// parentheses or after `_`, then the closing colon.
static RE_PACKAGE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^\s+['"]?/?((?:@[^@\s/'"]+/)?[^@\s/'"]+)@([0-9][^\s:'"()_@]*)(?:\(.*\)|_[^\s:'"]*)?['"]?:\s*$"#,
    )
    .unwrap()
});

/// Parser for `pnpm-lock.yaml`.
///
/// Only the package keys are read; the surrounding YAML structure is never
/// parsed, so a damaged document still yields whatever keys are intact.
///
/// ```text
/// packages:
///   /posthog-node@5.11.3:          # lockfileVersion 6
///   '@babel/core@7.22.5':          # lockfileVersion 9
/// ```
pub struct PnpmLockParser;

impl LockParser for PnpmLockParser {
    fn format(&self) -> LockFormat {
        LockFormat::PnpmLock
    }

    fn extract(&self, content: &str) -> LockedVersions {
        content
            .lines()
            .filter_map(|line| {
                let caps = RE_PACKAGE_KEY.captures(line)?;
                Some((caps[1].to_string(), caps[2].to_string()))
            })
            .collect()
    }
}
