use super::{LockFormat, LockParser, LockedVersions};

/// Parser for `yarn.lock`, classic and berry.
///
/// An unindented declaration line opens a package context and the next
/// `version` line at the entry's own field indentation closes it. Deeper
/// lines belong to nested maps such as `dependencies`:
///
/// ```text
/// "@babel/core@^7.0.0", "@babel/core@^7.1.0":
///   version "7.22.5"
/// ```
pub struct YarnLockParser;

impl LockParser for YarnLockParser {
    fn format(&self) -> LockFormat {
        LockFormat::YarnLock
    }

    fn extract(&self, content: &str) -> LockedVersions {
        let mut locked = LockedVersions::default();
        let mut current: Option<&str> = None;
        let mut field_indent: Option<usize> = None;

        for line in content.lines() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            if !line.starts_with(char::is_whitespace) {
                current = declared_name(line);
                field_indent = None;
                continue;
            }

            // The first indented line of an entry fixes its field level.
            let indent = line.len() - line.trim_start().len();
            if *field_indent.get_or_insert(indent) != indent {
                continue;
            }

            if let Some(version) = version_value(line) {
                // Clear the context so a stray second version line is not
                // attributed to the same package.
                if let Some(name) = current.take() {
                    locked.insert(name, version);
                }
            }
        }

        locked
    }
}

/// Package name from a declaration line: the text before the first `@`
/// (ignoring a scope's leading `@`), `,`, quote or colon.
fn declared_name(line: &str) -> Option<&str> {
    let first = line.chars().next()?;
    if !(first == '"' || first == '@' || first.is_ascii_alphanumeric() || first == '_') {
        return None;
    }

    let spec = line.strip_prefix('"').unwrap_or(line);
    let skip = usize::from(spec.starts_with('@'));
    let end = spec[skip..]
        .find(['@', ',', '"', ':'])
        .map(|pos| pos + skip)
        .unwrap_or(spec.len());

    let name = spec[..end].trim();
    // berry's `__metadata` block is not a package
    if name.is_empty() || name == "@" || name.starts_with("__") {
        return None;
    }
    Some(name)
}

/// Value of an indented `version "x"` (classic) or `version: x` (berry) line.
fn version_value(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix("version")?;
    if !rest.starts_with([' ', ':']) {
        return None;
    }
    let value = rest.trim_start_matches(':').trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_lockfile() {
        let content = r#"# THIS IS AN AUTOGENERATED FILE. DO NOT EDIT THIS FILE DIRECTLY.
# yarn lockfile v1


"@babel/core@^7.0.0", "@babel/core@^7.1.0":
  version "7.22.5"
  resolved "https://registry.yarnpkg.com/@babel/core/-/core-7.22.5.tgz"
  dependencies:
    debug "^4.1.0"

posthog-node@^5.0.0:
  version "5.11.3"
  resolved "https://registry.yarnpkg.com/posthog-node/-/posthog-node-5.11.3.tgz"
"#;

        let locked = YarnLockParser.extract(content);
        assert_eq!(locked.get("@babel/core"), Some("7.22.5"));
        assert_eq!(locked.get("posthog-node"), Some("5.11.3"));
        assert!(!locked.contains("debug"));
        assert_eq!(locked.len(), 2);
    }

    #[test]
    fn test_berry_lockfile() {
        let content = r#"__metadata:
  version: 6
  cacheKey: 8

"posthog-node@npm:^5.0.0":
  version: 5.13.3
  resolution: "posthog-node@npm:5.13.3"
"#;

        let locked = YarnLockParser.extract(content);
        assert_eq!(locked.get("posthog-node"), Some("5.13.3"));
        assert_eq!(locked.len(), 1);
    }

    #[test]
    fn test_second_version_line_is_not_misattributed() {
        let content = "left-pad@^1.0.0:\n  version \"1.3.0\"\n  version \"9.9.9\"\n";
        let locked = YarnLockParser.extract(content);
        assert_eq!(locked.get("left-pad"), Some("1.3.0"));
        assert_eq!(locked.len(), 1);
    }

    #[test]
    fn test_nested_version_key_is_not_the_entry_version() {
        let content = "\"b@^2\":\n  dependencies:\n    version \"^9.9.9\"\n  version \"2.0.0\"\n";
        let locked = YarnLockParser.extract(content);
        assert_eq!(locked.get("b"), Some("2.0.0"));

        let berry = "\"b@npm:^2\":\n  dependencies:\n    version: ^9.9.9\n  version: 2.0.0\n";
        assert_eq!(YarnLockParser.extract(berry).get("b"), Some("2.0.0"));
    }

    #[test]
    fn test_declared_name() {
        assert_eq!(declared_name("lodash@^4.17.0:"), Some("lodash"));
        assert_eq!(declared_name("\"@scope/pkg@^1.0.0\", \"@scope/pkg@^1.1.0\":"), Some("@scope/pkg"));
        assert_eq!(declared_name("\"posthog-node@npm:^5.0.0\":"), Some("posthog-node"));
        assert_eq!(declared_name("a, b:"), Some("a"));
        assert_eq!(declared_name("__metadata:"), None);
        assert_eq!(declared_name("-weird"), None);
    }

    #[test]
    fn test_version_value() {
        assert_eq!(version_value("  version \"1.2.3\""), Some("1.2.3"));
        assert_eq!(version_value("  version: 1.2.3"), Some("1.2.3"));
        assert_eq!(version_value("  versions \"1.2.3\""), None);
        assert_eq!(version_value("  resolved \"x\""), None);
    }
}
