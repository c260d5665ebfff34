//! Range expression evaluation.
//!
//! A range is parsed and evaluated in a single pass against one version.
//! Syntax variants are tried in a fixed order and the first rule whose
//! predicate accepts the range decides the result:
//!
//! | Rule | Example | Matches |
//! |------|---------|---------|
//! | any | `*` | every release |
//! | major wildcard | `5.x`, `5.x.x` | releases with major 5 |
//! | minor wildcard | `5.11.x` | releases with major 5, minor 11 |
//! | caret | `^5.1.0`, `^0.2.3` | releases up to the next significant bump |
//! | tilde | `~5.11.0` | patch upgrades of 5.11 |
//! | conjunction | `>=5.0.0 <6.0.0` | every clause holds |
//! | comparator | `>=5.0.0`, `5.11.3` | single comparison |
//!
//! There is no `||` support. Alternatives in the known-bad list are expanded
//! into separate entries before they reach this module.

use super::parsed::ParsedVersion;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

static RE_MAJOR_WILDCARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)\.x(?:\.x)?$").unwrap());

static RE_MINOR_WILDCARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)\.([0-9]+)\.x$").unwrap());

/// One syntax variant of the range grammar.
struct RangeRule {
    name: &'static str,
    applies: fn(&str) -> bool,
    eval: fn(&ParsedVersion, &str) -> bool,
}

/// Evaluation order. The comparator rule accepts anything and must stay last.
static RULES: &[RangeRule] = &[
    RangeRule {
        name: "any",
        applies: is_any,
        eval: eval_any,
    },
    RangeRule {
        name: "major-wildcard",
        applies: is_major_wildcard,
        eval: eval_major_wildcard,
    },
    RangeRule {
        name: "minor-wildcard",
        applies: is_minor_wildcard,
        eval: eval_minor_wildcard,
    },
    RangeRule {
        name: "caret",
        applies: is_caret,
        eval: eval_caret,
    },
    RangeRule {
        name: "tilde",
        applies: is_tilde,
        eval: eval_tilde,
    },
    RangeRule {
        name: "conjunction",
        applies: is_conjunction,
        eval: eval_conjunction,
    },
    RangeRule {
        name: "comparator",
        applies: is_comparator,
        eval: eval_comparator,
    },
];

/// Returns true if `version` falls within `range`.
///
/// A version that is not a strict `major.minor.patch[-pre]` never matches,
/// and neither does a range the grammar cannot read.
///
/// # Example
///
/// ```
/// use depsentry::version::satisfies;
///
/// assert!(satisfies("5.11.3", "^5.0.0"));
/// assert!(satisfies("0.2.5", "^0.2.3"));
/// assert!(!satisfies("0.3.0", "^0.2.3"));
/// assert!(!satisfies("5.11.3", "latest"));
/// ```
pub fn satisfies(version: &str, range: &str) -> bool {
    match ParsedVersion::parse(version.trim()) {
        Ok(parsed) => evaluate(&parsed, range.trim()),
        Err(_) => false,
    }
}

/// Evaluates an already parsed version against a range.
pub fn evaluate(version: &ParsedVersion, range: &str) -> bool {
    let rule = matching_rule(range);
    (rule.eval)(version, range)
}

/// Name of the rule that decides `range`, for diagnostics and tests.
pub fn rule_name(range: &str) -> &'static str {
    matching_rule(range.trim()).name
}

fn matching_rule(range: &str) -> &'static RangeRule {
    RULES
        .iter()
        .find(|rule| (rule.applies)(range))
        .unwrap_or(&RULES[RULES.len() - 1])
}

fn is_any(range: &str) -> bool {
    range == "*"
}

fn eval_any(version: &ParsedVersion, _range: &str) -> bool {
    !version.is_prerelease()
}

fn is_major_wildcard(range: &str) -> bool {
    RE_MAJOR_WILDCARD.is_match(range)
}

fn eval_major_wildcard(version: &ParsedVersion, range: &str) -> bool {
    let Some(caps) = RE_MAJOR_WILDCARD.captures(range) else {
        return false;
    };
    match caps[1].parse::<u64>() {
        Ok(major) => version.major == major && !version.is_prerelease(),
        Err(_) => false,
    }
}

fn is_minor_wildcard(range: &str) -> bool {
    RE_MINOR_WILDCARD.is_match(range)
}

fn eval_minor_wildcard(version: &ParsedVersion, range: &str) -> bool {
    let Some(caps) = RE_MINOR_WILDCARD.captures(range) else {
        return false;
    };
    match (caps[1].parse::<u64>(), caps[2].parse::<u64>()) {
        (Ok(major), Ok(minor)) => {
            version.major == major && version.minor == minor && !version.is_prerelease()
        }
        _ => false,
    }
}

fn is_caret(range: &str) -> bool {
    range.starts_with('^')
}

fn eval_caret(version: &ParsedVersion, range: &str) -> bool {
    let Some(base) = parse_operand(&range[1..]) else {
        return false;
    };
    if version.is_prerelease() {
        return false;
    }

    match (base.major, base.minor) {
        // ^0.0.z pins a single version
        (0, 0) => version.compare(&base) == Ordering::Equal,
        // ^0.y.z stays inside minor y
        (0, minor) => version.major == 0 && version.minor == minor && version.patch >= base.patch,
        (major, _) => version.major == major && version.compare(&base) != Ordering::Less,
    }
}

fn is_tilde(range: &str) -> bool {
    range.starts_with('~')
}

fn eval_tilde(version: &ParsedVersion, range: &str) -> bool {
    let Some(base) = parse_operand(&range[1..]) else {
        return false;
    };
    !version.is_prerelease()
        && version.major == base.major
        && version.minor == base.minor
        && version.patch >= base.patch
}

fn is_conjunction(range: &str) -> bool {
    range.contains(char::is_whitespace)
}

fn eval_conjunction(version: &ParsedVersion, range: &str) -> bool {
    let clauses = split_clauses(range);
    !clauses.is_empty() && clauses.iter().all(|clause| evaluate(version, clause))
}

/// Splits a conjunction on whitespace, re-attaching operators written apart
/// from their operand (`>= 5.0.0` becomes `>=5.0.0`).
fn split_clauses(range: &str) -> Vec<String> {
    let mut clauses: Vec<String> = Vec::new();
    let mut pending_operator: Option<&str> = None;

    for token in range.split_whitespace() {
        if let Some(op) = pending_operator.take() {
            clauses.push(format!("{}{}", op, token));
        } else if matches!(token, ">=" | "<=" | ">" | "<" | "=" | "^" | "~") {
            pending_operator = Some(token);
        } else {
            clauses.push(token.to_string());
        }
    }

    // A dangling operator is its own (unreadable) clause.
    if let Some(op) = pending_operator {
        clauses.push(op.to_string());
    }

    clauses
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparator {
    GreaterOrEqual,
    LessOrEqual,
    Greater,
    Less,
    Equal,
}

impl Comparator {
    fn split(range: &str) -> (Self, &str) {
        if let Some(rest) = range.strip_prefix(">=") {
            (Comparator::GreaterOrEqual, rest)
        } else if let Some(rest) = range.strip_prefix("<=") {
            (Comparator::LessOrEqual, rest)
        } else if let Some(rest) = range.strip_prefix('>') {
            (Comparator::Greater, rest)
        } else if let Some(rest) = range.strip_prefix('<') {
            (Comparator::Less, rest)
        } else if let Some(rest) = range.strip_prefix('=') {
            (Comparator::Equal, rest)
        } else {
            (Comparator::Equal, range)
        }
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Comparator::GreaterOrEqual => ordering != Ordering::Less,
            Comparator::LessOrEqual => ordering != Ordering::Greater,
            Comparator::Greater => ordering == Ordering::Greater,
            Comparator::Less => ordering == Ordering::Less,
            Comparator::Equal => ordering == Ordering::Equal,
        }
    }
}

fn is_comparator(_range: &str) -> bool {
    true
}

fn eval_comparator(version: &ParsedVersion, range: &str) -> bool {
    let (comparator, operand) = Comparator::split(range);
    match parse_operand(operand) {
        Some(bound) => comparator.holds(version.compare(&bound)),
        None => false,
    }
}

/// Parses the version half of a caret, tilde or comparator, tolerating a
/// leading `v` and surrounding whitespace.
fn parse_operand(operand: &str) -> Option<ParsedVersion> {
    let operand = operand.trim();
    let operand = operand.strip_prefix('v').unwrap_or(operand);
    ParsedVersion::parse(operand).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_exact_self_match() {
        for v in ["0.0.0", "0.0.7", "0.4.2", "1.0.0", "5.11.3", "10.20.30", "1.0.0-rc.1"] {
            assert!(satisfies(v, v), "{v} should satisfy itself");
        }
    }

    #[test]
    fn test_caret_ranges() {
        assert!(satisfies("5.11.3", "^5.0.0"));
        assert!(!satisfies("5.11.3", "^4.0.0"));
        assert!(!satisfies("5.11.3", "^5.12.0"));
        assert!(satisfies("5.11.3", "^5.11.3"));
        assert!(!satisfies("6.0.0", "^5.0.0"));
    }

    #[test]
    fn test_caret_zero_major() {
        assert!(satisfies("0.2.5", "^0.2.3"));
        assert!(satisfies("0.2.3", "^0.2.3"));
        assert!(!satisfies("0.2.2", "^0.2.3"));
        assert!(!satisfies("0.3.0", "^0.2.3"));
        assert!(!satisfies("1.2.5", "^0.2.3"));
    }

    #[test]
    fn test_caret_zero_zero_is_pinned() {
        assert!(satisfies("0.0.3", "^0.0.3"));
        assert!(!satisfies("0.0.4", "^0.0.3"));
        assert!(!satisfies("0.1.3", "^0.0.3"));
    }

    #[test]
    fn test_caret_rejects_prerelease() {
        assert!(!satisfies("5.11.3-alpha", "^5.11.3"));
        assert!(!satisfies("5.12.0-beta", "^5.0.0"));
    }

    #[test]
    fn test_tilde_ranges() {
        assert!(satisfies("5.11.3", "~5.11.0"));
        assert!(!satisfies("5.11.3", "~5.10.0"));
        assert!(!satisfies("5.11.3", "~5.11.4"));
        assert!(!satisfies("5.11.3-alpha", "~5.11.0"));
    }

    #[test]
    fn test_wildcards() {
        assert!(satisfies("5.11.3", "*"));
        assert!(!satisfies("5.11.3-alpha", "*"));

        assert!(satisfies("5.11.3", "5.x"));
        assert!(satisfies("5.0.0", "5.x.x"));
        assert!(!satisfies("6.0.0", "5.x"));
        assert!(!satisfies("5.11.3-alpha", "5.x"));

        assert!(satisfies("5.11.3", "5.11.x"));
        assert!(!satisfies("5.12.0", "5.11.x"));
        assert!(!satisfies("5.11.3-alpha", "5.11.x"));
    }

    #[test]
    fn test_conjunctions() {
        assert!(satisfies("5.11.3", ">=5.0.0 <6.0.0"));
        assert!(!satisfies("5.11.3", ">=5.0.0 <5.11.0"));
        assert!(satisfies("5.11.3", ">= 5.0.0 < 6.0.0"));
        assert!(!satisfies("5.11.3", ">=5.0.0 <"));
    }

    #[test]
    fn test_no_or_support() {
        assert!(!satisfies("5.11.3", "^4.0.0 || ^5.0.0"));
    }

    #[test]
    fn test_single_comparators() {
        assert!(satisfies("5.11.3", ">=5.11.3"));
        assert!(satisfies("5.11.3", "<=5.11.3"));
        assert!(!satisfies("5.11.3", ">5.11.3"));
        assert!(!satisfies("5.11.3", "<5.11.3"));
        assert!(satisfies("5.11.3", "=5.11.3"));
        assert!(satisfies("5.11.3", "v5.11.3"));
        assert!(satisfies("5.11.3-beta", "<5.11.3"));
    }

    #[test]
    fn test_unreadable_input_never_matches() {
        assert!(!satisfies("5.11.3", "latest"));
        assert!(!satisfies("latest", "latest"));
        assert!(!satisfies("latest", "*"));
        assert!(!satisfies("5.11.3", ""));
        assert!(!satisfies("5.11.3", "^5"));
        assert!(!satisfies("5.11", ">=5.0.0"));
        assert!(!satisfies("5.11.3", "git+https://github.com/a/b.git"));
    }

    #[test]
    fn test_rule_order() {
        assert_eq!(rule_name("*"), "any");
        assert_eq!(rule_name("5.x"), "major-wildcard");
        assert_eq!(rule_name("5.1.x"), "minor-wildcard");
        assert_eq!(rule_name("^5.0.0"), "caret");
        assert_eq!(rule_name("~5.0.0"), "tilde");
        assert_eq!(rule_name(">=5.0.0 <6.0.0"), "conjunction");
        assert_eq!(rule_name(">=5.0.0"), "comparator");
        assert_eq!(rule_name("latest"), "comparator");
        // Caret wins over the space split.
        assert_eq!(rule_name("^5.0.0 <5.5.0"), "caret");
    }

    #[test]
    fn test_non_ascii_digits_are_not_versions() {
        assert_eq!(rule_name("\u{663}.x"), "comparator");
        assert!(!satisfies("\u{663}.0.0", "\u{663}.0.0"));
        assert!(!satisfies("3.0.0", "\u{663}.x"));
    }

    fn version_string() -> impl Strategy<Value = String> {
        (
            any::<u64>(),
            any::<u64>(),
            any::<u64>(),
            proptest::option::of("[0-9A-Za-z][0-9A-Za-z.-]{0,11}"),
        )
            .prop_map(|(major, minor, patch, pre)| match pre {
                Some(pre) => format!("{major}.{minor}.{patch}-{pre}"),
                None => format!("{major}.{minor}.{patch}"),
            })
    }

    proptest! {
        #[test]
        fn test_every_version_satisfies_itself(version in version_string()) {
            prop_assert!(satisfies(&version, &version), "{} should satisfy itself", version);
        }

        #[test]
        fn test_release_satisfies_its_own_caret_and_tilde(
            major in 0u64..1000,
            minor in 0u64..1000,
            patch in 0u64..1000,
        ) {
            let version = format!("{major}.{minor}.{patch}");
            let caret = format!("^{version}");
            let tilde = format!("~{version}");
            let bounded = format!(">={version} <={version}");
            prop_assert!(satisfies(&version, &caret));
            prop_assert!(satisfies(&version, &tilde));
            prop_assert!(satisfies(&version, &bounded));
        }
    }
}
