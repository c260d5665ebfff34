//! Version parsing, ordering and range matching.
//!
//! - [`ParsedVersion`] - a strict `major.minor.patch[-pre]` version
//! - [`satisfies`] - evaluates npm-style range expressions

mod parsed;
mod range;

pub use parsed::{NotAVersion, ParsedVersion};
pub use range::{evaluate, rule_name, satisfies};
