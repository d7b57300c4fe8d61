//! Floating tag resolution.
//!
//! A floating tag policy pairs a regular expression over acceptable tags with
//! semantic-version ordering. Resolution enumerates every tag of a repository,
//! keeps the full matches that parse as semantic versions, and selects the
//! highest one.

mod pattern;
mod resolver;
mod version;

pub use pattern::TagPattern;
pub use resolver::TagResolver;
pub use version::{TagCandidateSet, TagVersion};
