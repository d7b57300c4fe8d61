//! Semantic version ordering of tags.

use std::cmp::Ordering;

use semver::Version;

/// Semantic version parsed from a tag, ordered by version precedence.
///
/// Precedence compares `major.minor.patch` numerically, ranks a pre-release
/// below its release and ignores build metadata, so `1.0.0+a` and `1.0.0+b`
/// compare equal.
#[derive(Debug, Clone)]
pub struct TagVersion(Version);

impl TagVersion {
    /// Parse a tag as a strict semantic version (`1.2.3`, `1.2.3-rc.1`).
    pub fn parse(tag: &str) -> Result<Self, semver::Error> {
        Version::parse(tag).map(Self)
    }

    pub fn version(&self) -> &Version {
        &self.0
    }
}

impl Ord for TagVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (&self.0, &other.0);
        a.major
            .cmp(&b.major)
            .then(a.minor.cmp(&b.minor))
            .then(a.patch.cmp(&b.patch))
            .then_with(|| a.pre.cmp(&b.pre))
    }
}

impl PartialOrd for TagVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for TagVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TagVersion {}

/// Tags that passed the pattern filter, kept with their parsed versions.
///
/// Built once per resolution; insertion order is remembered so equal
/// versions keep the order in which the registry listed them.
#[derive(Debug, Default)]
pub struct TagCandidateSet {
    candidates: Vec<(TagVersion, String)>,
}

impl TagCandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag if it is a valid semantic version.
    pub fn offer(&mut self, tag: &str) -> Result<(), semver::Error> {
        let version = TagVersion::parse(tag)?;
        self.candidates.push((version, tag.to_string()));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Tags by descending precedence; ties keep first-encountered order.
    pub fn into_ordered(mut self) -> Vec<String> {
        // sort_by is stable
        self.candidates.sort_by(|(a, _), (b, _)| b.cmp(a));
        self.candidates.into_iter().map(|(_, tag)| tag).collect()
    }

    /// Highest-precedence tag, or `None` when the set is empty.
    pub fn best(self) -> Option<String> {
        if self.candidates.len() == 1 {
            return self.candidates.into_iter().next().map(|(_, tag)| tag);
        }
        self.into_ordered().into_iter().next()
    }
}
