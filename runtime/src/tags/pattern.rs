//! Tag-matching patterns.

use regex::Regex;

/// Regular expression that must match a whole tag.
#[derive(Debug, Clone)]
pub struct TagPattern {
    raw: String,
    regex: Regex,
}

impl TagPattern {
    /// Compile `raw` for full-string matching.
    ///
    /// The pattern is anchored at both ends, so `1\..*` and `^1\..*$`
    /// accept the same tags.
    pub fn new(raw: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{})$", raw))?;
        Ok(Self {
            raw: raw.to_string(),
            regex,
        })
    }

    pub fn is_match(&self, tag: &str) -> bool {
        self.regex.is_match(tag)
    }

    /// The pattern as written in the policy.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for TagPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
