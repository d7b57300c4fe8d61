//! Image reference parsing.
//!
//! Splits references like `quay.io/org/app:1.4.2` into host, prefix,
//! repository and tag. Parsing is positional and never fails:
//!
//! 1. A trailing `:tag` is split off on the rightmost colon, unless the text
//!    after that colon contains a `/` (then the colon belongs to `host:port`).
//! 2. The remainder is split on its rightmost `/` into prefix and repository.
//! 3. A prefix that itself contains a `/` is split on its rightmost `/` into
//!    host and prefix.
//!
//! A two-segment reference whose first segment looks like a registry host
//! (contains `.` or `:`, or is `localhost`) keeps that segment as the host.
//! Inputs the positional rules cannot classify (for example a digest
//! reference) are reported by [`ImageReference::validate`] instead of guessed.

use autoupdate_core::error::{Result, UpdateError};

/// Canonical Docker Hub registry host.
pub const DEFAULT_REGISTRY_HOST: &str = "registry.hub.docker.com";

/// Other names of Docker Hub, normalized to [`DEFAULT_REGISTRY_HOST`] on resolution.
pub const DOCKER_HUB_ALIASES: &[&str] = &["index.docker.io", "docker.io", "registry-1.docker.io"];

/// Namespace of official images on the default registry.
pub const DEFAULT_PREFIX: &str = "library";

/// Tag used when a reference carries none.
pub const DEFAULT_TAG: &str = "latest";

/// Parsed image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Registry host (e.g., "quay.io", "localhost:5000")
    pub host: Option<String>,
    /// Namespace prefix (e.g., "org", "library")
    pub prefix: Option<String>,
    /// Repository name (e.g., "nginx")
    pub repository: String,
    /// Tag (e.g., "1.25.3")
    pub tag: Option<String>,
}

impl ImageReference {
    /// Parse an image reference string.
    ///
    /// - `nginx` → repository `nginx`
    /// - `nginx:1.25` → repository `nginx`, tag `1.25`
    /// - `bitnami/redis` → prefix `bitnami`, repository `redis`
    /// - `quay.io/redis` → host `quay.io`, repository `redis`
    /// - `quay.io/org/app:v2` → host `quay.io`, prefix `org`, repository `app`, tag `v2`
    /// - `localhost:5000/app` → host `localhost:5000`, repository `app`
    pub fn parse(raw: &str) -> Self {
        let (rest, tag) = match raw.rsplit_once(':') {
            Some((rest, tag)) if !tag.contains('/') => (rest, Some(tag.to_string())),
            _ => (raw, None),
        };

        let (prefix, repository) = match rest.rsplit_once('/') {
            Some((prefix, repository)) => (Some(prefix), repository),
            None => (None, rest),
        };

        let (host, prefix) = match prefix {
            Some(prefix) => match prefix.rsplit_once('/') {
                Some((host, prefix)) => (Some(host.to_string()), Some(prefix.to_string())),
                None if looks_like_host(prefix) => (Some(prefix.to_string()), None),
                None => (None, Some(prefix.to_string())),
            },
            None => (None, None),
        };

        ImageReference {
            host,
            prefix,
            repository: repository.to_string(),
            tag,
        }
    }

    /// Check the reference against the canonical reference grammar.
    ///
    /// Rejects empty segments, digest references and tags outside
    /// `[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}`.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| {
            Err(UpdateError::InvalidReference(format!(
                "'{}' - {}",
                self.short_spec(),
                reason
            )))
        };

        if self.repository.is_empty() {
            return invalid("empty repository");
        }
        if self.host.as_deref().is_some_and(|h| h.is_empty() || h.split('/').any(str::is_empty)) {
            return invalid("empty host segment");
        }
        if self.prefix.as_deref().is_some_and(str::is_empty) {
            return invalid("empty namespace segment");
        }
        let name_parts = [self.host.as_deref(), self.prefix.as_deref(), Some(self.repository.as_str())];
        if name_parts.iter().flatten().any(|part| part.contains('@')) {
            return invalid("digest references are not supported");
        }
        if let Some(ref tag) = self.tag {
            if !is_valid_tag(tag) {
                return invalid("malformed tag");
            }
        }
        Ok(())
    }

    /// Registry host to contact, with the default and Docker Hub aliases resolved.
    pub fn full_host(&self) -> &str {
        match self.host.as_deref() {
            None => DEFAULT_REGISTRY_HOST,
            Some(host) if is_docker_hub_alias(host) => DEFAULT_REGISTRY_HOST,
            Some(host) => host,
        }
    }

    /// Namespace prefix, defaulted to `library` only on the default registry.
    pub fn full_prefix(&self) -> Option<&str> {
        match self.prefix.as_deref() {
            None if self.full_host() == DEFAULT_REGISTRY_HOST => Some(DEFAULT_PREFIX),
            prefix => prefix,
        }
    }

    /// Repository path as the registry API expects it.
    pub fn full_repository(&self) -> String {
        match self.full_prefix() {
            Some(prefix) => format!("{}/{}", prefix, self.repository),
            None => self.repository.clone(),
        }
    }

    /// Tag, defaulted to `latest`.
    pub fn full_tag(&self) -> &str {
        self.tag.as_deref().unwrap_or(DEFAULT_TAG)
    }

    /// Serialize using the stored components only.
    pub fn short_spec(&self) -> String {
        create_spec(
            self.host.as_deref(),
            self.prefix.as_deref(),
            &self.repository,
            self.tag.as_deref(),
        )
    }

    /// Serialize with every default resolved.
    pub fn full_spec(&self) -> String {
        create_spec(
            Some(self.full_host()),
            self.full_prefix(),
            &self.repository,
            Some(self.full_tag()),
        )
    }

    /// Copy of this reference pointing at another tag.
    pub fn with_tag(&self, tag: impl Into<String>) -> Self {
        ImageReference {
            tag: Some(tag.into()),
            ..self.clone()
        }
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short_spec())
    }
}

/// Whether `host` is another name of the default registry (case-insensitive).
pub fn is_docker_hub_alias(host: &str) -> bool {
    DOCKER_HUB_ALIASES
        .iter()
        .any(|alias| alias.eq_ignore_ascii_case(host))
}

fn create_spec(host: Option<&str>, prefix: Option<&str>, repository: &str, tag: Option<&str>) -> String {
    let mut spec = String::new();
    for segment in [host, prefix].into_iter().flatten() {
        spec.push_str(segment);
        spec.push('/');
    }
    spec.push_str(repository);
    if let Some(tag) = tag {
        spec.push(':');
        spec.push_str(tag);
    }
    spec
}

fn looks_like_host(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':') || segment == "localhost"
}

fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    let first_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
    first_ok
        && tag.len() <= 128
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}
