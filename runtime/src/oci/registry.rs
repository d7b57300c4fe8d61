//! Registry client for tag enumeration.
//!
//! Uses the `oci-distribution` crate to talk to container registries
//! (Docker Hub, GHCR, Quay, self-hosted distribution servers).

use async_trait::async_trait;
use autoupdate_core::config::RegistryConfig;
use autoupdate_core::error::{Result, UpdateError};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use oci_distribution::client::{ClientConfig, ClientProtocol};
use oci_distribution::secrets::RegistryAuth as OciRegistryAuth;
use oci_distribution::{Client, Reference, RegistryOperation};

use super::credentials::CredentialStore;
use super::reference::DEFAULT_TAG;

/// Authentication credentials for a container registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryAuth {
    username: Option<String>,
    password: Option<String>,
}

impl RegistryAuth {
    /// Create anonymous authentication (no credentials).
    pub fn anonymous() -> Self {
        Self {
            username: None,
            password: None,
        }
    }

    /// Create basic authentication with username and password.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// Create authentication from environment variables.
    ///
    /// Reads `REGISTRY_USERNAME` and `REGISTRY_PASSWORD`.
    /// Falls back to anonymous if not set.
    pub fn from_env() -> Self {
        let username = std::env::var("REGISTRY_USERNAME").ok();
        let password = std::env::var("REGISTRY_PASSWORD").ok();

        if username.is_some() && password.is_some() {
            Self { username, password }
        } else {
            Self::anonymous()
        }
    }

    /// Look up credentials for `registry` in the store, falling back to env vars,
    /// then anonymous.
    pub fn for_registry(registry: &str, store: Option<&CredentialStore>) -> Self {
        if let Some(store) = store {
            match store.get(registry) {
                Ok(Some((username, password))) => return Self::basic(username, password),
                Ok(None) => {}
                Err(e) => tracing::warn!(
                    registry,
                    error = %e,
                    "Ignoring unreadable credential store"
                ),
            }
        }
        Self::from_env()
    }

    pub fn is_anonymous(&self) -> bool {
        self.username.is_none()
    }

    /// Convert to oci-distribution auth type.
    fn to_oci_auth(&self) -> OciRegistryAuth {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => OciRegistryAuth::Basic(u.clone(), p.clone()),
            _ => OciRegistryAuth::Anonymous,
        }
    }
}

/// Source of repository tags.
///
/// `list_tags` yields every tag of the repository exactly once per call.
/// The stream is lazy: pages are fetched only as it is polled.
#[async_trait]
pub trait TagRegistry: Send + Sync {
    /// Obtain a credential for reading `repository` on `host`.
    async fn authenticate(&self, host: &str, repository: &str) -> Result<RegistryAuth>;

    /// Enumerate the tags of `repository` on `host`.
    fn list_tags<'a>(
        &'a self,
        host: &'a str,
        repository: &'a str,
        credential: &'a RegistryAuth,
    ) -> BoxStream<'a, Result<String>>;
}

/// Position in a paginated tag listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PageCursor {
    last: Option<String>,
    exhausted: bool,
}

impl PageCursor {
    /// Cursor after receiving `page`, or `None` when the page adds nothing.
    ///
    /// A short page ends the listing, and so does a page longer than
    /// requested (the registry ignored `n` and sent everything).
    fn advance(&self, page: &[String], page_size: usize) -> Option<PageCursor> {
        let last = page.last()?;
        if self.last.as_ref() == Some(last) {
            return None;
        }
        Some(PageCursor {
            last: Some(last.clone()),
            exhausted: page.len() != page_size,
        })
    }
}

/// Tag registry backed by the OCI distribution API.
///
/// Pages are requested with `n` and `last`. `oci-distribution` does not
/// expose the `Link` header, so a page shorter than `n` is taken as the end
/// of the listing; a registry that returns short pages while more tags
/// remain will have its listing cut short.
pub struct OciTagRegistry {
    client: Client,
    credentials: Option<CredentialStore>,
    page_size: usize,
}

impl OciTagRegistry {
    /// Create a registry client from configuration.
    pub fn new(config: &RegistryConfig) -> Self {
        let protocol = if config.insecure_hosts.is_empty() {
            ClientProtocol::Https
        } else {
            ClientProtocol::HttpsExcept(config.insecure_hosts.clone())
        };
        let client = Client::new(ClientConfig {
            protocol,
            ..Default::default()
        });
        let credentials = config
            .credentials_file
            .clone()
            .map(CredentialStore::new)
            .or_else(|| CredentialStore::default_path().ok());

        Self {
            client,
            credentials,
            page_size: config.page_size.max(1),
        }
    }

    fn reference(host: &str, repository: &str) -> Reference {
        Reference::with_tag(host.to_string(), repository.to_string(), DEFAULT_TAG.to_string())
    }

    async fn fetch_page(
        &self,
        reference: Reference,
        auth: OciRegistryAuth,
        host: &str,
        cursor: PageCursor,
    ) -> Result<Option<(Vec<String>, PageCursor)>> {
        if cursor.exhausted {
            return Ok(None);
        }

        let response = self
            .client
            .list_tags(&reference, &auth, Some(self.page_size), cursor.last.as_deref())
            .await
            .map_err(|e| {
                UpdateError::registry(
                    host,
                    format!("Failed to list tags of {}: {}", reference.repository(), e),
                )
            })?;

        tracing::debug!(
            registry = host,
            repository = %reference.repository(),
            count = response.tags.len(),
            "Fetched tag page"
        );

        Ok(cursor
            .advance(&response.tags, self.page_size)
            .map(|next| (response.tags, next)))
    }
}

#[async_trait]
impl TagRegistry for OciTagRegistry {
    async fn authenticate(&self, host: &str, repository: &str) -> Result<RegistryAuth> {
        let auth = RegistryAuth::for_registry(host, self.credentials.as_ref());
        let reference = Self::reference(host, repository);

        self.client
            .auth(&reference, &auth.to_oci_auth(), RegistryOperation::Pull)
            .await
            .map_err(|e| {
                UpdateError::registry(host, format!("Authentication for {} failed: {}", repository, e))
            })?;

        tracing::debug!(
            registry = host,
            repository,
            anonymous = auth.is_anonymous(),
            "Authenticated against registry"
        );
        Ok(auth)
    }

    fn list_tags<'a>(
        &'a self,
        host: &'a str,
        repository: &'a str,
        credential: &'a RegistryAuth,
    ) -> BoxStream<'a, Result<String>> {
        let reference = Self::reference(host, repository);
        let auth = credential.to_oci_auth();

        stream::try_unfold(PageCursor::default(), move |cursor| {
            self.fetch_page(reference.clone(), auth.clone(), host, cursor)
        })
        .map_ok(|page| stream::iter(page.into_iter().map(Ok::<String, UpdateError>)))
        .try_flatten()
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_registry_auth_anonymous() {
        let auth = RegistryAuth::anonymous();
        assert!(auth.is_anonymous());
        assert!(matches!(auth.to_oci_auth(), OciRegistryAuth::Anonymous));
    }

    #[test]
    fn test_registry_auth_basic() {
        let auth = RegistryAuth::basic("user", "pass");
        assert_eq!(auth.username, Some("user".to_string()));
        assert_eq!(auth.password, Some("pass".to_string()));
        assert!(matches!(auth.to_oci_auth(), OciRegistryAuth::Basic(_, _)));
    }

    #[test]
    fn test_registry_auth_from_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(
            &path,
            r#"{"registries": {"quay.io": {"username": "robot", "password": "token"}}}"#,
        )
        .unwrap();
        let store = CredentialStore::new(path);

        let auth = RegistryAuth::for_registry("quay.io", Some(&store));
        assert_eq!(auth, RegistryAuth::basic("robot", "token"));
    }

    #[test]
    fn test_cursor_full_page_continues() {
        let cursor = PageCursor::default();
        let next = cursor.advance(&page(&["1.0.0", "1.1.0"]), 2).unwrap();
        assert_eq!(next.last.as_deref(), Some("1.1.0"));
        assert!(!next.exhausted);
    }

    #[test]
    fn test_cursor_short_page_exhausts() {
        let next = PageCursor::default().advance(&page(&["1.0.0"]), 2).unwrap();
        assert!(next.exhausted);
    }

    #[test]
    fn test_cursor_oversized_page_exhausts() {
        let next = PageCursor::default()
            .advance(&page(&["1.0.0", "1.1.0", "1.2.0"]), 2)
            .unwrap();
        assert!(next.exhausted);
    }

    #[test]
    fn test_cursor_empty_page_stops() {
        assert!(PageCursor::default().advance(&[], 2).is_none());
    }

    #[test]
    fn test_cursor_repeated_page_stops() {
        let cursor = PageCursor {
            last: Some("1.1.0".to_string()),
            exhausted: false,
        };
        assert!(cursor.advance(&page(&["1.0.0", "1.1.0"]), 2).is_none());
    }

    #[test]
    fn test_reference_uses_full_repository() {
        let reference = OciTagRegistry::reference("registry.hub.docker.com", "library/nginx");
        assert_eq!(reference.registry(), "registry.hub.docker.com");
        assert_eq!(reference.repository(), "library/nginx");
    }
}
