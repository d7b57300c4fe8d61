//! OCI registry support.
//!
//! - Image reference parsing and normalization
//! - Registry credentials
//! - Paginated tag listing

pub mod credentials;
pub mod reference;
pub mod registry;

pub use credentials::CredentialStore;
pub use reference::{ImageReference, DEFAULT_PREFIX, DEFAULT_REGISTRY_HOST, DEFAULT_TAG};
pub use registry::{OciTagRegistry, RegistryAuth, TagRegistry};
