//! GitHub token storage and resolution.
//!
//! The token is looked up once at startup, in this order:
//!
//! 1. the `GITHUB_TOKEN` environment variable
//! 2. the OS keychain entry `github/token` (service `epicwatch`)
//!
//! When neither is set, the GitHub client runs unauthenticated (public
//! repositories only, lower rate limits).
//!
//! # Example
//!
//! ```ignore
//! use epicwatch_storage::{resolve_github_token, KeychainStore};
//!
//! let resolved = resolve_github_token(&KeychainStore::new());
//! let client = GitHubClient::new(resolved.token);
//! ```

mod keychain;
mod memory;
mod token;

pub use keychain::KeychainStore;
pub use memory::MemoryStore;
pub use token::{resolve_github_token, resolve_token_with, token_key, ResolvedToken, TokenOrigin};

use epicwatch_core::Result;

/// Environment variable holding the GitHub token.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Credential storage backend.
pub trait CredentialStore: Send + Sync {
    /// Store a credential under `key` (e.g. `github/token`).
    fn store(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a stored credential, `Ok(None)` if absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Delete a stored credential; deleting a missing key succeeds.
    fn delete(&self, key: &str) -> Result<()>;

    /// Check if a credential exists.
    fn exists(&self, key: &str) -> bool {
        matches!(self.get(key), Ok(Some(_)))
    }
}
