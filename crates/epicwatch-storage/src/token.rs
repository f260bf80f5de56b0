//! Token resolution: environment first, then the credential store.

use std::fmt;

use tracing::{debug, warn};

use crate::{CredentialStore, GITHUB_TOKEN_ENV};

/// Standard credential key for a provider's API token.
pub fn token_key(provider: &str) -> String {
    format!("{}/token", provider)
}

/// Where the token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOrigin {
    Environment,
    Keychain,
    /// No token; requests go out unauthenticated
    Absent,
}

impl fmt::Display for TokenOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenOrigin::Environment => write!(f, "environment ({})", GITHUB_TOKEN_ENV),
            TokenOrigin::Keychain => write!(f, "keychain"),
            TokenOrigin::Absent => write!(f, "none"),
        }
    }
}

/// Outcome of token resolution.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    pub token: Option<String>,
    pub origin: TokenOrigin,
}

// Keep the secret out of logs.
impl fmt::Debug for ResolvedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedToken")
            .field("token", &self.token.as_ref().map(|_| "<hidden>"))
            .field("origin", &self.origin)
            .finish()
    }
}

/// Resolve the GitHub token from `GITHUB_TOKEN`, then `store`.
pub fn resolve_github_token(store: &dyn CredentialStore) -> ResolvedToken {
    resolve_token_with(|name| std::env::var(name).ok(), store)
}

/// Resolve the GitHub token with an explicit environment lookup.
pub fn resolve_token_with(
    env: impl Fn(&str) -> Option<String>,
    store: &dyn CredentialStore,
) -> ResolvedToken {
    if let Some(token) = env(GITHUB_TOKEN_ENV).filter(|t| !t.trim().is_empty()) {
        debug!("Using GitHub token from environment");
        return ResolvedToken {
            token: Some(token.trim().to_string()),
            origin: TokenOrigin::Environment,
        };
    }

    match store.get(&token_key("github")) {
        Ok(Some(token)) if !token.trim().is_empty() => {
            debug!("Using GitHub token from keychain");
            ResolvedToken {
                token: Some(token),
                origin: TokenOrigin::Keychain,
            }
        }
        Ok(_) => ResolvedToken {
            token: None,
            origin: TokenOrigin::Absent,
        },
        Err(e) => {
            warn!(error = %e, "Could not read GitHub token from keychain");
            ResolvedToken {
                token: None,
                origin: TokenOrigin::Absent,
            }
        }
    }
}
