//! Credential resolution: user override key first, deployment default second.
//!
//! The orchestration core never reads ambient storage directly. It asks a
//! caller-provided [`CredentialResolver`], so a UI shell can back the
//! override with whatever persistence it has (settings store, keychain,
//! browser-local storage) without the core knowing.

use std::env;

/// Resolves the access credential for the remote model endpoint.
///
/// Priority is fixed: a user-supplied override always beats the deployment
/// default. Absence of both is a fatal precondition reported before any
/// network attempt ([`crate::error::ConvertError::MissingCredential`]).
pub trait CredentialResolver: Send + Sync {
    /// The user-supplied override key, if any.
    fn user_key(&self) -> Option<String>;

    /// The deployment-bundled default key, if any.
    fn default_key(&self) -> Option<String>;

    /// Resolve the effective key: override first, default second.
    /// Blank strings count as absent.
    fn resolve(&self) -> Option<String> {
        self.user_key()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.default_key().filter(|k| !k.trim().is_empty()))
    }
}

/// Environment-backed resolver, the library default.
///
/// Reads `PDF2DOC_API_KEY` as the user override and `GEMINI_API_KEY` as the
/// deployment default. Variable names are fields so hosts with their own
/// conventions can rename without reimplementing the trait.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    /// Env var holding the user override key.
    pub override_var: String,
    /// Env var holding the deployment default key.
    pub default_var: String,
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self {
            override_var: "PDF2DOC_API_KEY".into(),
            default_var: "GEMINI_API_KEY".into(),
        }
    }
}

impl CredentialResolver for EnvCredentials {
    fn user_key(&self) -> Option<String> {
        env::var(&self.override_var).ok()
    }

    fn default_key(&self) -> Option<String> {
        env::var(&self.default_var).ok()
    }
}

/// Fixed-value resolver for CLIs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    /// User-supplied override key.
    pub user: Option<String>,
    /// Deployment default key.
    pub default: Option<String>,
}

impl CredentialResolver for StaticCredentials {
    fn user_key(&self) -> Option<String> {
        self.user.clone()
    }

    fn default_key(&self) -> Option<String> {
        self.default.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_beats_default() {
        let creds = StaticCredentials {
            user: Some("user-key".into()),
            default: Some("deploy-key".into()),
        };
        assert_eq!(creds.resolve().as_deref(), Some("user-key"));
    }

    #[test]
    fn falls_back_to_default() {
        let creds = StaticCredentials {
            user: None,
            default: Some("deploy-key".into()),
        };
        assert_eq!(creds.resolve().as_deref(), Some("deploy-key"));
    }

    #[test]
    fn blank_override_is_absent() {
        let creds = StaticCredentials {
            user: Some("   ".into()),
            default: Some("deploy-key".into()),
        };
        assert_eq!(creds.resolve().as_deref(), Some("deploy-key"));
    }

    #[test]
    fn nothing_resolves_to_none() {
        let creds = StaticCredentials::default();
        assert_eq!(creds.resolve(), None);
    }
}
