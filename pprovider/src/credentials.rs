//! In-memory API key storage with redacted debug output.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::{ProviderError, ProviderId};

#[derive(PartialEq, Eq)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn expose(&self) -> &str {
        self.value.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        // SAFETY: zero bytes are valid UTF-8.
        unsafe {
            self.value.as_mut_vec().fill(0);
        }
    }
}

#[derive(Debug, Default)]
pub struct SecureCredentialManager {
    api_keys: Mutex<HashMap<ProviderId, SecretString>>,
}

impl SecureCredentialManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_api_key(
        &self,
        provider: ProviderId,
        api_key: impl Into<String>,
    ) -> Result<(), ProviderError> {
        let api_key = SecretString::new(api_key);
        if api_key.is_empty() {
            return Err(ProviderError::authentication("api key must not be empty"));
        }

        self.api_keys()?.insert(provider, api_key);
        Ok(())
    }

    /// Loads a key from `variable` when it is set and non-empty.
    ///
    /// Returns whether a key was stored.
    pub fn load_api_key_from_env(
        &self,
        provider: ProviderId,
        variable: &str,
    ) -> Result<bool, ProviderError> {
        match std::env::var(variable) {
            Ok(value) if !value.trim().is_empty() => {
                self.set_api_key(provider, value.trim())?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn has_credentials(&self, provider: ProviderId) -> Result<bool, ProviderError> {
        Ok(self.api_keys()?.contains_key(&provider))
    }

    pub fn api_key(&self, provider: ProviderId) -> Result<Option<SecretString>, ProviderError> {
        Ok(self.api_keys()?.get(&provider).cloned())
    }

    pub fn clear(&self, provider: ProviderId) -> Result<bool, ProviderError> {
        Ok(self.api_keys()?.remove(&provider).is_some())
    }

    fn api_keys(&self) -> Result<MutexGuard<'_, HashMap<ProviderId, SecretString>>, ProviderError> {
        self.api_keys
            .lock()
            .map_err(|_| ProviderError::other("credential manager lock poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::{SecretString, SecureCredentialManager};
    use crate::ProviderId;

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let secret = SecretString::new("sk-live-123");
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
        assert_eq!(secret.expose(), "sk-live-123");
    }

    #[test]
    fn empty_keys_are_rejected() {
        let manager = SecureCredentialManager::new();
        let error = manager
            .set_api_key(ProviderId::OpenAi, "")
            .expect_err("empty key should fail");

        assert!(error.message.contains("must not be empty"));
        assert!(!manager.has_credentials(ProviderId::OpenAi).expect("lock"));
    }

    #[test]
    fn stored_keys_can_be_read_and_cleared() {
        let manager = SecureCredentialManager::new();
        manager
            .set_api_key(ProviderId::OpenAi, "sk-test")
            .expect("key should store");

        let key = manager
            .api_key(ProviderId::OpenAi)
            .expect("lock")
            .expect("key should exist");
        assert_eq!(key.expose(), "sk-test");
        assert!(manager.clear(ProviderId::OpenAi).expect("lock"));
        assert!(manager.api_key(ProviderId::OpenAi).expect("lock").is_none());
    }
}
