//! Secure token manager with memory-safe handling and masking capabilities
//!
//! The update server token is held as a `secrecy::SecretString` and masked
//! before it can reach logs or error messages.

use secrecy::SecretString;
use std::collections::HashMap;

/// Environment variable holding the update server token
pub const TOKEN_ENV_VAR: &str = "GENERIC_PUBLISHER_TOKEN";

/// Secure token manager for update server authentication
///
/// # Examples
///
/// ```
/// use generic_publisher::security::SecureTokenManager;
///
/// let manager = SecureTokenManager::new();
/// assert_eq!(manager.mask_token("abcdef123456"), "abc...456");
/// ```
pub struct SecureTokenManager {
    env_var: String,
}

impl Default for SecureTokenManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureTokenManager {
    /// Creates a manager reading `GENERIC_PUBLISHER_TOKEN`
    pub fn new() -> Self {
        Self::with_env_var(TOKEN_ENV_VAR)
    }

    /// Creates a manager reading the given environment variable
    pub fn with_env_var(env_var: impl Into<String>) -> Self {
        Self {
            env_var: env_var.into(),
        }
    }

    /// Retrieves the token from an environment snapshot
    ///
    /// Returns `None` if the variable is unset or empty.
    pub fn get_token(&self, env: &HashMap<String, String>) -> Option<SecretString> {
        let token_value = env.get(&self.env_var)?;
        if token_value.is_empty() {
            return None;
        }
        Some(SecretString::new(token_value.clone().into()))
    }

    /// Checks if a token is set in the environment snapshot
    pub fn has_token(&self, env: &HashMap<String, String>) -> bool {
        self.get_token(env).is_some()
    }

    /// Gets the environment variable name this manager reads
    pub fn token_name(&self) -> &str {
        &self.env_var
    }

    /// Masks a token for safe logging
    ///
    /// Shows only the first 3 and last 3 characters for identification purposes.
    /// Tokens shorter than 10 characters are fully masked as "****".
    ///
    /// # Examples
    ///
    /// ```
    /// use generic_publisher::security::SecureTokenManager;
    ///
    /// let manager = SecureTokenManager::new();
    /// assert_eq!(manager.mask_token("abcdef123456"), "abc...456");
    /// assert_eq!(manager.mask_token("short"), "****");
    /// ```
    pub fn mask_token(&self, token: &str) -> String {
        let chars: Vec<char> = token.chars().collect();
        if chars.len() < 10 {
            return "****".to_string();
        }

        let prefix: String = chars[..3].iter().collect();
        let suffix: String = chars[chars.len() - 3..].iter().collect();
        format!("{}...{}", prefix, suffix)
    }

    /// Replaces every occurrence of `token` in `text` with its masked form
    ///
    /// For a scheme-prefixed token such as `Bearer <secret>`, a bare echo of
    /// the secret is masked as well.
    pub fn mask_token_in_string(&self, text: &str, token: &str) -> String {
        if token.is_empty() {
            return text.to_string();
        }
        let masked = text.replace(token, &self.mask_token(token));

        match token.split_once(char::is_whitespace) {
            Some((_, secret)) if !secret.trim().is_empty() => {
                let secret = secret.trim();
                masked.replace(secret, &self.mask_token(secret))
            }
            _ => masked,
        }
    }
}
