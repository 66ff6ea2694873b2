//! Fernet decryption for secrets stored encrypted at rest.

use crate::ConfigError;

/// Decrypt a Fernet token with a url-safe base64 key and return the
/// plaintext as UTF-8.
///
/// # Errors
///
/// Returns [`ConfigError::Decrypt`] if the key is malformed, the token fails
/// authentication, or the plaintext is not valid UTF-8.
pub fn decrypt_fernet(token: &str, key: &str) -> Result<String, ConfigError> {
    let fernet = fernet::Fernet::new(key.trim())
        .ok_or_else(|| ConfigError::Decrypt("encryption key is not a valid Fernet key".into()))?;

    let plaintext = fernet
        .decrypt(token.trim())
        .map_err(|_| ConfigError::Decrypt("token could not be authenticated".into()))?;

    String::from_utf8(plaintext)
        .map_err(|e| ConfigError::Decrypt(format!("plaintext is not UTF-8: {e}")))
}
