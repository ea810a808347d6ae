//! Password hashing for the Lif Auth Server.
//!
//! Every account stores a digest of `password + salt` alongside its own
//! random salt. The scheme is fixed per deployment so stored hashes stay
//! verifiable for the lifetime of the accounts.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Number of random bytes in a salt.
pub const SALT_BYTES: usize = 16;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Password-related errors.
#[derive(Error, Debug)]
pub enum PasswordError {
    /// Password is empty.
    #[error("password cannot be empty")]
    Empty,

    /// Password is too long.
    #[error("password must be at most {MAX_PASSWORD_LENGTH} characters")]
    TooLong,

    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    HashError(String),

    /// Stored hash is not in the expected format.
    #[error("invalid password hash format")]
    InvalidHash,
}

/// Hashing scheme used for stored passwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordScheme {
    /// Lowercase hex of SHA-256 over `password + salt`.
    #[default]
    Sha256,
    /// Argon2id PHC string, using the account salt.
    Argon2id,
}

/// Create the Argon2 hasher.
///
/// Parameters:
/// - Memory cost: 64 MB (65536 KiB)
/// - Time cost: 3 iterations
/// - Parallelism: 4 threads
fn create_argon2() -> Result<Argon2<'static>, PasswordError> {
    let params =
        Params::new(65536, 3, 4, None).map_err(|e| PasswordError::HashError(e.to_string()))?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

impl PasswordScheme {
    /// Hash a password with the given salt.
    ///
    /// # Examples
    ///
    /// ```
    /// use lif_auth::auth::PasswordScheme;
    ///
    /// let hash = PasswordScheme::Sha256.hash("pw123", "abcd").unwrap();
    /// assert_eq!(hash.len(), 64);
    /// ```
    pub fn hash(&self, password: &str, salt: &str) -> Result<String, PasswordError> {
        match self {
            PasswordScheme::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(password.as_bytes());
                hasher.update(salt.as_bytes());
                Ok(hex::encode(hasher.finalize()))
            }
            PasswordScheme::Argon2id => {
                let salt = SaltString::encode_b64(salt.as_bytes())
                    .map_err(|e| PasswordError::HashError(e.to_string()))?;
                let hash = create_argon2()?
                    .hash_password(password.as_bytes(), &salt)
                    .map_err(|e| PasswordError::HashError(e.to_string()))?;
                Ok(hash.to_string())
            }
        }
    }

    /// Check a password against a stored hash.
    ///
    /// Returns `Ok(false)` on mismatch. Errors only when the stored hash
    /// cannot be interpreted at all.
    pub fn verify(&self, password: &str, salt: &str, stored: &str) -> Result<bool, PasswordError> {
        match self {
            PasswordScheme::Sha256 => Ok(self.hash(password, salt)? == stored),
            PasswordScheme::Argon2id => {
                let parsed = PasswordHash::new(stored).map_err(|_| PasswordError::InvalidHash)?;
                // Parameters come from the parsed hash
                Ok(Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok())
            }
        }
    }
}

/// Generate a fresh random salt (hex encoded).
pub fn generate_salt() -> String {
    let bytes: [u8; SALT_BYTES] = rand::rng().random();
    hex::encode(bytes)
}

/// Validate password requirements.
///
/// # Examples
///
/// ```
/// use lif_auth::auth::validate_password;
///
/// assert!(validate_password("").is_err());
/// assert!(validate_password("pw123").is_ok());
/// ```
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::Empty);
    }
    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(PasswordError::TooLong);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_matches_known_digest() {
        // sha256("pw123" + "salt")
        let hash = PasswordScheme::Sha256.hash("pw123", "salt").unwrap();
        let mut hasher = Sha256::new();
        hasher.update(b"pw123salt");
        assert_eq!(hash, hex::encode(hasher.finalize()));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_sha256_verify() {
        let salt = generate_salt();
        let hash = PasswordScheme::Sha256.hash("pw123", &salt).unwrap();

        assert!(PasswordScheme::Sha256.verify("pw123", &salt, &hash).unwrap());
        assert!(!PasswordScheme::Sha256.verify("pw124", &salt, &hash).unwrap());
        assert!(!PasswordScheme::Sha256
            .verify("pw123", &generate_salt(), &hash)
            .unwrap());
    }

    #[test]
    fn test_argon2_verify() {
        let salt = generate_salt();
        let hash = PasswordScheme::Argon2id.hash("pw123", &salt).unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(PasswordScheme::Argon2id.verify("pw123", &salt, &hash).unwrap());
        assert!(!PasswordScheme::Argon2id.verify("wrong", &salt, &hash).unwrap());
    }

    #[test]
    fn test_argon2_invalid_stored_hash() {
        let result = PasswordScheme::Argon2id.verify("pw", "salt", "not-a-phc-string");
        assert!(matches!(result, Err(PasswordError::InvalidHash)));
    }

    #[test]
    fn test_generate_salt() {
        let a = generate_salt();
        let b = generate_salt();
        assert_eq!(a.len(), SALT_BYTES * 2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_validate_password() {
        assert!(matches!(validate_password(""), Err(PasswordError::Empty)));
        assert!(matches!(
            validate_password(&"a".repeat(129)),
            Err(PasswordError::TooLong)
        ));
        assert!(validate_password("x").is_ok());
        assert!(validate_password(&"a".repeat(128)).is_ok());
    }

    #[test]
    fn test_scheme_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            scheme: PasswordScheme,
        }

        let w: Wrapper = toml::from_str("scheme = \"argon2id\"").unwrap();
        assert_eq!(w.scheme, PasswordScheme::Argon2id);
        let w: Wrapper = toml::from_str("scheme = \"sha256\"").unwrap();
        assert_eq!(w.scheme, PasswordScheme::Sha256);
    }
}
