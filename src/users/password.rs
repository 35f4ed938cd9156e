//! Argon2id password hashes, peppered with the server secret.
//!
//! Stored form is the PHC string (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`),
//! so cost parameters travel with each hash.

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

use crate::error::{ServiceError, ServiceResult};

#[derive(Clone)]
pub struct PasswordHasher {
    secret: String,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}

impl PasswordHasher {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Hash `password` under a fresh random salt.
    pub fn hash(&self, password: &str) -> ServiceResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("hashing password: {e}")))?;
        Ok(hash.to_string())
    }

    /// Check `password` against a stored PHC string. Malformed stored values
    /// never verify.
    pub fn verify(&self, stored: &str, password: &str) -> ServiceResult<bool> {
        let Ok(parsed) = PasswordHash::new(stored) else {
            return Ok(false);
        };
        Ok(self
            .argon2()?
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    fn argon2(&self) -> ServiceResult<Argon2<'_>> {
        Argon2::new_with_secret(
            self.secret.as_bytes(),
            Algorithm::Argon2id,
            Version::V0x13,
            Params::default(),
        )
        .map_err(|e| ServiceError::Internal(anyhow::anyhow!("invalid password secret: {e}")))
    }
}
