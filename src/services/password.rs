//! One-way password hashing.
//!
//! Argon2 is CPU-intensive, so both hashing and verification run on the
//! blocking pool instead of the async runtime.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use thiserror::Error;
use tokio::task;

use crate::config::SecurityConfig;
use crate::domain::PlaintextPassword;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("Invalid Argon2 params: {0}")]
    Params(String),

    #[error("Failed to hash password: {0}")]
    Hash(String),

    #[error("Invalid password hash format: {0}")]
    Format(String),

    #[error("Password hashing task panicked: {0}")]
    Join(#[from] task::JoinError),
}

#[async_trait]
pub trait CredentialHasher: Send + Sync {
    /// Produces a salted PHC-format hash of `password`.
    async fn hash(&self, password: &PlaintextPassword) -> Result<String, HashError>;

    /// Checks `password` against a hash produced by [`CredentialHasher::hash`].
    async fn verify(&self, password: &PlaintextPassword, hash: &str) -> Result<bool, HashError>;
}

/// Argon2id with parameters taken from [`SecurityConfig`].
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// # Errors
    ///
    /// Returns [`HashError::Params`] if Argon2 rejects the configured costs.
    pub fn new(config: &SecurityConfig) -> Result<Self, HashError> {
        let params = Params::new(
            config.argon2_memory_cost_kib,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None, // output length (use default)
        )
        .map_err(|e| HashError::Params(e.to_string()))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

#[async_trait]
impl CredentialHasher for Argon2Hasher {
    async fn hash(&self, password: &PlaintextPassword) -> Result<String, HashError> {
        let argon2 = self.argon2();
        let password = password.clone();

        task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(password.expose().as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| HashError::Hash(e.to_string()))
        })
        .await?
    }

    async fn verify(&self, password: &PlaintextPassword, hash: &str) -> Result<bool, HashError> {
        // Parameters are read back from the PHC string, so hashes written
        // under older settings still verify.
        let argon2 = Argon2::default();
        let password = password.clone();
        let hash = hash.to_string();

        task::spawn_blocking(move || {
            let parsed_hash =
                PasswordHash::new(&hash).map_err(|e| HashError::Format(e.to_string()))?;
            Ok(argon2
                .verify_password(password.expose().as_bytes(), &parsed_hash)
                .is_ok())
        })
        .await?
    }
}
