//! Credential hashing
//!
//! bcrypt is CPU-bound, so both directions run on the blocking pool.

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Password hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash(&self, password: &str) -> Result<String, CredentialError>;

    /// `Ok(false)` for a wrong password; `Err` only when the digest is unusable.
    async fn verify(&self, password: &str, digest: &str) -> Result<bool, CredentialError>;

    /// Spend the cost of a verification when there is no digest to check.
    async fn verify_decoy(&self, password: &str) -> Result<(), CredentialError> {
        self.hash(password).await.map(|_| ())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Bcrypt {
    cost: u32,
}

impl Bcrypt {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for Bcrypt {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

#[async_trait]
impl CredentialHasher for Bcrypt {
    async fn hash(&self, password: &str) -> Result<String, CredentialError> {
        let password = password.to_owned();
        let cost = self.cost;
        let digest = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
        Ok(digest)
    }

    async fn verify(&self, password: &str, digest: &str) -> Result<bool, CredentialError> {
        let password = password.to_owned();
        let digest = digest.to_owned();
        let matches =
            tokio::task::spawn_blocking(move || bcrypt::verify(password, &digest)).await??;
        Ok(matches)
    }
}
