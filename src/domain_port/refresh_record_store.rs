use crate::application_port::CredentialError;
use crate::domain_model::*;

/// Result of a conditional verifier update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    Swapped,
    /// The stored verifier no longer equals the expected one, or the record
    /// is gone.
    PreconditionFailed,
}

#[derive(Debug, thiserror::Error)]
pub enum RecordStoreError {
    #[error("refresh record already exists for {0}")]
    AlreadyExists(PrincipalId),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("corrupt refresh record: {0}")]
    Corrupt(String),
}

impl From<RecordStoreError> for CredentialError {
    fn from(error: RecordStoreError) -> Self {
        match error {
            RecordStoreError::AlreadyExists(principal_id) => {
                CredentialError::Contended(principal_id)
            }
            other => CredentialError::StoreUnavailable(other.to_string()),
        }
    }
}

/// Holds at most one refresh-token verifier per principal.
///
/// Implementations must make `compare_and_swap` atomic with respect to every
/// other write on the same principal: rotation safety rests on it.
#[async_trait::async_trait]
pub trait RefreshRecordStore: Send + Sync {
    async fn get(&self, principal_id: PrincipalId)
    -> Result<Option<RefreshRecord>, RecordStoreError>;

    /// Creates the record. Fails with `AlreadyExists` if one is present.
    async fn insert(&self, record: &RefreshRecord) -> Result<(), RecordStoreError>;

    /// Replaces the verifier only if the stored one still equals `expected`.
    async fn compare_and_swap(
        &self,
        principal_id: PrincipalId,
        expected: &Verifier,
        new: &Verifier,
    ) -> Result<CasOutcome, RecordStoreError>;
}
