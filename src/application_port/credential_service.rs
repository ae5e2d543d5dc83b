use crate::domain_model::*;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Classified outcome of a failed credential operation.
///
/// `InvalidToken` deliberately covers every refresh rejection (bad signature,
/// expiry, unknown principal, verifier mismatch, incoherent pair, lost
/// rotation race) so callers cannot tell a wrong token from a stale one.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("invalid identity")]
    InvalidIdentity,
    #[error("token invalid")]
    InvalidToken,
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    /// Issuance lost a write race on the principal's record. The store is
    /// healthy and the caller may retry.
    #[error("concurrent issuance for {0}")]
    Contended(PrincipalId),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Caller-supplied bound for every store call made on behalf of one request.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub timeout: Duration,
    pub cancel: CancellationToken,
}

impl CallContext {
    pub fn new(timeout: Duration, cancel: CancellationToken) -> Self {
        Self { timeout, cancel }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(timeout, CancellationToken::new())
    }

    /// Drives `fut` until it completes, the timeout elapses, or the context is
    /// cancelled. The last two abort the call and surface `StoreUnavailable`.
    pub async fn bound<T, E, F>(&self, fut: F) -> Result<T, CredentialError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<CredentialError>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                Err(CredentialError::StoreUnavailable("call cancelled".to_string()))
            }
            res = tokio::time::timeout(self.timeout, fut) => match res {
                Ok(inner) => inner.map_err(Into::into),
                Err(_) => Err(CredentialError::StoreUnavailable(format!(
                    "store call timed out after {:?}",
                    self.timeout
                ))),
            },
        }
    }
}

/// Mints and validates signed token pairs. Pure computation, no I/O.
pub trait TokenCodec: Send + Sync {
    fn issue(&self, principal_id: PrincipalId) -> Result<TokenPair, CredentialError>;

    /// Signature, algorithm, kind and expiry check of a refresh token.
    fn validate_refresh(&self, token: &RefreshToken) -> Option<PrincipalId>;

    /// Signature, algorithm, kind and expiry check of an access token.
    fn validate_access(&self, token: &AccessToken) -> Option<PrincipalId>;

    /// True iff both tokens carry valid signatures and the same coherence
    /// marker. Access-token expiry is ignored.
    fn validate_coherence(&self, access: &AccessToken, refresh: &RefreshToken) -> bool;
}

/// Turns a refresh token into its persisted verifier.
pub trait TokenHasher: Send + Sync {
    fn verifier(&self, token: &RefreshToken) -> Verifier;

    fn matches(&self, stored: &Verifier, candidate: &RefreshToken) -> bool;
}

#[async_trait::async_trait]
pub trait CredentialService: Send + Sync {
    /// Issues a fresh pair for `principal_id`, invalidating any refresh token
    /// previously issued to it.
    async fn issue(&self, ctx: &CallContext, principal_id: &str)
    -> Result<TokenPair, CredentialError>;

    /// Rotates a pair: the presented refresh token must be the current one for
    /// its principal and must have been minted together with `access_token`.
    async fn refresh(
        &self,
        ctx: &CallContext,
        refresh_token: &str,
        access_token: &str,
    ) -> Result<TokenPair, CredentialError>;

    async fn authenticate(&self, access_token: &str) -> Result<PrincipalId, CredentialError>;
}
