use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why a refresh was rejected. Logged only; callers always see
/// `CredentialError::InvalidToken`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RejectReason {
    Unverifiable,
    UnknownPrincipal,
    VerifierMismatch,
    Incoherent,
    RotationLost,
}

pub struct RealCredentialService {
    token_codec: Arc<dyn TokenCodec>,
    token_hasher: Arc<dyn TokenHasher>,
    record_store: Arc<dyn RefreshRecordStore>,
}

impl RealCredentialService {
    pub fn new(
        token_codec: Arc<dyn TokenCodec>,
        token_hasher: Arc<dyn TokenHasher>,
        record_store: Arc<dyn RefreshRecordStore>,
    ) -> Self {
        Self {
            token_codec,
            token_hasher,
            record_store,
        }
    }

    fn reject(principal_id: Option<PrincipalId>, reason: RejectReason) -> CredentialError {
        match principal_id {
            Some(principal_id) => warn!(%principal_id, ?reason, "refresh rejected"),
            None => warn!(?reason, "refresh rejected"),
        }
        CredentialError::InvalidToken
    }
}

#[async_trait::async_trait]
impl CredentialService for RealCredentialService {
    async fn issue(
        &self,
        ctx: &CallContext,
        principal_id: &str,
    ) -> Result<TokenPair, CredentialError> {
        let principal_id = principal_id.parse::<PrincipalId>().map_err(|e| {
            debug!(error = %e, "malformed principal id");
            CredentialError::InvalidIdentity
        })?;

        let pair = self.token_codec.issue(principal_id)?;
        let verifier = self.token_hasher.verifier(&pair.refresh_token);

        match ctx.bound(self.record_store.get(principal_id)).await? {
            None => {
                let record = RefreshRecord {
                    principal_id,
                    verifier,
                };
                // A concurrent first issuance surfaces as AlreadyExists, which
                // converts to Contended. No retry here.
                ctx.bound(self.record_store.insert(&record))
                    .await
                    .inspect_err(|e| {
                        if matches!(e, CredentialError::Contended(_)) {
                            debug!(%principal_id, "issuance lost the first-insert race");
                        }
                    })?;
            }
            Some(existing) => {
                // Re-issuance supersedes whatever refresh token is live.
                let outcome = ctx
                    .bound(self.record_store.compare_and_swap(
                        principal_id,
                        &existing.verifier,
                        &verifier,
                    ))
                    .await?;
                // Another issue or refresh wrote first; its pair stays live.
                if outcome == CasOutcome::PreconditionFailed {
                    debug!(%principal_id, "issuance lost the overwrite race");
                    return Err(CredentialError::Contended(principal_id));
                }
            }
        }

        info!(%principal_id, "token pair issued");
        Ok(pair)
    }

    async fn refresh(
        &self,
        ctx: &CallContext,
        refresh_token: &str,
        access_token: &str,
    ) -> Result<TokenPair, CredentialError> {
        let refresh_token = RefreshToken(refresh_token.to_string());
        let access_token = AccessToken(access_token.to_string());

        let principal_id = self
            .token_codec
            .validate_refresh(&refresh_token)
            .ok_or_else(|| Self::reject(None, RejectReason::Unverifiable))?;

        let record = ctx
            .bound(self.record_store.get(principal_id))
            .await?
            .ok_or_else(|| Self::reject(Some(principal_id), RejectReason::UnknownPrincipal))?;

        // A token rotated away (or superseded by re-issuance) no longer matches.
        if !self.token_hasher.matches(&record.verifier, &refresh_token) {
            return Err(Self::reject(Some(principal_id), RejectReason::VerifierMismatch));
        }

        if !self
            .token_codec
            .validate_coherence(&access_token, &refresh_token)
        {
            return Err(Self::reject(Some(principal_id), RejectReason::Incoherent));
        }

        let pair = self.token_codec.issue(principal_id)?;
        let new_verifier = self.token_hasher.verifier(&pair.refresh_token);

        match ctx
            .bound(self.record_store.compare_and_swap(
                principal_id,
                &record.verifier,
                &new_verifier,
            ))
            .await?
        {
            CasOutcome::Swapped => {
                info!(%principal_id, "token pair rotated");
                Ok(pair)
            }
            CasOutcome::PreconditionFailed => {
                Err(Self::reject(Some(principal_id), RejectReason::RotationLost))
            }
        }
    }

    async fn authenticate(&self, access_token: &str) -> Result<PrincipalId, CredentialError> {
        self.token_codec
            .validate_access(&AccessToken(access_token.to_string()))
            .ok_or(CredentialError::InvalidToken)
    }
}
