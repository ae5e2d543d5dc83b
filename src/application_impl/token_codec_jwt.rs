use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const MIN_SIGNING_KEY_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub signing_key: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    sub: String, // principal id
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
    typ: TokenKind,
    // shared by the access and refresh token of one issuance
    #[serde(default)]
    coh: Option<String>,
}

/// HS512 JWT codec. Keys and validation rules are built once; every call is
/// otherwise stateless.
pub struct JwtHs512Codec {
    cfg: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    strict: Validation,
    ignore_expiry: Validation,
}

impl JwtHs512Codec {
    pub fn new(cfg: JwtConfig) -> anyhow::Result<Self> {
        if cfg.signing_key.len() < MIN_SIGNING_KEY_LEN {
            return Err(anyhow::anyhow!(
                "signing key must be at least {} bytes",
                MIN_SIGNING_KEY_LEN
            ));
        }

        let mut strict = Validation::new(Algorithm::HS512);
        strict.validate_exp = true;
        strict.leeway = 0;
        strict.set_audience(&[cfg.audience.clone()]);
        strict.set_issuer(&[cfg.issuer.clone()]);

        let mut ignore_expiry = strict.clone();
        ignore_expiry.validate_exp = false;

        Ok(JwtHs512Codec {
            encoding_key: EncodingKey::from_secret(&cfg.signing_key),
            decoding_key: DecodingKey::from_secret(&cfg.signing_key),
            cfg,
            strict,
            ignore_expiry,
        })
    }

    #[inline]
    fn gen_coherence_marker() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn encode(
        &self,
        principal_id: PrincipalId,
        kind: TokenKind,
        coh: &str,
        iat_dt: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), CredentialError> {
        let ttl = match kind {
            TokenKind::Access => self.cfg.access_ttl,
            TokenKind::Refresh => self.cfg.refresh_ttl,
        };
        let exp_dt = iat_dt + ttl;
        let claims = TokenClaims {
            sub: principal_id.to_string(),
            exp: exp_dt.timestamp(),
            iat: iat_dt.timestamp(),
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
            typ: kind,
            coh: Some(coh.to_string()),
        };
        let token = encode(&Header::new(Algorithm::HS512), &claims, &self.encoding_key)
            .map_err(|e| CredentialError::Internal(e.to_string()))?;
        Ok((token, exp_dt))
    }

    fn parse(&self, token: &str, kind: TokenKind, validation: &Validation) -> Option<TokenClaims> {
        let claims = decode::<TokenClaims>(token, &self.decoding_key, validation)
            .ok()?
            .claims;
        (claims.typ == kind).then_some(claims)
    }

    #[inline]
    fn parse_principal_id(sub: &str) -> Option<PrincipalId> {
        sub.parse::<PrincipalId>().ok()
    }
}

impl TokenCodec for JwtHs512Codec {
    fn issue(&self, principal_id: PrincipalId) -> Result<TokenPair, CredentialError> {
        let iat_dt = Utc::now();
        let coh = Self::gen_coherence_marker();
        let (access, access_exp) = self.encode(principal_id, TokenKind::Access, &coh, iat_dt)?;
        let (refresh, refresh_exp) = self.encode(principal_id, TokenKind::Refresh, &coh, iat_dt)?;
        Ok(TokenPair {
            access_token: AccessToken(access),
            refresh_token: RefreshToken(refresh),
            access_token_expires_at: access_exp,
            refresh_token_expires_at: refresh_exp,
        })
    }

    fn validate_refresh(&self, token: &RefreshToken) -> Option<PrincipalId> {
        let claims = self.parse(&token.0, TokenKind::Refresh, &self.strict)?;
        Self::parse_principal_id(&claims.sub)
    }

    fn validate_access(&self, token: &AccessToken) -> Option<PrincipalId> {
        let claims = self.parse(&token.0, TokenKind::Access, &self.strict)?;
        Self::parse_principal_id(&claims.sub)
    }

    fn validate_coherence(&self, access: &AccessToken, refresh: &RefreshToken) -> bool {
        let Some(access) = self.parse(&access.0, TokenKind::Access, &self.ignore_expiry) else {
            return false;
        };
        let Some(refresh) = self.parse(&refresh.0, TokenKind::Refresh, &self.ignore_expiry) else {
            return false;
        };
        match (access.coh, refresh.coh) {
            (Some(a), Some(r)) => a == r && access.sub == refresh.sub,
            _ => false,
        }
    }
}
