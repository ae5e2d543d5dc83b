use std::fmt;

/// One-way digest of a refresh-token string; the only form in which a refresh
/// token is persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct Verifier(pub Vec<u8>);

impl Verifier {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        hex::decode(s).map(Verifier)
    }
}

impl fmt::Debug for Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Verifier({}..)", &hex[..hex.len().min(8)])
    }
}

/// Unit of persisted state: at most one per principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRecord {
    pub principal_id: super::PrincipalId,
    pub verifier: Verifier,
}
