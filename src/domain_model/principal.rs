use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity a token pair is issued for. Clients generate it; the service only
/// checks that it is a well-formed GUID.
#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PrincipalId(pub uuid::Uuid);

impl PrincipalId {
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl std::str::FromStr for PrincipalId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(PrincipalId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_guid_forms() {
        let canonical = "6f1c2a52-1f3e-4d4b-9c1a-7d0b8f6e2a10";
        let id: PrincipalId = canonical.parse().unwrap();
        assert_eq!(id.to_string(), canonical);

        let braced: PrincipalId = "{6F1C2A52-1F3E-4D4B-9C1A-7D0B8F6E2A10}".parse().unwrap();
        assert_eq!(braced, id);
    }

    #[test]
    fn rejects_malformed() {
        assert!("not-a-guid".parse::<PrincipalId>().is_err());
        assert!("".parse::<PrincipalId>().is_err());
        assert!("6f1c2a52-1f3e-4d4b-9c1a".parse::<PrincipalId>().is_err());
    }

    #[test]
    fn rejects_surrounding_whitespace() {
        for padded in [
            " 6f1c2a52-1f3e-4d4b-9c1a-7d0b8f6e2a10",
            "6f1c2a52-1f3e-4d4b-9c1a-7d0b8f6e2a10\n",
            "\t6f1c2a52-1f3e-4d4b-9c1a-7d0b8f6e2a10 ",
        ] {
            assert!(padded.parse::<PrincipalId>().is_err(), "{padded:?}");
        }
    }
}
