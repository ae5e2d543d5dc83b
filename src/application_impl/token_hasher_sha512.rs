use crate::application_port::*;
use crate::domain_model::*;
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

/// SHA-512 verifier. A fresh digest per call, so the hasher is freely shared
/// across tasks. No salt: the input is a high-entropy signed token.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha512TokenHasher;

impl TokenHasher for Sha512TokenHasher {
    fn verifier(&self, token: &RefreshToken) -> Verifier {
        Verifier(Sha512::digest(token.0.as_bytes()).as_slice().to_vec())
    }

    fn matches(&self, stored: &Verifier, candidate: &RefreshToken) -> bool {
        let computed = self.verifier(candidate);
        computed.as_bytes().ct_eq(stored.as_bytes()).into()
    }
}
