mod principal;
mod token;
mod verifier;

pub use principal::*;
pub use token::*;
pub use verifier::*;
