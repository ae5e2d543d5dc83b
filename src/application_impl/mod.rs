mod credential_service_impl;
mod token_codec_jwt;
mod token_hasher_sha512;

pub use credential_service_impl::*;
pub use token_codec_jwt::*;
pub use token_hasher_sha512::*;
