// qnd Infrastructure - Credential Adapters
// Implements: CredentialHasher, TokenSigner

mod hasher;
mod token;

pub use hasher::BcryptHasher;
pub use token::HmacTokenSigner;
