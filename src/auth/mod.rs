//! Token authentication subsystem.
//!
//! # Data Flow
//! ```text
//! GET <route>/token:
//!     token.rs (build "<route>::<unix-seconds>")
//!     → codec.rs (AES-CFB encrypt, IV prefix, base64url)
//!     → opaque token string
//!
//! POST <route> with `token` header:
//!     codec.rs (base64url decode, split IV, AES-CFB decrypt)
//!     → token.rs (route match + freshness window)
//!     → bool (gate answers 412 on false)
//! ```
//!
//! # Design Decisions
//! - Tokens are stateless: validity is computed from the decrypted content and the clock
//! - Confidentiality only: there is no authentication tag, tampering garbles the plaintext
//! - Validation fails closed and never raises to the HTTP caller

pub mod codec;
pub mod token;

use thiserror::Error;

pub use codec::{decrypt, encrypt};
pub use token::{DefaultTokenProvider, TokenProvider, TokenRejection, DEFAULT_TOKEN_KEY};

/// Errors produced by the token codec.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The transport string is not valid URL-safe base64.
    #[error("token decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Cipher construction, key length, ciphertext length or randomness failure.
    #[error("token crypto error: {0}")]
    Crypto(String),
}
