//! AES-CFB token codec.
//!
//! Wire format: `base64url(iv || ciphertext)` where `iv` is one AES block.

use aes::{Aes128, Aes192, Aes256};
use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use cfb_mode::{Decryptor, Encryptor};
use rand::rngs::OsRng;
use rand::RngCore;

use super::TokenError;

/// AES block size in bytes (also the IV length).
pub const BLOCK_SIZE: usize = 16;

/// Encrypt `plaintext` under `key` and return the transport string.
///
/// The key must be 16, 24 or 32 bytes long (AES-128/192/256).
pub fn encrypt(key: &[u8], plaintext: &str) -> Result<String, TokenError> {
    let mut buffer = vec![0u8; BLOCK_SIZE + plaintext.len()];
    let (iv, body) = buffer.split_at_mut(BLOCK_SIZE);

    OsRng
        .try_fill_bytes(iv)
        .map_err(|e| TokenError::Crypto(format!("randomness source failed: {e}")))?;
    body.copy_from_slice(plaintext.as_bytes());

    let invalid_length = |_| TokenError::Crypto(format!("invalid key length {}", key.len()));
    match key.len() {
        16 => Encryptor::<Aes128>::new_from_slices(key, iv).map_err(invalid_length)?.encrypt(body),
        24 => Encryptor::<Aes192>::new_from_slices(key, iv).map_err(invalid_length)?.encrypt(body),
        32 => Encryptor::<Aes256>::new_from_slices(key, iv).map_err(invalid_length)?.encrypt(body),
        n => return Err(TokenError::Crypto(format!("invalid key length {n}"))),
    }

    Ok(URL_SAFE.encode(&buffer))
}

/// Decrypt a transport string produced by [`encrypt`].
///
/// Without an authentication tag a modified ciphertext decrypts to garbage
/// rather than failing; invalid UTF-8 is replaced lossily.
pub fn decrypt(key: &[u8], transport: &str) -> Result<String, TokenError> {
    let mut buffer = URL_SAFE.decode(transport)?;

    if buffer.len() < BLOCK_SIZE {
        return Err(TokenError::Crypto(format!(
            "ciphertext of {} bytes is shorter than one block",
            buffer.len()
        )));
    }

    let (iv, body) = buffer.split_at_mut(BLOCK_SIZE);
    let invalid_length = |_| TokenError::Crypto(format!("invalid key length {}", key.len()));
    match key.len() {
        16 => Decryptor::<Aes128>::new_from_slices(key, iv).map_err(invalid_length)?.decrypt(body),
        24 => Decryptor::<Aes192>::new_from_slices(key, iv).map_err(invalid_length)?.decrypt(body),
        32 => Decryptor::<Aes256>::new_from_slices(key, iv).map_err(invalid_length)?.decrypt(body),
        n => return Err(TokenError::Crypto(format!("invalid key length {n}"))),
    }

    Ok(String::from_utf8_lossy(body).into_owned())
}

/// Returns true if `key` selects one of the supported AES variants.
pub fn is_valid_key_length(len: usize) -> bool {
    matches!(len, 16 | 24 | 32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_256: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn test_round_trip_all_key_sizes() {
        for key in [&KEY_256[..16], &KEY_256[..24], KEY_256] {
            let token = encrypt(key, "save::1700000000").unwrap();
            assert_eq!(decrypt(key, &token).unwrap(), "save::1700000000");
        }
    }

    #[test]
    fn test_round_trip_unaligned_utf8() {
        let plaintext = "héllo wörld ✓ hooks/github::1700000000";
        assert_ne!(plaintext.len() % BLOCK_SIZE, 0);

        for key in [&KEY_256[..16], &KEY_256[..24], KEY_256] {
            let token = encrypt(key, plaintext).unwrap();
            assert_eq!(URL_SAFE.decode(&token).unwrap().len(), BLOCK_SIZE + plaintext.len());
            assert_eq!(decrypt(key, &token).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_round_trip_empty_plaintext() {
        let token = encrypt(KEY_256, "").unwrap();
        assert_eq!(URL_SAFE.decode(&token).unwrap().len(), BLOCK_SIZE);
        assert_eq!(decrypt(KEY_256, &token).unwrap(), "");
    }

    #[test]
    fn test_fresh_iv_per_call() {
        let a = encrypt(KEY_256, "same").unwrap();
        let b = encrypt(KEY_256, "same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_key_length() {
        assert!(matches!(encrypt(b"short", "x"), Err(TokenError::Crypto(_))));
        let token = encrypt(KEY_256, "x").unwrap();
        assert!(matches!(decrypt(b"short", &token), Err(TokenError::Crypto(_))));
    }

    #[test]
    fn test_malformed_base64() {
        assert!(matches!(decrypt(KEY_256, "not base64 !!"), Err(TokenError::Decode(_))));
    }

    #[test]
    fn test_too_short_for_iv() {
        let short = URL_SAFE.encode([0u8; BLOCK_SIZE - 1]);
        assert!(matches!(decrypt(KEY_256, &short), Err(TokenError::Crypto(_))));
    }

    #[test]
    fn test_tampering_is_not_detected() {
        let token = encrypt(KEY_256, "save::1700000000").unwrap();
        let mut raw = URL_SAFE.decode(&token).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        let tampered = URL_SAFE.encode(&raw);

        let plaintext = decrypt(KEY_256, &tampered).unwrap();
        assert_ne!(plaintext, "save::1700000000");
    }

    #[test]
    fn test_wrong_key_garbles() {
        let token = encrypt(KEY_256, "save::1700000000").unwrap();
        let other = b"fedcba9876543210fedcba9876543210";
        assert_ne!(decrypt(other, &token).unwrap(), "save::1700000000");
    }
}
