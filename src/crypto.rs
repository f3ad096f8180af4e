//! Symmetric encryption and id helpers
//!
//! AES in CTR mode with a 128-bit big-endian counter. The random IV is
//! prefixed to the ciphertext, so a sealed message is `IV || ciphertext`.

use crate::error::{Error, Result};
use aes::{Aes128, Aes192, Aes256};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use ctr::cipher::{KeyIvInit, StreamCipher};
use rand::RngCore;

/// AES block size; also the IV length
pub const BLOCK_SIZE: usize = 16;

type Aes128Ctr = ctr::Ctr128BE<Aes128>;
type Aes192Ctr = ctr::Ctr128BE<Aes192>;
type Aes256Ctr = ctr::Ctr128BE<Aes256>;

// ============================================================================
// AES-CTR
// ============================================================================

fn apply_keystream(key: &[u8], iv: &[u8], buf: &mut [u8]) -> Result<()> {
    let invalid = |e: ctr::cipher::InvalidLength| Error::crypto(e.to_string());
    match key.len() {
        16 => Aes128Ctr::new_from_slices(key, iv)
            .map_err(invalid)?
            .apply_keystream(buf),
        24 => Aes192Ctr::new_from_slices(key, iv)
            .map_err(invalid)?
            .apply_keystream(buf),
        32 => Aes256Ctr::new_from_slices(key, iv)
            .map_err(invalid)?
            .apply_keystream(buf),
        n => {
            return Err(Error::crypto(format!(
                "invalid AES key size {n}, expected 16, 24 or 32 bytes"
            )))
        }
    }
    Ok(())
}

/// Encrypt `plaintext`, returning `IV || ciphertext`
pub fn encrypt_aes(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let iv: [u8; BLOCK_SIZE] = rand::random();
    let mut out = Vec::with_capacity(BLOCK_SIZE + plaintext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(plaintext);
    apply_keystream(key, &iv, &mut out[BLOCK_SIZE..])?;
    Ok(out)
}

/// Decrypt `IV || ciphertext` produced by [`encrypt_aes`]
pub fn decrypt_aes(key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() < BLOCK_SIZE {
        return Err(Error::crypto(format!(
            "ciphertext too short: {} bytes",
            ciphertext.len()
        )));
    }
    let (iv, body) = ciphertext.split_at(BLOCK_SIZE);
    let mut out = body.to_vec();
    apply_keystream(key, iv, &mut out)?;
    Ok(out)
}

/// [`encrypt_aes`] with a base64 key, returning base64
pub fn encrypt_aes_encoded(key: &str, plaintext: &[u8]) -> Result<String> {
    let key = decode_base64(key)?;
    Ok(encode_base64(&encrypt_aes(&key, plaintext)?))
}

/// [`decrypt_aes`] with a base64 key and ciphertext
pub fn decrypt_aes_encoded(key: &str, ciphertext: &str) -> Result<Vec<u8>> {
    let key = decode_base64(key)?;
    decrypt_aes(&key, &decode_base64(ciphertext)?)
}

// ============================================================================
// Encoding
// ============================================================================

pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(data.trim())
        .map_err(|e| Error::crypto(format!("invalid base64: {e}")))
}

// ============================================================================
// Ids and keys
// ============================================================================

/// Time-sortable unique id (lowercase ULID, 26 chars)
pub fn rand_id() -> String {
    ulid::Ulid::new().to_string().to_lowercase()
}

/// Short URL-safe random id (8 chars)
pub fn short_id() -> String {
    let bytes: [u8; 6] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Random AES key of `size` bytes, base64 encoded
pub fn generate_key(size: usize) -> Result<String> {
    if !matches!(size, 16 | 24 | 32) {
        return Err(Error::crypto(format!(
            "invalid AES key size {size}, expected 16, 24 or 32 bytes"
        )));
    }
    let mut key = vec![0u8; size];
    rand::rng().fill_bytes(&mut key);
    Ok(encode_base64(&key))
}
