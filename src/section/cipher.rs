//! Section payload decryption.
//!
//! Section bodies are AES-256-CBC ciphertext with PKCS#7 padding under a
//! key and IV shared by every client install. [`AesSectionCipher`] chains
//! the `aes` block primitive by hand; the pipeline only sees the
//! [`SectionDecryptor`] trait.

use aes::Aes256;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use thiserror::Error;

/// AES block size in bytes.
pub const BLOCK_LEN: usize = 16;

/// Key shipped with the client.
const CLIENT_KEY: [u8; 32] = [
    0xe8, 0x96, 0x9a, 0xd2, 0xa5, 0x40, 0x25, 0x9b, 0x97, 0x91, 0x90, 0x8b, 0x88, 0xe6, 0xbf, 0x03,
    0x1e, 0x6d, 0x21, 0x95, 0x6e, 0xfa, 0xd6, 0x8a, 0x50, 0xdd, 0x55, 0xd6, 0x7a, 0xb0, 0x92, 0x4b,
];

/// IV shipped with the client.
const CLIENT_IV: [u8; BLOCK_LEN] = [
    0x2a, 0x4f, 0xf0, 0x8a, 0xc8, 0x0d, 0x63, 0x07, 0x00, 0x57, 0xc5, 0x95, 0x18, 0xc8, 0x32, 0x53,
];

/// Errors raised while decrypting a section payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecryptError {
    /// The ciphertext is empty or not a whole number of blocks.
    #[error("ciphertext length {len} is not a positive multiple of {BLOCK_LEN}")]
    InvalidLength {
        /// Length of the rejected ciphertext.
        len: usize,
    },

    /// The final block does not end in valid PKCS#7 padding.
    #[error("ciphertext has invalid padding")]
    InvalidPadding,
}

/// Decrypts a section body once its version tag has been stripped.
#[cfg_attr(test, mockall::automock)]
pub trait SectionDecryptor {
    /// Decrypt `payload` into plain section bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DecryptError`] if the payload is not valid ciphertext.
    fn decrypt(&self, payload: &[u8]) -> Result<Vec<u8>, DecryptError>;
}

/// AES-256-CBC with PKCS#7 padding.
#[derive(Clone)]
pub struct AesSectionCipher {
    key: [u8; 32],
    iv: [u8; BLOCK_LEN],
}

impl AesSectionCipher {
    /// Build a cipher from explicit key material.
    #[must_use]
    pub const fn new(key: [u8; 32], iv: [u8; BLOCK_LEN]) -> Self {
        Self { key, iv }
    }

    fn block_cipher(&self) -> Aes256 {
        Aes256::new(GenericArray::from_slice(&self.key))
    }

    /// Pad and encrypt `plain`.
    ///
    /// The inverse of [`SectionDecryptor::decrypt`]; used to produce
    /// section bodies the client can read.
    #[must_use]
    pub fn encrypt(&self, plain: &[u8]) -> Vec<u8> {
        let cipher = self.block_cipher();
        let pad = BLOCK_LEN - plain.len() % BLOCK_LEN;
        let mut buffer = plain.to_vec();
        buffer.resize(plain.len() + pad, u8::try_from(pad).unwrap_or(u8::MAX));

        let mut previous = self.iv;
        for chunk in buffer.chunks_exact_mut(BLOCK_LEN) {
            for (byte, prev) in chunk.iter_mut().zip(previous) {
                *byte ^= prev;
            }
            cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
            previous.copy_from_slice(chunk);
        }
        buffer
    }
}

impl Default for AesSectionCipher {
    fn default() -> Self {
        Self::new(CLIENT_KEY, CLIENT_IV)
    }
}

impl std::fmt::Debug for AesSectionCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesSectionCipher").finish_non_exhaustive()
    }
}

impl SectionDecryptor for AesSectionCipher {
    fn decrypt(&self, payload: &[u8]) -> Result<Vec<u8>, DecryptError> {
        if payload.is_empty() || payload.len() % BLOCK_LEN != 0 {
            return Err(DecryptError::InvalidLength { len: payload.len() });
        }
        let cipher = self.block_cipher();
        let mut buffer = payload.to_vec();
        let mut previous = self.iv;
        for chunk in buffer.chunks_exact_mut(BLOCK_LEN) {
            let mut current = [0_u8; BLOCK_LEN];
            current.copy_from_slice(chunk);
            cipher.decrypt_block(GenericArray::from_mut_slice(chunk));
            for (byte, prev) in chunk.iter_mut().zip(previous) {
                *byte ^= prev;
            }
            previous = current;
        }
        let plain_len = unpadded_len(&buffer)?;
        buffer.truncate(plain_len);
        Ok(buffer)
    }
}

fn unpadded_len(buffer: &[u8]) -> Result<usize, DecryptError> {
    let pad = usize::from(*buffer.last().ok_or(DecryptError::InvalidPadding)?);
    if pad == 0 || pad > BLOCK_LEN || pad > buffer.len() {
        return Err(DecryptError::InvalidPadding);
    }
    let plain_len = buffer.len() - pad;
    let tail = buffer.get(plain_len..).ok_or(DecryptError::InvalidPadding)?;
    if tail.iter().all(|byte| usize::from(*byte) == pad) {
        Ok(plain_len)
    } else {
        Err(DecryptError::InvalidPadding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn encrypt_then_decrypt_restores_plaintext() {
        let cipher = AesSectionCipher::default();
        let plain = b"\x01\x0bhello world\x00\x00";
        let sealed = cipher.encrypt(plain);
        assert_eq!(sealed.len() % BLOCK_LEN, 0);
        assert_ne!(&sealed[..plain.len().min(sealed.len())], plain);
        assert_eq!(cipher.decrypt(&sealed), Ok(plain.to_vec()));
    }

    #[test]
    fn aligned_plaintext_gains_a_full_padding_block() {
        let cipher = AesSectionCipher::default();
        let sealed = cipher.encrypt(&[7; BLOCK_LEN]);
        assert_eq!(sealed.len(), 2 * BLOCK_LEN);
    }

    #[test]
    fn empty_plaintext_round_trips() {
        let cipher = AesSectionCipher::default();
        let sealed = cipher.encrypt(&[]);
        assert_eq!(cipher.decrypt(&sealed), Ok(Vec::new()));
    }

    #[test]
    fn chaining_hides_repeated_blocks() {
        let cipher = AesSectionCipher::default();
        let sealed = cipher.encrypt(&[0; 2 * BLOCK_LEN]);
        assert_ne!(sealed[..BLOCK_LEN], sealed[BLOCK_LEN..2 * BLOCK_LEN]);
    }

    #[rstest]
    #[case(0)]
    #[case(15)]
    #[case(17)]
    fn rejects_unaligned_ciphertext(#[case] len: usize) {
        let cipher = AesSectionCipher::default();
        assert_eq!(
            cipher.decrypt(&vec![0; len]),
            Err(DecryptError::InvalidLength { len })
        );
    }

    #[test]
    fn wrong_key_fails_padding_check() {
        let sealed = AesSectionCipher::default().encrypt(b"settings payload");
        let other = AesSectionCipher::new([0x42; 32], [0; BLOCK_LEN]);
        // A wrong key yields random bytes; valid padding by chance is
        // possible, so only compare when the check passes.
        match other.decrypt(&sealed) {
            Err(err) => assert_eq!(err, DecryptError::InvalidPadding),
            Ok(plain) => assert_ne!(plain, b"settings payload"),
        }
    }

    #[test]
    fn debug_hides_key_material() {
        let rendered = format!("{:?}", AesSectionCipher::default());
        assert!(!rendered.contains("232"));
        assert!(rendered.starts_with("AesSectionCipher"));
    }
}
