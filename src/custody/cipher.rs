// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! AEAD encryption for custodial key material at rest.
//!
//! Secrets are sealed with AES-256-GCM under a single service key loaded
//! from configuration. The wire format is `base64(nonce ‖ ciphertext ‖ tag)`
//! with a fresh random 96-bit nonce per seal.

use base64ct::{Base64, Encoding};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};

use super::CustodyError;

/// Seals and opens custodial secrets with a service-wide AEAD key.
pub struct KeyCipher {
    key: LessSafeKey,
    rng: SystemRandom,
}

impl KeyCipher {
    /// Build a cipher from a 64-hex-char (32 byte) key.
    pub fn from_hex(key_hex: &str) -> Result<Self, CustodyError> {
        let key_bytes = decode_hex(key_hex)?;
        if key_bytes.len() != 32 {
            return Err(CustodyError::Cipher(
                "encryption key must be 32 bytes".to_string(),
            ));
        }
        let unbound = UnboundKey::new(&AES_256_GCM, &key_bytes)
            .map_err(|_| CustodyError::Cipher("invalid AEAD key".to_string()))?;
        Ok(Self {
            key: LessSafeKey::new(unbound),
            rng: SystemRandom::new(),
        })
    }

    /// Encrypt a plaintext secret, returning the base64 envelope.
    pub fn seal(&self, plaintext: &[u8]) -> Result<String, CustodyError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| CustodyError::Cipher("nonce generation failed".to_string()))?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let mut in_out = plaintext.to_vec();
        self.key
            .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| CustodyError::Cipher("seal failed".to_string()))?;

        let mut envelope = Vec::with_capacity(NONCE_LEN + in_out.len());
        envelope.extend_from_slice(&nonce_bytes);
        envelope.extend_from_slice(&in_out);
        Ok(Base64::encode_string(&envelope))
    }

    /// Decrypt a base64 envelope produced by [`KeyCipher::seal`].
    pub fn open(&self, envelope: &str) -> Result<Vec<u8>, CustodyError> {
        let bytes = Base64::decode_vec(envelope)
            .map_err(|_| CustodyError::Cipher("invalid base64 envelope".to_string()))?;
        if bytes.len() < NONCE_LEN + AES_256_GCM.tag_len() {
            return Err(CustodyError::Cipher("envelope too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_LEN);
        let mut nonce_array = [0u8; NONCE_LEN];
        nonce_array.copy_from_slice(nonce_bytes);
        let nonce = Nonce::assume_unique_for_key(nonce_array);

        let mut in_out = ciphertext.to_vec();
        let plaintext = self
            .key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| CustodyError::Cipher("decryption failed".to_string()))?;
        Ok(plaintext.to_vec())
    }
}

fn decode_hex(hex: &str) -> Result<Vec<u8>, CustodyError> {
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    if hex.len() % 2 != 0 {
        return Err(CustodyError::Cipher("odd-length hex key".to_string()));
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| CustodyError::Cipher("invalid hex key".to_string()))
        })
        .collect()
}
