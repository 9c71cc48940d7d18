// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! Custodial keypair generation.

use alloy::primitives::keccak256;
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::rand_core::OsRng;

/// A freshly generated custodial keypair.
pub struct GeneratedKeypair {
    /// 32-byte private scalar, hex encoded without a `0x` prefix.
    pub private_key_hex: String,
    /// EIP-55 style `0x…` address derived from the public key.
    pub address: String,
}

/// Generate a random secp256k1 keypair and derive its Ethereum address.
pub fn generate_keypair() -> GeneratedKeypair {
    let signing_key = SigningKey::random(&mut OsRng);
    let verifying_key = signing_key.verifying_key();

    let private_key_hex = hex_encode(&signing_key.to_bytes());

    // Uncompressed point is 65 bytes: 0x04 prefix + 64 bytes of x,y
    // coordinates. The address is the last 20 bytes of keccak256(x ‖ y).
    let public_key_uncompressed = verifying_key.to_encoded_point(false);
    let public_key_bytes = public_key_uncompressed.as_bytes();
    let hash = keccak256(&public_key_bytes[1..]);
    let address = format!("0x{}", hex_encode(&hash[12..]));

    GeneratedKeypair {
        private_key_hex,
        address,
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
