// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! HMAC-SHA1 challenge/response, the symmetric two-phase handshake described
//! in the wire protocol: each side sends a nonce, each side proves it knows
//! the shared secret by MAC-ing the nonce it was sent.

use hmac::{Hmac, Mac};
use rand::Rng;
use sha1::Sha1;
use thiserror::Error;

type HmacSha1 = Hmac<Sha1>;

const NONCE_LEN: usize = 20;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authentication mismatch")]
    Mismatch,
    #[error("malformed challenge or response")]
    Malformed,
}

/// Generates a fresh hex-encoded nonce to send as a `challenge` argument.
pub fn generate_nonce_hex() -> String {
    let mut nonce = [0u8; NONCE_LEN];
    rand::rng().fill(&mut nonce);
    hex::encode(nonce)
}

/// Computes the hex-encoded MAC to send as an `auth` argument in response to
/// a peer's challenge nonce.
pub fn compute_mac_hex(secret: &[u8], nonce_hex: &str) -> Result<String, AuthError> {
    let nonce = hex::decode(nonce_hex).map_err(|_| AuthError::Malformed)?;
    // HMAC accepts keys of any length; this can never fail.
    #[allow(clippy::unwrap_used)]
    let mut mac = HmacSha1::new_from_slice(secret).unwrap();
    mac.update(&nonce);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies a peer's `auth` response against the nonce we sent it, in
/// constant time.
pub fn verify_mac_hex(secret: &[u8], nonce_hex: &str, candidate_hex: &str) -> Result<(), AuthError> {
    let nonce = hex::decode(nonce_hex).map_err(|_| AuthError::Malformed)?;
    let candidate = hex::decode(candidate_hex).map_err(|_| AuthError::Malformed)?;
    #[allow(clippy::unwrap_used)]
    let mut mac = HmacSha1::new_from_slice(secret).unwrap();
    mac.update(&nonce);
    mac.verify_slice(&candidate).map_err(|_| AuthError::Mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_secret_verifies() {
        let secret = b"hunter2";
        let nonce = generate_nonce_hex();
        let mac = compute_mac_hex(secret, &nonce).unwrap();
        assert!(verify_mac_hex(secret, &nonce, &mac).is_ok());
    }

    #[test]
    fn wrong_secret_fails() {
        let nonce = generate_nonce_hex();
        let mac = compute_mac_hex(b"hunter2", &nonce).unwrap();
        assert!(matches!(
            verify_mac_hex(b"wrong", &nonce, &mac),
            Err(AuthError::Mismatch)
        ));
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert!(matches!(
            verify_mac_hex(b"s", "not-hex", "also-not-hex"),
            Err(AuthError::Malformed)
        ));
    }
}
