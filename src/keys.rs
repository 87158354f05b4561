use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::error::{BridgeError, Result};

/// WireGuard key pair as base64 strings, the form tunnel configs use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub private_key: String,
    pub public_key: String,
}

/// Generate a fresh X25519 key pair.
#[must_use]
pub fn generate_key_pair() -> KeyPair {
    let secret = StaticSecret::random_from_rng(OsRng);
    let public = PublicKey::from(&secret);
    KeyPair {
        private_key: BASE64.encode(secret.to_bytes()),
        public_key: BASE64.encode(public.as_bytes()),
    }
}

/// Derive the base64 public key for a stored base64 private key.
pub fn public_key_from_base64(private_key_b64: &str) -> Result<String> {
    let bytes = BASE64
        .decode(private_key_b64)
        .map_err(|e| BridgeError::Key(format!("invalid private key base64: {e}")))?;
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|v: Vec<u8>| BridgeError::Key(format!("private key must be 32 bytes, got {}", v.len())))?;
    let secret = StaticSecret::from(bytes);
    Ok(BASE64.encode(PublicKey::from(&secret).as_bytes()))
}
