//! Salted password digests.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// A stored credential: random salt plus SHA-256 of `salt || password`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    salt: [u8; 16],
    digest: [u8; 32],
}

impl Credential {
    /// Derive a credential with a fresh random salt.
    pub fn new(password: &str) -> Self {
        let mut salt = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);
        Self::with_salt(password, salt)
    }

    fn with_salt(password: &str, salt: [u8; 16]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(password.as_bytes());
        Self {
            salt,
            digest: hasher.finalize().into(),
        }
    }

    /// Constant-time comparison against a candidate password.
    pub fn verify(&self, password: &str) -> bool {
        let candidate = Self::with_salt(password, self.salt);
        candidate
            .digest
            .iter()
            .zip(self.digest.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

// Never print digest material.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(..)")
    }
}

/// A fresh 32-byte session token, hex encoded.
pub fn session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
