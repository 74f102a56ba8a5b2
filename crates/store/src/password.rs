// Password hashing and session tokens

use base64::Engine;
use rand::RngCore;

use crate::error::StoreError;

/// bcrypt work factor for stored passwords.
pub(crate) const HASH_COST: u32 = 10;

const TOKEN_LEN: usize = 32;

/// Opaque bearer token, URL-safe so it can travel in headers and env vars.
pub(crate) fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Modular-crypt bcrypt string; the salt travels inside it.
pub(crate) fn hash(password: &str) -> Result<String, StoreError> {
    bcrypt::hash(password, HASH_COST).map_err(|e| StoreError::PasswordHash(e.to_string()))
}

/// False for a wrong password and for a stored value that is not a bcrypt hash.
pub(crate) fn verify(password: &str, stored: &str) -> bool {
    match bcrypt::verify(password, stored) {
        Ok(ok) => ok,
        Err(e) => {
            log::warn!("unreadable password hash: {}", e);
            false
        }
    }
}
