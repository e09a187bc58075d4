//! Webhook signing secrets.

use rand::RngCore;

/// Prefix that marks a string as a webhook signing secret.
pub const SECRET_PREFIX: &str = "whsec_";

/// Random bytes behind each secret.
const SECRET_BYTES: usize = 32;

/// Characters of the secret (prefix included) kept in the hint.
const HINT_LEN: usize = 10;

/// Generate a fresh `whsec_`-prefixed secret from the OS-seeded CSPRNG.
#[must_use]
pub fn generate() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{SECRET_PREFIX}{}", hex::encode(bytes))
}

/// Short, non-sensitive rendering of a secret, e.g. `whsec_a1b2…`.
#[must_use]
pub fn hint(secret: &str) -> String {
    let visible: String = secret.chars().take(HINT_LEN).collect();
    format!("{visible}…")
}
