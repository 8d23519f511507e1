/// Password reset token utilities
///
/// Reset tokens are handed to the user once and only their SHA-256 digest
/// is persisted on the user row, next to an expiry one hour out. A reset
/// succeeds only while the digest matches and the expiry has not passed;
/// a successful reset clears both, so a token can never be replayed.
///
/// # Format
///
/// 32 alphanumeric characters (base62: [A-Za-z0-9]) drawn from the OS RNG.
///
/// # Example
///
/// ```
/// use snackfund_shared::auth::reset_token::{generate_reset_token, verify_reset_token};
///
/// let (token, digest) = generate_reset_token();
/// assert_eq!(token.len(), 32);
/// assert!(verify_reset_token(&token, &digest));
/// assert!(!verify_reset_token("guess", &digest));
/// ```

use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use sha2::{Digest, Sha256};

/// Length of a reset token (characters)
pub const RESET_TOKEN_LENGTH: usize = 32;

/// How long a reset token stays valid
pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// Human-readable lifetime returned to clients
pub const RESET_TOKEN_TTL_LABEL: &str = "1 hour";

/// Generates a new reset token
///
/// # Returns
///
/// Tuple of (plaintext_token, sha256_hex_digest)
pub fn generate_reset_token() -> (String, String) {
    let token: String = OsRng
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LENGTH)
        .map(char::from)
        .collect();
    let digest = hash_reset_token(&token);

    (token, digest)
}

/// Hashes a reset token using SHA-256
///
/// Returns the hex-encoded digest (64 characters).
pub fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Expiry instant for a token issued at `issued_at`
pub fn reset_token_expiry(issued_at: DateTime<Utc>) -> DateTime<Utc> {
    issued_at + Duration::minutes(RESET_TOKEN_TTL_MINUTES)
}

/// Checks a presented token against a stored digest
///
/// Compares digests in constant time.
pub fn verify_reset_token(token: &str, stored_digest: &str) -> bool {
    constant_time_compare(&hash_reset_token(token), stored_digest)
}

/// Constant-time string comparison
///
/// Always walks the full length of both inputs once their lengths match,
/// accumulating differences without short-circuiting.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
