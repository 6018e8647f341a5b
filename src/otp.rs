//! One-time code generation and verification.
//!
//! Payment confirmations are gated behind a 6-digit numeric code delivered
//! out-of-band. Only the SHA-256 digest of a code is ever persisted; the
//! plaintext exists in memory just long enough to be handed to the notifier.
//!
//! The digest is deliberately unsalted: the stored hash must be re-derivable
//! from a later user-submitted code so the two can be compared.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Number of digits in a verification code.
pub const CODE_LEN: usize = 6;

/// Generate a uniformly random 6-digit code.
///
/// Codes are drawn from [100000, 999999], so the leading digit is never
/// zero and every code renders as exactly six visible digits. The range is
/// sampled from the thread-local OS-seeded generator.
pub fn generate() -> String {
    generate_with(&mut rand::rng())
}

/// Range-sampling split out so tests can pass a seeded generator.
fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.random_range(100_000..=999_999u32).to_string()
}

/// Compute the hex-encoded SHA-256 digest of a code.
///
/// Deterministic: the same code always yields the same 64-character digest.
pub fn hash(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a submitted code against a stored digest.
///
/// Recomputes the digest and compares it to the stored one without
/// short-circuiting, so the comparison takes the same time whether the
/// mismatch is in the first byte or the last.
pub fn verify(code: &str, stored_hash: &str) -> bool {
    let computed = hash(code);
    if computed.len() != stored_hash.len() {
        return false;
    }
    computed
        .bytes()
        .zip(stored_hash.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
