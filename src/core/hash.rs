//! State Hashing for Verification
//!
//! Provides deterministic hashing of session state for:
//! - Save/restore integrity checks
//! - Seeded replay validation

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for session state.
///
/// Wraps SHA-256 with little-endian helpers.
/// Order of updates is critical for determinism.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for session state.
    pub fn for_session_state() -> Self {
        Self::new(b"NEZHA_2048_STATE_V1")
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Compute state hash for a session.
///
/// Called by `GameSession::compute_hash()`.
/// The closure adds the session-specific data.
pub fn compute_state_hash<F>(moves: u32, rng_seed: u64, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_session_state();

    // Always hash move counter and seed first
    hasher.update_u32(moves);
    hasher.update_u64(rng_seed);

    add_state(&mut hasher);

    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_determinism() {
        let a = compute_state_hash(3, 42, |h| h.update_u32(2048));
        let b = compute_state_hash(3, 42, |h| h.update_u32(2048));
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_sensitive_to_order() {
        let a = compute_state_hash(0, 0, |h| {
            h.update_u32(2);
            h.update_u32(4);
        });
        let b = compute_state_hash(0, 0, |h| {
            h.update_u32(4);
            h.update_u32(2);
        });
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_includes_header() {
        let a = compute_state_hash(1, 42, |_| {});
        let b = compute_state_hash(2, 42, |_| {});
        let c = compute_state_hash(1, 43, |_| {});
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
