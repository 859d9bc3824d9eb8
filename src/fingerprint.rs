//! Ordering Fingerprint - identity of a canonical user ordering.
//!
//! The matrix file stores no id-to-position table, so a reader can only trust
//! its positions if it uses the ordering the writer used. The fingerprint is
//! written into the parameter annotation and checked on read.
//!
//! Algorithm: SHA256("ordering:" || len as u64 LE || id_0 LE || id_1 LE || ...),
//! first 8 bytes as 16 hex chars.

use sha2::{Digest, Sha256};

use crate::ratings::UserId;

pub const FINGERPRINT_LEN: usize = 16;

pub fn ordering_fingerprint(user_ids: &[UserId]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"ordering:");
    hasher.update((user_ids.len() as u64).to_le_bytes());
    for id in user_ids {
        hasher.update(id.to_le_bytes());
    }
    let digest = hasher.finalize();
    hex::encode(&digest[..FINGERPRINT_LEN / 2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        assert_eq!(ordering_fingerprint(&[3, 1, 2]), ordering_fingerprint(&[3, 1, 2]));
        assert_eq!(ordering_fingerprint(&[3, 1, 2]).len(), FINGERPRINT_LEN);
    }

    #[test]
    fn test_order_matters() {
        assert_ne!(ordering_fingerprint(&[1, 2]), ordering_fingerprint(&[2, 1]));
        assert_ne!(ordering_fingerprint(&[]), ordering_fingerprint(&[0]));
    }
}
