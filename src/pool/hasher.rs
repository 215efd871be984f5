use crate::types::{Payload, PoolKey};
use sha2::{Digest, Sha256};

/// Content address of a payload: hex SHA-256 of its value bytes.
///
/// Two processes that produce the same values converge on one key, so the
/// candidate lands in a single pool entry instead of duplicating.
pub fn pool_key(payload: &Payload) -> PoolKey {
    let digest = Sha256::digest(payload.to_bytes());
    PoolKey::new(hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_payload_same_key() {
        let a = Payload::from_values(vec![1.0, 2.0, 3.0]);
        let b = Payload::from_values(vec![1.0, 2.0, 3.0]);
        assert_eq!(pool_key(&a), pool_key(&b));
        assert_eq!(pool_key(&a), pool_key(&a));
    }

    #[test]
    fn test_different_payload_different_key() {
        let a = Payload::from_values(vec![1.0, 2.0, 3.0]);
        let b = Payload::from_values(vec![1.0, 2.0, 3.5]);
        assert_ne!(pool_key(&a), pool_key(&b));
    }

    #[test]
    fn test_key_ignores_shape() {
        let flat = Payload::new(vec![4], vec![1.0, 2.0, 3.0, 4.0]);
        let square = Payload::new(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(pool_key(&flat), pool_key(&square));
    }

    #[test]
    fn test_key_is_hex_sha256() {
        let key = pool_key(&Payload::from_values(vec![0.0]));
        assert_eq!(key.as_str().len(), 64);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
