//! Password hashing utilities

use bcrypt::{hash, verify};

#[cfg(not(test))]
const HASH_COST: u32 = bcrypt::DEFAULT_COST;
// Minimum bcrypt cost keeps the test suite fast.
#[cfg(test)]
const HASH_COST: u32 = 4;

/// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password, HASH_COST)
}

/// Verify a password against a hash. A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "secure_password_123";
        let hashed = hash_password(password).unwrap();

        assert_ne!(hashed, password);
        assert!(verify_password(password, &hashed));
        assert!(!verify_password("wrong_password", &hashed));
    }

    #[test]
    fn test_malformed_hash_is_a_mismatch() {
        assert!(!verify_password("secret", "not-a-bcrypt-hash"));
    }
}
