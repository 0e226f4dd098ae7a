use anyhow::anyhow;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

/// Derives an argon2 digest with a fresh random salt.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|digest| digest.to_string())
        .map_err(|e| anyhow!("password hashing failed: {e}"))
}

/// Checks a candidate password against a stored digest. A mismatch is
/// `Ok(false)`; only an unparseable digest is an error.
pub fn verify_password(plain: &str, digest: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(digest)
        .map_err(|e| anyhow!("stored password digest is malformed: {e}"))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_its_own_digest() {
        let digest = hash_password("open-sesame-42").expect("hash");
        assert!(verify_password("open-sesame-42", &digest).expect("verify"));
    }

    #[test]
    fn rejects_a_different_password() {
        let digest = hash_password("open-sesame-42").expect("hash");
        assert!(!verify_password("open-sesame-43", &digest).expect("verify"));
    }

    #[test]
    fn salts_make_digests_unique() {
        let a = hash_password("same-input").expect("hash");
        let b = hash_password("same-input").expect("hash");
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_digest_is_an_error() {
        assert!(verify_password("whatever", "$argon2$garbage").is_err());
    }
}
