//! Credential hashing. Argon2id with the library's default cost; a fresh random salt per hash.

use argon2::{
    password_hash::{self, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, PasswordHash,
};
use once_cell::sync::Lazy;
use rand::rngs::OsRng;

/// Hash checked against when there is no stored hash to compare with.
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| hash_password("member-dummy-password").ok());

/// Hash `raw` into a self-describing PHC string.
pub fn hash_password(raw: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default().hash_password(raw.as_bytes(), &salt)?.to_string())
}

/// Check `raw` against a stored PHC string.
///
/// A mismatch is `Ok(false)`; only an unparseable hash is an error.
pub fn verify_password(raw: &str, hash: &str) -> Result<bool, password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(raw.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Spend the same argon2 work as [`verify_password`] without a stored hash, so a miss costs as
/// much as a wrong password.
pub fn verify_dummy(raw: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(raw, hash);
    }
}
