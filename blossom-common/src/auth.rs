//! API key and password handling
//!
//! # Architecture
//!
//! - API keys are 40 random alphanumeric characters, presented as
//!   `Authorization: Api-Key <key>`
//! - Only the SHA-256 hex digest of a key is stored; the plaintext is shown once
//! - Passwords are stored as `sha256$<iterations>$<salt>$<hex digest>`, the
//!   digest being SHA-256 over the salt and password, re-hashed `iterations` times
//!
//! # Pure Functions
//!
//! This module contains ONLY pure functions. Database lookups live in
//! [`crate::db::api_keys`]; HTTP extraction lives in each service.

use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Length of a generated API key
pub const API_KEY_LENGTH: usize = 40;

/// Authorization scheme name for API keys
pub const API_KEY_SCHEME: &str = "Api-Key";

const SALT_LENGTH: usize = 16;

/// Scheme tag at the start of a stored password hash
pub const PASSWORD_SCHEME: &str = "sha256";

/// Digest rounds for newly hashed passwords
pub const PASSWORD_ITERATIONS: u32 = 100_000;

/// Generate a new random API key
pub fn generate_api_key() -> String {
    random_alphanumeric(API_KEY_LENGTH)
}

/// SHA-256 hex digest of an API key, as stored in the database
pub fn hash_api_key(key: &str) -> String {
    sha256_hex(key.as_bytes())
}

/// Extract the key from an `Authorization` header value.
///
/// The scheme name is matched case-insensitively. Returns `None` for any other
/// scheme or an empty key.
///
/// # Examples
///
/// ```
/// use blossom_common::auth::parse_authorization_header;
///
/// assert_eq!(parse_authorization_header("Api-Key abc123"), Some("abc123"));
/// assert_eq!(parse_authorization_header("Bearer abc123"), None);
/// ```
pub fn parse_authorization_header(value: &str) -> Option<&str> {
    let (scheme, key) = value.trim().split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case(API_KEY_SCHEME) {
        return None;
    }
    let key = key.trim();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> String {
    let salt = random_alphanumeric(SALT_LENGTH);
    format!(
        "{}${}${}${}",
        PASSWORD_SCHEME,
        PASSWORD_ITERATIONS,
        salt,
        stretched_digest(&salt, password, PASSWORD_ITERATIONS)
    )
}

/// Check a password against a stored hash.
///
/// The iteration count is read from the stored value, so hashes made with an
/// older count keep verifying. Unknown schemes and malformed values never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(4, '$');
    let (Some(scheme), Some(iterations), Some(salt), Some(digest)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if scheme != PASSWORD_SCHEME {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    if iterations == 0 {
        return false;
    }

    let computed = stretched_digest(salt, password, iterations);
    computed.as_bytes().ct_eq(digest.as_bytes()).into()
}

fn stretched_digest(salt: &str, password: &str, iterations: u32) -> String {
    let mut digest = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();
    for _ in 1..iterations {
        digest = Sha256::new()
            .chain_update(digest)
            .chain_update(password.as_bytes())
            .finalize();
    }
    format!("{:x}", digest)
}

fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

fn random_alphanumeric(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
