//! # Digest de Passwords
//! src/jobs/digest.rs
//!
//! SHA-512 del secreto codificado en base64 estándar (con padding).

use base64::prelude::BASE64_STANDARD;
use base64::Engine as _;
use sha2::{Digest, Sha512};

/// Calcula `base64(sha512(secret))`
///
/// # Ejemplo
/// ```
/// use hash_server::jobs::digest::hash_password;
///
/// assert_eq!(hash_password("angryMonkey").len(), 88);
/// ```
pub fn hash_password(secret: impl AsRef<[u8]>) -> String {
    BASE64_STANDARD.encode(Sha512::digest(secret.as_ref()))
}
