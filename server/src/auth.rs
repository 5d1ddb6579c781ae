//! Shared-secret authentication of incoming requests

use serde_json::Value;
use subtle::ConstantTimeEq;

/// Field of the request document that carries the shared secret.
pub const AUTH_FIELD: &str = "auth_key";

/// Checks the shared secret before anything else touches a request.
#[derive(Clone)]
pub struct AuthGate {
    secret: String,
}

impl AuthGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// True only when `request` is an object whose `auth_key` is a string
    /// equal to the configured secret.
    pub fn verify(&self, request: &Value) -> bool {
        request
            .get(AUTH_FIELD)
            .and_then(Value::as_str)
            .is_some_and(|key| constant_time_eq(key.as_bytes(), self.secret.as_bytes()))
    }
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate").finish_non_exhaustive()
    }
}

/// Compares two byte strings without an early exit on the first mismatch
/// or on a length difference.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let len = a.len().max(b.len());

    // Different pad bytes so a length mismatch can never compare equal
    let mut a_padded = vec![0u8; len];
    let mut b_padded = vec![0xFFu8; len];
    a_padded[..a.len()].copy_from_slice(a);
    b_padded[..b.len()].copy_from_slice(b);

    let lengths_equal = a.len().ct_eq(&b.len());
    let contents_equal = a_padded.as_slice().ct_eq(b_padded.as_slice());
    (lengths_equal & contents_equal).into()
}
