//! Credential verification seam.

/// Compares a submitted password against the stored credential.
///
/// The store currently holds plaintext passwords, so the default
/// implementation is a plain equality check. Swapping in a hashing scheme
/// only requires a new implementor; no call sites change.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, raw: &str, stored: &str) -> bool;
}

pub struct PlaintextVerifier;

impl CredentialVerifier for PlaintextVerifier {
    fn verify(&self, raw: &str, stored: &str) -> bool {
        raw == stored
    }
}
