use uuid::Uuid;

/// Produces the one-time token bound into every embed signature.
pub trait NonceSource: Send + Sync {
    fn nonce(&self) -> String;
}

/// Random v4 UUID rendered as 32 lowercase hex characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNonce;

impl NonceSource for RandomNonce {
    fn nonce(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Always returns the same nonce, for pinning golden signatures in tests.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone)]
pub struct FixedNonce(pub String);

#[cfg(any(test, feature = "test-utils"))]
impl NonceSource for FixedNonce {
    fn nonce(&self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_nonce_is_32_hex_chars() {
        let nonce = RandomNonce.nonce();
        assert_eq!(nonce.len(), 32);
        assert!(nonce
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn random_nonces_differ() {
        assert_ne!(RandomNonce.nonce(), RandomNonce.nonce());
    }
}
