//! Bearer-token check for the generation endpoint.

use axum::http::{HeaderMap, header};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Shared secret callers present as `Authorization: Bearer <token>`.
///
/// Only a MAC of the secret is kept. A presented token is MACed the same way
/// and compared with `verify_slice`, which takes the same time wherever the
/// two differ and whatever the presented length.
pub struct AccessToken {
    tag: Vec<u8>,
}

impl AccessToken {
    pub fn new(secret: &str) -> Self {
        Self {
            tag: keyed(secret.as_bytes()).finalize().into_bytes().to_vec(),
        }
    }

    pub fn verify(&self, presented: &str) -> bool {
        keyed(presented.as_bytes()).verify_slice(&self.tag).is_ok()
    }

    pub fn authorizes(&self, headers: &HeaderMap) -> bool {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|token| self.verify(token.trim()))
    }
}

fn keyed(message: &[u8]) -> HmacSha256 {
    let mut mac = <HmacSha256 as Mac>::new(&Default::default());
    mac.update(message);
    mac
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(authorization: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, authorization.parse().unwrap());
        headers
    }

    #[test]
    fn verifies_only_the_exact_secret() {
        let token = AccessToken::new("s3cret");

        assert!(token.verify("s3cret"));
        assert!(!token.verify("s3cre"));
        assert!(!token.verify("s3cret!"));
        assert!(!token.verify("S3CRET"));
        assert!(!token.verify(""));
    }

    #[test]
    fn keeps_no_plaintext_copy() {
        let token = AccessToken::new("s3cret");
        assert_eq!(token.tag.len(), 32);
        assert_ne!(token.tag.as_slice(), b"s3cret");
    }

    #[test]
    fn reads_bearer_header() {
        let token = AccessToken::new("s3cret");

        assert!(token.authorizes(&headers_with("Bearer s3cret")));
        assert!(token.authorizes(&headers_with("Bearer  s3cret ")));
        assert!(!token.authorizes(&headers_with("Basic s3cret")));
        assert!(!token.authorizes(&headers_with("s3cret")));
        assert!(!token.authorizes(&HeaderMap::new()));
    }
}
