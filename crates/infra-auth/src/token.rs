// HMAC-SHA256 TokenSigner
//
// Token format: "<principal id>.<expiry epoch secs>.<hex signature>"
// where the signature covers "<principal id>.<expiry>".

use hmac::{Hmac, Mac};
use qnd_core::domain::PrincipalId;
use qnd_core::error::{AppError, Result};
use qnd_core::port::{IssuedToken, TokenSigner};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub struct HmacTokenSigner {
    key: Vec<u8>,
    ttl_secs: i64,
}

impl HmacTokenSigner {
    pub fn new(key: impl Into<Vec<u8>>, ttl_secs: i64) -> Self {
        Self {
            key: key.into(),
            ttl_secs,
        }
    }

    fn sign(&self, payload: &str) -> Option<String> {
        // HMAC accepts keys of any length
        let mut mac = HmacSha256::new_from_slice(&self.key).ok()?;
        mac.update(payload.as_bytes());
        Some(hex::encode(mac.finalize().into_bytes()))
    }
}

impl TokenSigner for HmacTokenSigner {
    fn issue(&self, principal: PrincipalId, now_secs: i64) -> Result<IssuedToken> {
        let expires_at = now_secs + self.ttl_secs;
        let payload = format!("{}.{}", principal, expires_at);
        let signature = self
            .sign(&payload)
            .ok_or_else(|| AppError::Internal("Token signing key rejected".to_string()))?;

        Ok(IssuedToken {
            token: format!("{}.{}", payload, signature),
            duration: self.ttl_secs,
            expires_at,
        })
    }

    fn verify(&self, token: &str, now_secs: i64) -> Option<PrincipalId> {
        let (payload, signature) = token.rsplit_once('.')?;
        let (principal, expires_at) = payload.split_once('.')?;

        let principal: PrincipalId = principal.parse().ok()?;
        let expires_at: i64 = expires_at.parse().ok()?;

        let expected = self.sign(payload)?;
        if !bool::from(signature.as_bytes().ct_eq(expected.as_bytes())) {
            return None;
        }

        if now_secs >= expires_at {
            return None;
        }

        Some(principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn signer() -> HmacTokenSigner {
        HmacTokenSigner::new("test-secret", 600)
    }

    #[test]
    fn test_issue_and_verify() {
        let s = signer();
        let issued = s.issue(42, NOW).unwrap();

        assert_eq!(issued.duration, 600);
        assert_eq!(issued.expires_at, NOW + 600);
        assert_eq!(s.verify(&issued.token, NOW), Some(42));
        assert_eq!(s.verify(&issued.token, NOW + 599), Some(42));
    }

    #[test]
    fn test_expired_token_rejected() {
        let s = signer();
        let issued = s.issue(42, NOW).unwrap();

        assert_eq!(s.verify(&issued.token, NOW + 600), None);
    }

    #[test]
    fn test_tampered_token_rejected() {
        let s = signer();
        let issued = s.issue(42, NOW).unwrap();

        // Claim another principal with the original signature
        let forged = issued.token.replacen("42.", "43.", 1);
        assert_eq!(s.verify(&forged, NOW), None);

        // Extend expiry
        let signature = issued.token.rsplit_once('.').unwrap().1;
        let extended = format!("42.{}.{}", NOW + 100_000, signature);
        assert_eq!(s.verify(&extended, NOW), None);
    }

    #[test]
    fn test_other_key_rejected() {
        let issued = signer().issue(1, NOW).unwrap();
        let other = HmacTokenSigner::new("different-secret", 600);

        assert_eq!(other.verify(&issued.token, NOW), None);
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let s = signer();
        for token in ["", "abc", "1.2", "x.y.z", "1..", ".."] {
            assert_eq!(s.verify(token, NOW), None, "token {:?}", token);
        }
    }
}
