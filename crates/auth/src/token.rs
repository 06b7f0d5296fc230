//! Compact signed session tokens: `header.payload.signature`, each segment
//! base64url-encoded, the signature an HMAC over `header.payload`.

use chrono::Utc;
use serde_json::Value as JsonValue;
use tracing::instrument;

use storegate_core::{SessionId, UserId};

use crate::claims::{SessionClaims, TokenError, TokenHeader};
use crate::codec;
use crate::config::MIN_SESSION_TTL_SECS;
use crate::signer::Signer;

#[derive(Debug, Clone)]
pub struct TokenService {
    signer: Signer,
    leeway_secs: i64,
}

impl TokenService {
    pub fn new(signer: Signer, leeway_secs: i64) -> Self {
        Self {
            signer,
            leeway_secs: leeway_secs.max(0),
        }
    }

    pub fn issue(&self, subject: UserId, session_id: &SessionId, ttl_secs: i64) -> String {
        self.issue_at(subject, session_id, ttl_secs, Utc::now().timestamp())
    }

    /// Issue a token as of `now` (Unix seconds). The lifetime is never shorter
    /// than [`MIN_SESSION_TTL_SECS`].
    pub fn issue_at(&self, subject: UserId, session_id: &SessionId, ttl_secs: i64, now: i64) -> String {
        let claims = SessionClaims {
            sub: subject,
            sid: session_id.clone(),
            iat: now,
            exp: now.saturating_add(ttl_secs.max(MIN_SESSION_TTL_SECS)),
        };

        // Serializing these plain structs cannot fail.
        let header = serde_json::to_vec(&TokenHeader::hs256()).unwrap_or_default();
        let payload = serde_json::to_vec(&claims).unwrap_or_default();

        let signing_input = format!("{}.{}", codec::encode(header), codec::encode(payload));
        let signature = self.signer.sign(signing_input.as_bytes());
        format!("{signing_input}.{}", codec::encode(signature))
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify signature, structure and expiry as of `now` (Unix seconds).
    #[instrument(level = "trace", skip_all)]
    pub fn verify_at(&self, token: &str, now: i64) -> Result<SessionClaims, TokenError> {
        let parts: Vec<&str> = token.split('.').collect();
        let [enc_header, enc_payload, enc_signature] = parts.as_slice() else {
            return Err(TokenError::MalformedToken);
        };

        let signature = codec::decode_strict(enc_signature).map_err(|_| TokenError::BadSignature)?;
        let signing_input = format!("{enc_header}.{enc_payload}");
        if !self.signer.verify(signing_input.as_bytes(), &signature) {
            return Err(TokenError::BadSignature);
        }

        let payload_bytes = codec::decode(enc_payload)
            .map_err(|e| TokenError::MalformedPayload(e.to_string()))?;
        let payload: JsonValue = serde_json::from_slice(&payload_bytes)
            .map_err(|e| TokenError::MalformedPayload(e.to_string()))?;
        if !payload.is_object() {
            return Err(TokenError::MalformedPayload("payload is not an object".into()));
        }

        let exp = payload
            .get("exp")
            .and_then(JsonValue::as_i64)
            .ok_or(TokenError::MissingExpiry)?;
        if now > exp.saturating_add(self.leeway_secs) {
            return Err(TokenError::Expired);
        }

        let claims: SessionClaims = serde_json::from_value(payload)
            .map_err(|e| TokenError::MalformedPayload(e.to_string()))?;
        if claims.sid.as_str().is_empty() {
            return Err(TokenError::MalformedPayload("empty session id".into()));
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SigningSecret;
    use proptest::prelude::*;

    const NOW: i64 = 1_700_000_000;

    fn service() -> TokenService {
        let secret = SigningSecret::new(b"test-secret".to_vec()).unwrap();
        TokenService::new(Signer::new(secret), 10)
    }

    fn sid(s: &str) -> SessionId {
        s.parse().unwrap()
    }

    /// Re-sign an arbitrary payload with the test key.
    fn forge(svc: &TokenService, payload: &str) -> String {
        let input = format!(
            "{}.{}",
            codec::encode(br#"{"alg":"HS256","typ":"JWT"}"#),
            codec::encode(payload)
        );
        let sig = svc.signer.sign(input.as_bytes());
        format!("{input}.{}", codec::encode(sig))
    }

    #[test]
    fn issued_token_has_three_segments() {
        let token = service().issue_at(UserId::new(7), &sid("abc"), 3600, NOW);
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn short_ttl_is_raised_to_minimum() {
        let svc = service();
        let token = svc.issue_at(UserId::new(1), &sid("s"), 5, NOW);
        let claims = svc.verify_at(&token, NOW).unwrap();
        assert_eq!(claims.iat, NOW);
        assert_eq!(claims.exp, NOW + MIN_SESSION_TTL_SECS);
    }

    #[test]
    fn expiry_honours_leeway_boundary() {
        let svc = service();
        let token = svc.issue_at(UserId::new(1), &sid("s"), 120, NOW);
        let exp = NOW + 120;
        assert!(svc.verify_at(&token, exp + 10 - 1).is_ok());
        assert!(svc.verify_at(&token, exp + 10).is_ok());
        assert_eq!(svc.verify_at(&token, exp + 10 + 1), Err(TokenError::Expired));
    }

    #[test]
    fn wrong_segment_count_is_malformed() {
        let svc = service();
        assert_eq!(svc.verify_at("a.b", NOW), Err(TokenError::MalformedToken));
        assert_eq!(svc.verify_at("a.b.c.d", NOW), Err(TokenError::MalformedToken));
        assert_eq!(svc.verify_at("", NOW), Err(TokenError::MalformedToken));
    }

    #[test]
    fn token_from_other_key_is_rejected() {
        let other = TokenService::new(
            Signer::new(SigningSecret::new(b"other".to_vec()).unwrap()),
            10,
        );
        let token = other.issue_at(UserId::new(1), &sid("s"), 3600, NOW);
        assert_eq!(service().verify_at(&token, NOW), Err(TokenError::BadSignature));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let svc = service();
        let token = svc.issue_at(UserId::new(1), &sid("s"), 3600, NOW);
        let parts: Vec<&str> = token.split('.').collect();
        let evil = codec::encode(format!(r#"{{"sub":2,"sid":"s","iat":{NOW},"exp":{}}}"#, NOW + 3600));
        let tampered = format!("{}.{}.{}", parts[0], evil, parts[2]);
        assert_eq!(svc.verify_at(&tampered, NOW), Err(TokenError::BadSignature));
    }

    #[test]
    fn padded_signature_is_not_an_alternate_form() {
        let svc = service();
        let token = svc.issue_at(UserId::new(1), &sid("s"), 3600, NOW);
        assert!(svc.verify_at(&token, NOW).is_ok());
        for padding in ["=", "=="] {
            let padded = format!("{token}{padding}");
            assert_eq!(svc.verify_at(&padded, NOW), Err(TokenError::BadSignature));
        }
    }

    #[test]
    fn signed_garbage_payload_is_malformed() {
        let svc = service();
        let token = forge(&svc, "not json");
        assert!(matches!(svc.verify_at(&token, NOW), Err(TokenError::MalformedPayload(_))));
        let token = forge(&svc, "[1,2,3]");
        assert!(matches!(svc.verify_at(&token, NOW), Err(TokenError::MalformedPayload(_))));
    }

    #[test]
    fn missing_or_non_numeric_expiry() {
        let svc = service();
        let token = forge(&svc, r#"{"sub":1,"sid":"s","iat":0}"#);
        assert_eq!(svc.verify_at(&token, NOW), Err(TokenError::MissingExpiry));
        let token = forge(&svc, r#"{"sub":1,"sid":"s","iat":0,"exp":"never"}"#);
        assert_eq!(svc.verify_at(&token, NOW), Err(TokenError::MissingExpiry));
    }

    #[test]
    fn non_integer_subject_is_malformed() {
        let svc = service();
        let token = forge(&svc, &format!(r#"{{"sub":"alice","sid":"s","iat":0,"exp":{}}}"#, NOW + 60));
        assert!(matches!(svc.verify_at(&token, NOW), Err(TokenError::MalformedPayload(_))));
    }

    #[test]
    fn empty_session_id_is_malformed() {
        let svc = service();
        let token = forge(&svc, &format!(r#"{{"sub":1,"sid":"","iat":0,"exp":{}}}"#, NOW + 60));
        assert!(matches!(svc.verify_at(&token, NOW), Err(TokenError::MalformedPayload(_))));
    }

    proptest! {
        #[test]
        fn issue_then_verify_preserves_identity(
            subject in any::<i64>(),
            session in "[A-Za-z0-9-]{1,64}",
            ttl in -10_000i64..1_000_000i64,
        ) {
            let svc = service();
            let token = svc.issue_at(UserId::new(subject), &sid(&session), ttl, NOW);
            let claims = svc.verify_at(&token, NOW).unwrap();
            prop_assert_eq!(claims.sub, UserId::new(subject));
            prop_assert_eq!(claims.sid.as_str(), session.as_str());
            prop_assert!(claims.exp - claims.iat >= MIN_SESSION_TTL_SECS);
        }

        #[test]
        fn any_single_bit_flip_in_signature_is_rejected(bit in 0usize..(32 * 8)) {
            let svc = service();
            let token = svc.issue_at(UserId::new(3), &sid("s"), 3600, NOW);
            let (input, enc_sig) = token.rsplit_once('.').unwrap();
            let mut sig = codec::decode(enc_sig).unwrap();
            sig[bit / 8] ^= 1 << (bit % 8);
            let tampered = format!("{input}.{}", codec::encode(&sig));
            prop_assert_eq!(svc.verify_at(&tampered, NOW), Err(TokenError::BadSignature));
        }
    }
}
