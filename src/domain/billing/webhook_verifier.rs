//! Provider webhook signature verification.
//!
//! The provider signs `timestamp ‖ callback URL ‖ raw body` with RSA
//! PKCS#1 v1.5 over SHA-256 and sends the signature as standard base64 in
//! `X-Signature`. The body is used byte-for-byte, never re-serialized.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use jsonwebtoken::{Algorithm, DecodingKey};

use super::webhook_errors::WebhookError;

/// Builds the exact byte sequence the provider signs.
pub fn canonical_payload(timestamp: &str, callback_url: &str, raw_body: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(timestamp.len() + callback_url.len() + raw_body.len());
    payload.extend_from_slice(timestamp.as_bytes());
    payload.extend_from_slice(callback_url.as_bytes());
    payload.extend_from_slice(raw_body);
    payload
}

/// Checks an RS256 signature over the canonical payload.
///
/// Returns `Ok(false)` for a well-formed signature that does not match.
///
/// # Errors
///
/// - `KeyError` - the public key PEM cannot be parsed
/// - `SignatureEncoding` - the signature is not valid base64
pub fn verify_signature(
    timestamp: &str,
    callback_url: &str,
    raw_body: &[u8],
    signature_b64: &str,
    public_key_pem: &str,
) -> Result<bool, WebhookError> {
    let key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
        .map_err(|e| WebhookError::KeyError(e.to_string()))?;

    let signature = STANDARD
        .decode(signature_b64.trim())
        .map_err(|e| WebhookError::SignatureEncoding(e.to_string()))?;

    // jsonwebtoken expects the JWS (URL-safe, unpadded) alphabet
    let signature = URL_SAFE_NO_PAD.encode(signature);
    let message = canonical_payload(timestamp, callback_url, raw_body);

    jsonwebtoken::crypto::verify(&signature, &message, &key, Algorithm::RS256)
        .map_err(|e| WebhookError::SignatureEncoding(e.to_string()))
}

/// Verifier bound to the configured callback URL and provider public key.
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    callback_url: String,
    public_key_pem: String,
}

impl WebhookVerifier {
    pub fn new(callback_url: impl Into<String>, public_key_pem: impl Into<String>) -> Self {
        Self {
            callback_url: callback_url.into(),
            public_key_pem: public_key_pem.into(),
        }
    }

    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    /// Authenticates a webhook request.
    ///
    /// Missing headers are rejected before any cryptographic work.
    pub fn authenticate(
        &self,
        signature: Option<&str>,
        timestamp: Option<&str>,
        raw_body: &[u8],
    ) -> Result<(), WebhookError> {
        let signature = signature
            .filter(|s| !s.trim().is_empty())
            .ok_or(WebhookError::MissingHeader("X-Signature"))?;
        let timestamp = timestamp
            .filter(|t| !t.is_empty())
            .ok_or(WebhookError::MissingHeader("X-Timestamp"))?;

        let valid = verify_signature(
            timestamp,
            &self.callback_url,
            raw_body,
            signature,
            &self.public_key_pem,
        )?;

        if valid {
            Ok(())
        } else {
            Err(WebhookError::InvalidSignature)
        }
    }
}

/// Signs a canonical payload the way the provider does, for test fixtures.
#[cfg(test)]
pub fn sign_test_payload(
    private_key_pem: &str,
    timestamp: &str,
    callback_url: &str,
    raw_body: &[u8],
) -> String {
    let key = jsonwebtoken::EncodingKey::from_rsa_pem(private_key_pem.as_bytes()).unwrap();
    let message = canonical_payload(timestamp, callback_url, raw_body);
    let signature = jsonwebtoken::crypto::sign(&message, &key, Algorithm::RS256).unwrap();
    STANDARD.encode(URL_SAFE_NO_PAD.decode(signature).unwrap())
}
