//! crates/alumni_quest_core/src/proof.rs
//!
//! Proof tokens shown as a barcode at the end of a connection quest.
//!
//! The plain [`ProofToken`] is `peer:prompt:response` with every field
//! percent-encoded, so it can be split back apart. [`ProofSigner`] adds a
//! server-issued envelope (nonce, expiry, HMAC) that a scanning party can have
//! verified.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub const TOKEN_DELIMITER: char = ':';

// Everything except the URI-component unreserved marks gets escaped.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const SIGNED_VERSION_V1: &str = "v1";
const MAX_SIGNED_TOKEN_LEN: usize = 2048;
const MAX_SIGNED_PAYLOAD_PART_LEN: usize = 1536;
const MAX_SIGNED_SIG_PART_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProofErrorCode {
    InvalidFormat,
    UnsupportedVersion,
    InvalidSignature,
    InvalidPayload,
    Expired,
    ResponseMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code:?}: {message}")]
pub struct ProofError {
    pub code: ProofErrorCode,
    pub message: String,
}

impl ProofError {
    #[must_use]
    pub fn new(code: ProofErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

//=========================================================================================
// Plain token
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofToken {
    pub peer_id: String,
    pub prompt_id: String,
    pub response: String,
}

impl ProofToken {
    pub fn new(
        peer_id: impl Into<String>,
        prompt_id: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Self {
            peer_id: peer_id.into(),
            prompt_id: prompt_id.into(),
            response: response.into(),
        }
    }

    pub fn encode(&self) -> String {
        format!(
            "{}{d}{}{d}{}",
            utf8_percent_encode(&self.peer_id, URI_COMPONENT),
            utf8_percent_encode(&self.prompt_id, URI_COMPONENT),
            utf8_percent_encode(&self.response, URI_COMPONENT),
            d = TOKEN_DELIMITER,
        )
    }

    pub fn decode(token: &str) -> Result<Self, ProofError> {
        let parts: Vec<&str> = token.split(TOKEN_DELIMITER).collect();
        let [peer, prompt, response] = parts.as_slice() else {
            return Err(ProofError::new(
                ProofErrorCode::InvalidFormat,
                format!("expected 3 fields, found {}", parts.len()),
            ));
        };
        Ok(Self {
            peer_id: decode_field(peer)?,
            prompt_id: decode_field(prompt)?,
            response: decode_field(response)?,
        })
    }
}

impl std::fmt::Display for ProofToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

fn decode_field(part: &str) -> Result<String, ProofError> {
    percent_decode_str(part)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| ProofError::new(ProofErrorCode::InvalidFormat, e.to_string()))
}

//=========================================================================================
// Signed envelope
//=========================================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignedProofPayload {
    pub version: String,
    pub peer_id: String,
    pub prompt_id: String,
    pub response_hash: String,
    pub nonce: Uuid,
    pub issued_by: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies `v1.<payload>.<sig>` envelopes.
#[derive(Clone)]
pub struct ProofSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl std::fmt::Debug for ProofSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProofSigner").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl ProofSigner {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    pub fn issue(
        &self,
        token: &ProofToken,
        issued_by: &str,
        now: DateTime<Utc>,
    ) -> Result<String, ProofError> {
        let payload = SignedProofPayload {
            version: SIGNED_VERSION_V1.to_string(),
            peer_id: token.peer_id.clone(),
            prompt_id: token.prompt_id.clone(),
            response_hash: hash_response(&token.response),
            nonce: Uuid::new_v4(),
            issued_by: issued_by.to_string(),
            issued_at: now,
            expires_at: now + self.ttl,
        };
        let payload_bytes = serde_json::to_vec(&payload)
            .map_err(|e| ProofError::new(ProofErrorCode::InvalidPayload, e.to_string()))?;
        let payload_part = URL_SAFE_NO_PAD.encode(payload_bytes);
        let sig_part = URL_SAFE_NO_PAD.encode(self.mac(&payload_part)?.finalize().into_bytes());
        Ok(format!("{}.{}.{}", SIGNED_VERSION_V1, payload_part, sig_part))
    }

    /// Checks signature and expiry, and the response hash when `response` is given.
    pub fn verify(
        &self,
        signed: &str,
        now: DateTime<Utc>,
        response: Option<&str>,
    ) -> Result<SignedProofPayload, ProofError> {
        if signed.len() > MAX_SIGNED_TOKEN_LEN {
            return Err(ProofError::new(ProofErrorCode::InvalidFormat, "proof exceeds max length"));
        }
        let mut parts = signed.splitn(3, '.');
        let (Some(version), Some(payload_part), Some(sig_part)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ProofError::new(ProofErrorCode::InvalidFormat, "proof must have three parts"));
        };
        if version != SIGNED_VERSION_V1 {
            return Err(ProofError::new(ProofErrorCode::UnsupportedVersion, "proof version unsupported"));
        }
        if payload_part.len() > MAX_SIGNED_PAYLOAD_PART_LEN || sig_part.len() > MAX_SIGNED_SIG_PART_LEN {
            return Err(ProofError::new(ProofErrorCode::InvalidFormat, "proof part exceeds max length"));
        }

        let expected = URL_SAFE_NO_PAD
            .decode(sig_part)
            .map_err(|e| ProofError::new(ProofErrorCode::InvalidFormat, e.to_string()))?;
        self.mac(payload_part)?
            .verify_slice(&expected)
            .map_err(|_| ProofError::new(ProofErrorCode::InvalidSignature, "proof signature mismatch"))?;

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(payload_part)
            .map_err(|e| ProofError::new(ProofErrorCode::InvalidFormat, e.to_string()))?;
        let payload: SignedProofPayload = serde_json::from_slice(&payload_bytes)
            .map_err(|e| ProofError::new(ProofErrorCode::InvalidPayload, e.to_string()))?;

        if payload.version != SIGNED_VERSION_V1 {
            return Err(ProofError::new(ProofErrorCode::UnsupportedVersion, "proof version unsupported"));
        }
        if now >= payload.expires_at {
            return Err(ProofError::new(ProofErrorCode::Expired, "proof has expired"));
        }
        if let Some(response) = response {
            if hash_response(response) != payload.response_hash {
                return Err(ProofError::new(
                    ProofErrorCode::ResponseMismatch,
                    "response does not match proof",
                ));
            }
        }
        Ok(payload)
    }

    fn mac(&self, payload_part: &str) -> Result<HmacSha256, ProofError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| ProofError::new(ProofErrorCode::InvalidPayload, e.to_string()))?;
        mac.update(payload_part.as_bytes());
        Ok(mac)
    }
}

fn hash_response(response: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(response.as_bytes()))
}
