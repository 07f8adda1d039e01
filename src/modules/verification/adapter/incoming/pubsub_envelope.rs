//! Pub/Sub push envelope decoding.
//!
//! Eventarc delivers Pub/Sub messages either in binary content mode (CloudEvent
//! attributes in `ce-*` headers, `MessagePublishedData` as the body) or in
//! structured mode (`application/cloudevents+json`, the same document under
//! `data`). Both are reduced to a [`VerificationRequest`] here so the use case
//! never depends on transport types.

use crate::verification::application::domain::entities::VerificationRequest;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use std::collections::HashMap;

pub const STRUCTURED_CONTENT_TYPE: &str = "application/cloudevents+json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubsubMessage {
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub publish_time: Option<String>,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct MessagePublishedData {
    pub message: PubsubMessage,
    #[serde(default)]
    pub subscription: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StructuredCloudEvent {
    #[serde(default)]
    id: Option<String>,
    data: MessagePublishedData,
}

#[derive(Debug, Deserialize)]
struct VerificationPayload {
    email: String,
    token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("Event body is not a Pub/Sub message: {0}")]
    InvalidEnvelope(String),

    #[error("Pub/Sub message carries no data")]
    MissingData,

    #[error("Message data is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Message data is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Message data is not a verification request: {0}")]
    InvalidPayload(String),
}

/// A decoded push delivery.
#[derive(Debug)]
pub struct PubsubDelivery {
    /// CloudEvent id when sent in structured mode.
    pub event_id: Option<String>,
    pub envelope: MessagePublishedData,
}

impl PubsubDelivery {
    pub fn from_body(body: &[u8], content_type: Option<&str>) -> Result<Self, EnvelopeError> {
        let structured = content_type
            .map(|ct| ct.starts_with(STRUCTURED_CONTENT_TYPE))
            .unwrap_or(false);

        if structured {
            let event: StructuredCloudEvent = serde_json::from_slice(body)
                .map_err(|e| EnvelopeError::InvalidEnvelope(e.to_string()))?;
            return Ok(Self {
                event_id: event.id,
                envelope: event.data,
            });
        }

        let envelope: MessagePublishedData = serde_json::from_slice(body)
            .map_err(|e| EnvelopeError::InvalidEnvelope(e.to_string()))?;
        Ok(Self {
            event_id: None,
            envelope,
        })
    }

    pub fn message_id(&self) -> Option<&str> {
        self.envelope.message.message_id.as_deref()
    }

    pub fn verification_request(&self) -> Result<VerificationRequest, EnvelopeError> {
        let data = self
            .envelope
            .message
            .data
            .as_deref()
            .ok_or(EnvelopeError::MissingData)?;
        decode_verification_request(data)
    }
}

/// base64 → UTF-8 → `{ "email", "token" }`
pub fn decode_verification_request(data: &str) -> Result<VerificationRequest, EnvelopeError> {
    let bytes = STANDARD.decode(data.trim())?;
    let text = String::from_utf8(bytes)?;
    let payload: VerificationPayload =
        serde_json::from_str(&text).map_err(|e| EnvelopeError::InvalidPayload(e.to_string()))?;

    Ok(VerificationRequest::new(payload.email, payload.token))
}
