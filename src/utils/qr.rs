//! Ticket QR payloads.
//!
//! The payload is a small versioned JSON envelope serialized exactly once,
//! at issuance. The serialized string is stored on the ticket and is the
//! lookup key at validation time, so it must never be re-serialized: JSON
//! field order is not canonical, and only the stored bytes match.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use qrcode::render::svg;
use qrcode::QrCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::error::AppError;

pub const QR_PAYLOAD_VERSION: u8 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    pub v: u8,
    pub ticket_id: String,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub issued_at: DateTime<Utc>,
}

impl QrPayload {
    pub fn new(ticket_id: &str, event_id: Uuid, user_id: Uuid) -> Self {
        Self {
            v: QR_PAYLOAD_VERSION,
            ticket_id: ticket_id.to_string(),
            event_id,
            user_id,
            issued_at: Utc::now(),
        }
    }

    /// Serializes the payload to the string stored on the ticket.
    pub fn encode(&self) -> Result<String, AppError> {
        serde_json::to_string(self)
            .map_err(|e| AppError::InternalServerError(format!("QR payload encoding failed: {e}")))
    }

    /// Checks that a scanned string is a structurally valid payload.
    /// Lookup still happens on the raw string, not the parsed fields.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let payload: QrPayload = serde_json::from_str(raw)
            .map_err(|_| AppError::ValidationError("Invalid QR format".to_string()))?;

        if payload.v != QR_PAYLOAD_VERSION {
            return Err(AppError::ValidationError(format!(
                "Unsupported QR payload version {}",
                payload.v
            )));
        }

        Ok(payload)
    }
}

/// Renders an opaque payload string as a scannable image, returned as an
/// SVG data URL. The content is not interpreted here.
pub fn render_data_url(payload: &str) -> Result<String, AppError> {
    let code = QrCode::new(payload.as_bytes())
        .map_err(|e| AppError::InternalServerError(format!("QR rendering failed: {e}")))?;

    let image = code
        .render::<svg::Color>()
        .min_dimensions(256, 256)
        .build();

    Ok(format!("data:image/svg+xml;base64,{}", BASE64.encode(image)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_parse_round_trip() {
        let payload = QrPayload::new("t-123", Uuid::new_v4(), Uuid::new_v4());
        let encoded = payload.encode().unwrap();

        let parsed = QrPayload::parse(&encoded).unwrap();
        assert_eq!(parsed.ticket_id, "t-123");
        assert_eq!(parsed.event_id, payload.event_id);
        assert_eq!(parsed.user_id, payload.user_id);
    }

    #[test]
    fn test_malformed_payload_is_validation_error() {
        let err = QrPayload::parse("not json at all").unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        // Valid JSON, wrong shape
        let err = QrPayload::parse(r#"{"ticketId":"x"}"#).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_unknown_version_rejected() {
        let raw = format!(
            r#"{{"v":99,"ticketId":"t","eventId":"{}","userId":"{}","issuedAt":"2026-01-01T00:00:00Z"}}"#,
            Uuid::new_v4(),
            Uuid::new_v4()
        );
        let err = QrPayload::parse(&raw).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_render_produces_svg_data_url() {
        let url = render_data_url("anything").unwrap();
        assert!(url.starts_with("data:image/svg+xml;base64,"));
    }
}
