//! Stripe webhook signature verification and event parsing.
//!
//! The `Stripe-Signature` header has the form `t=<unix>,v1=<hex>[,v1=<hex>...]`.
//! Each `v1` is an HMAC-SHA256 of `"<t>.<raw body>"` keyed by the endpoint's
//! signing secret. Multiple `v1` entries appear while a secret is being rolled.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use spice_store_core::{PaymentStatus, SessionId};

use super::stripe::normalize_payment_status;
use super::{PaymentError, WebhookEvent};

/// Maximum age of a signed webhook, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

const SESSION_COMPLETED: &str = "checkout.session.completed";
const SESSION_ASYNC_SUCCEEDED: &str = "checkout.session.async_payment_succeeded";
const SESSION_ASYNC_FAILED: &str = "checkout.session.async_payment_failed";
const SESSION_EXPIRED: &str = "checkout.session.expired";

/// Verify a `Stripe-Signature` header against the raw request body.
///
/// `now` is the current Unix time in seconds.
///
/// # Errors
///
/// Returns `PaymentError::InvalidSignature` if the header is malformed, the
/// timestamp is outside the tolerance, or no signature matches.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
) -> Result<(), PaymentError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| PaymentError::InvalidSignature("missing timestamp".to_string()))?;
    if signatures.is_empty() {
        return Err(PaymentError::InvalidSignature(
            "missing v1 signature".to_string(),
        ));
    }

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| PaymentError::InvalidSignature("invalid timestamp".to_string()))?;
    if now.abs_diff(ts) > SIGNATURE_TOLERANCE_SECS.unsigned_abs() {
        return Err(PaymentError::InvalidSignature(
            "timestamp outside tolerance".to_string(),
        ));
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::InvalidSignature(e.to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    // verify_slice compares in constant time
    let matched = signatures.iter().any(|candidate| {
        hex::decode(candidate).is_ok_and(|bytes| mac.clone().verify_slice(&bytes).is_ok())
    });

    if matched {
        Ok(())
    } else {
        Err(PaymentError::InvalidSignature(
            "signature mismatch".to_string(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: RawSessionObject,
}

#[derive(Debug, Deserialize)]
struct RawSessionObject {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
}

/// Parse a verified webhook body into a normalized event.
///
/// # Errors
///
/// Returns `PaymentError::Parse` if the body is not a Stripe event.
pub fn parse_event(payload: &[u8]) -> Result<WebhookEvent, PaymentError> {
    let event: RawEvent = serde_json::from_slice(payload)
        .map_err(|e| PaymentError::Parse(format!("invalid webhook body: {e}")))?;
    let object = event.data.object;

    let payment_status = match event.event_type.as_str() {
        SESSION_COMPLETED => Some(normalize_payment_status(
            object.status.as_deref(),
            object.payment_status.as_deref(),
        )),
        SESSION_ASYNC_SUCCEEDED => Some(PaymentStatus::Paid),
        SESSION_ASYNC_FAILED => Some(PaymentStatus::Failed),
        SESSION_EXPIRED => Some(PaymentStatus::Expired),
        _ => None,
    };

    Ok(match payment_status {
        Some(payment_status) => WebhookEvent {
            session_id: object.id.map(SessionId::new),
            payment_status,
            event_type: event.event_type,
        },
        None => WebhookEvent {
            session_id: None,
            payment_status: PaymentStatus::default(),
            event_type: event.event_type,
        },
    })
}

/// Compute a `Stripe-Signature` header value for a payload.
#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!(
        "t={timestamp},v1={}",
        hex::encode(mac.finalize().into_bytes())
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_9fK2mQ7xLp4R";
    const NOW: i64 = 1_760_000_000;

    fn completed_event(payment_status: &str) -> Vec<u8> {
        format!(
            r#"{{"id":"evt_1","type":"checkout.session.completed","data":{{"object":{{"id":"cs_test_1","object":"checkout.session","status":"complete","payment_status":"{payment_status}"}}}}}}"#
        )
        .into_bytes()
    }

    #[test]
    fn test_valid_signature() {
        let payload = completed_event("paid");
        let header = sign_payload(&payload, SECRET, NOW);
        assert!(verify_signature(&payload, &header, SECRET, NOW).is_ok());
    }

    #[test]
    fn test_any_v1_may_match() {
        let payload = completed_event("paid");
        let good = sign_payload(&payload, SECRET, NOW);
        let good_sig = good.split_once("v1=").unwrap().1;
        let header = format!("t={NOW},v1=deadbeef,v1={good_sig}");
        assert!(verify_signature(&payload, &header, SECRET, NOW).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = completed_event("paid");
        let header = sign_payload(&payload, "whsec_other", NOW);
        assert!(matches!(
            verify_signature(&payload, &header, SECRET, NOW),
            Err(PaymentError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_modified_payload_rejected() {
        let header = sign_payload(&completed_event("unpaid"), SECRET, NOW);
        assert!(verify_signature(&completed_event("paid"), &header, SECRET, NOW).is_err());
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let payload = completed_event("paid");
        let header = sign_payload(&payload, SECRET, NOW - 600);
        assert!(verify_signature(&payload, &header, SECRET, NOW).is_err());

        let header = sign_payload(&payload, SECRET, NOW - 299);
        assert!(verify_signature(&payload, &header, SECRET, NOW).is_ok());
    }

    #[test]
    fn test_malformed_headers_rejected() {
        let payload = completed_event("paid");
        for header in [
            "",
            "garbage",
            "t=1760000000",
            "v1=abcd",
            "t=soon,v1=abcd",
            "t=-9223372036854775808,v1=00",
            "t=9223372036854775807,v1=00",
        ] {
            assert!(
                verify_signature(&payload, header, SECRET, NOW).is_err(),
                "{header:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_completed_event() {
        let event = parse_event(&completed_event("paid")).unwrap();
        assert_eq!(event.event_type, "checkout.session.completed");
        assert_eq!(event.session_id, Some(SessionId::new("cs_test_1")));
        assert_eq!(event.payment_status, PaymentStatus::Paid);

        let event = parse_event(&completed_event("unpaid")).unwrap();
        assert_eq!(event.payment_status, PaymentStatus::Initiated);
    }

    #[test]
    fn test_parse_async_and_expired_events() {
        let body = |event_type: &str| {
            format!(
                r#"{{"type":"{event_type}","data":{{"object":{{"id":"cs_2","payment_status":"unpaid"}}}}}}"#
            )
        };

        let cases = [
            (SESSION_ASYNC_SUCCEEDED, PaymentStatus::Paid),
            (SESSION_ASYNC_FAILED, PaymentStatus::Failed),
            (SESSION_EXPIRED, PaymentStatus::Expired),
        ];
        for (event_type, expected) in cases {
            let event = parse_event(body(event_type).as_bytes()).unwrap();
            assert_eq!(event.session_id, Some(SessionId::new("cs_2")));
            assert_eq!(event.payment_status, expected, "{event_type}");
        }
    }

    #[test]
    fn test_unrelated_event_has_no_session() {
        let body = br#"{"type":"payment_intent.created","data":{"object":{"id":"pi_1"}}}"#;
        let event = parse_event(body).unwrap();
        assert_eq!(event.event_type, "payment_intent.created");
        assert_eq!(event.session_id, None);
    }

    #[test]
    fn test_parse_rejects_non_events() {
        assert!(matches!(
            parse_event(b"not json"),
            Err(PaymentError::Parse(_))
        ));
    }
}
