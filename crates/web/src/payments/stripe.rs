use std::collections::HashMap;
use std::time::Duration;

use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use super::CheckoutPurpose;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Maximum age of a signed webhook payload, in seconds
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Error)]
pub enum StripeError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Stripe returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Stripe is not configured")]
    NotConfigured,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("missing or malformed Stripe-Signature header")]
    MalformedHeader,

    #[error("timestamp outside the tolerance window")]
    Expired,

    #[error("no matching signature")]
    Mismatch,

    #[error("webhook signing secret is not configured")]
    NotConfigured,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
    /// `open`, `complete` or `expired`
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    /// Hosted page URL while the session can still be paid
    pub fn open_url(&self) -> Option<&str> {
        match self.status.as_deref() {
            Some("open") => self.url.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

/// Line item shown on the hosted checkout page
#[derive(Debug, Clone)]
pub struct CheckoutItem {
    pub name: String,
    pub amount_cents: i64,
    pub currency: String,
}

/// Client for Stripe Checkout and webhook verification
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    api_base: String,
    secret_key: String,
    webhook_secret: String,
}

impl StripeClient {
    pub fn new(secret_key: String, webhook_secret: String) -> Result<Self, StripeError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            api_base: STRIPE_API_BASE.to_string(),
            secret_key,
            webhook_secret,
        })
    }

    /// Create a hosted Checkout Session for a one-off payment
    pub async fn create_checkout_session(
        &self,
        item: &CheckoutItem,
        purpose: &CheckoutPurpose,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, StripeError> {
        if self.secret_key.is_empty() {
            return Err(StripeError::NotConfigured);
        }

        let mut form: Vec<(String, String)> = vec![
            ("mode".into(), "payment".into()),
            ("success_url".into(), success_url.to_string()),
            ("cancel_url".into(), cancel_url.to_string()),
            ("client_reference_id".into(), purpose.user_id().to_string()),
            ("line_items[0][quantity]".into(), "1".into()),
            (
                "line_items[0][price_data][currency]".into(),
                item.currency.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]".into(),
                item.amount_cents.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".into(),
                item.name.clone(),
            ),
        ];
        for (key, value) in purpose.to_metadata() {
            form.push((format!("metadata[{}]", key), value));
        }

        let response = self
            .client
            .post(format!("{}/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StripeError::Api { status, body });
        }

        let session: CheckoutSession = response.json().await?;
        tracing::debug!(session_id = %session.id, kind = purpose.kind(), "Stripe checkout session created");

        Ok(session)
    }

    pub async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, StripeError> {
        if self.secret_key.is_empty() {
            return Err(StripeError::NotConfigured);
        }

        let response = self
            .client
            .get(format!("{}/checkout/sessions/{}", self.api_base, session_id))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StripeError::Api { status, body });
        }

        Ok(response.json().await?)
    }

    /// Check the `Stripe-Signature` header against the raw body
    pub fn verify_webhook(
        &self,
        payload: &[u8],
        header: &str,
        now: i64,
    ) -> Result<(), SignatureError> {
        verify_signature(&self.webhook_secret, payload, header, now)
    }
}

fn parse_signature_header(header: &str) -> Result<(i64, Vec<Vec<u8>>), SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => {
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    match timestamp {
        Some(t) if !signatures.is_empty() => Ok((t, signatures)),
        _ => Err(SignatureError::MalformedHeader),
    }
}

/// Stripe's v1 scheme: HMAC-SHA256 of `"{timestamp}.{payload}"`
pub fn verify_signature(
    secret: &str,
    payload: &[u8],
    header: &str,
    now: i64,
) -> Result<(), SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::NotConfigured);
    }

    let (timestamp, signatures) = parse_signature_header(header)?;

    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(SignatureError::Expired);
    }

    let matches = signatures.iter().any(|signature| {
        let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.verify_slice(signature).is_ok()
    });

    if matches {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Build a `Stripe-Signature` header the way Stripe does
#[cfg(test)]
pub(crate) fn sign_payload(secret: &str, payload: &[u8], timestamp: i64) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const BODY: &[u8] = br#"{"id":"evt_1","type":"checkout.session.completed"}"#;

    #[test]
    fn test_valid_signature() {
        let header = sign_payload(SECRET, BODY, 1_700_000_000);
        assert_eq!(verify_signature(SECRET, BODY, &header, 1_700_000_100), Ok(()));
    }

    #[test]
    fn test_wrong_secret() {
        let header = sign_payload("whsec_other", BODY, 1_700_000_000);
        assert_eq!(
            verify_signature(SECRET, BODY, &header, 1_700_000_000),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_tampered_body() {
        let header = sign_payload(SECRET, BODY, 1_700_000_000);
        assert_eq!(
            verify_signature(SECRET, b"{}", &header, 1_700_000_000),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_outside_tolerance() {
        let header = sign_payload(SECRET, BODY, 1_700_000_000);
        assert_eq!(
            verify_signature(SECRET, BODY, &header, 1_700_000_000 + SIGNATURE_TOLERANCE_SECS + 1),
            Err(SignatureError::Expired)
        );
    }

    #[test]
    fn test_any_v1_signature_may_match() {
        let good = sign_payload(SECRET, BODY, 1_700_000_000);
        let good_sig = good.split("v1=").nth(1).unwrap();
        let header = format!("t=1700000000,v0=abc,v1={},v1={}", "00".repeat(32), good_sig);
        assert_eq!(verify_signature(SECRET, BODY, &header, 1_700_000_000), Ok(()));
    }

    #[test]
    fn test_malformed_header() {
        assert_eq!(
            verify_signature(SECRET, BODY, "garbage", 0),
            Err(SignatureError::MalformedHeader)
        );
        assert_eq!(
            verify_signature(SECRET, BODY, "t=123", 123),
            Err(SignatureError::MalformedHeader)
        );
    }

    #[test]
    fn test_empty_secret_rejects_every_header() {
        let forged = sign_payload("", BODY, 1_700_000_000);
        assert_eq!(
            verify_signature("", BODY, &forged, 1_700_000_000),
            Err(SignatureError::NotConfigured)
        );

        let genuine = sign_payload(SECRET, BODY, 1_700_000_000);
        assert_eq!(
            verify_signature("", BODY, &genuine, 1_700_000_000),
            Err(SignatureError::NotConfigured)
        );
        assert_eq!(
            verify_signature("", BODY, "garbage", 0),
            Err(SignatureError::NotConfigured)
        );
    }

    #[test]
    fn test_event_parsing() {
        let event: StripeEvent = serde_json::from_str(
            r#"{
                "id": "evt_123",
                "type": "checkout.session.completed",
                "data": {"object": {"id": "cs_1", "url": null, "payment_status": "paid",
                         "amount_total": 500, "metadata": {"kind": "credits"}}}
            }"#,
        )
        .unwrap();
        assert_eq!(event.event_type, "checkout.session.completed");

        let session: CheckoutSession = serde_json::from_value(event.data.object).unwrap();
        assert_eq!(session.payment_status.as_deref(), Some("paid"));
        assert_eq!(session.open_url(), None);
        assert_eq!(session.metadata.get("kind").map(String::as_str), Some("credits"));
    }

    #[test]
    fn test_open_url_only_for_open_sessions() {
        let mut session: CheckoutSession = serde_json::from_str(
            r#"{"id": "cs_2", "url": "https://checkout.stripe.com/c/pay/cs_2", "status": "open"}"#,
        )
        .unwrap();
        assert_eq!(session.open_url(), Some("https://checkout.stripe.com/c/pay/cs_2"));

        session.status = Some("expired".to_string());
        assert_eq!(session.open_url(), None);
    }
}
