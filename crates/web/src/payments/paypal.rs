use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use super::{CheckoutPurpose, format_cents};

#[derive(Debug, Error)]
pub enum PayPalError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("PayPal returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("PayPal is not configured")]
    NotConfigured,

    #[error("PayPal order has no approval link")]
    MissingApprovalLink,
}

#[derive(Debug, Deserialize)]
struct AccessToken {
    access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub rel: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseUnit {
    #[serde(default)]
    pub custom_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub purchase_units: Vec<PurchaseUnit>,
}

impl Order {
    pub fn approval_url(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|link| link.rel == "approve" || link.rel == "payer-action")
            .map(|link| link.href.as_str())
    }

    pub fn purpose(&self) -> Option<CheckoutPurpose> {
        self.purchase_units
            .iter()
            .find_map(|unit| unit.custom_id.as_deref())
            .and_then(CheckoutPurpose::from_custom_id)
    }

    pub fn is_completed(&self) -> bool {
        self.status == "COMPLETED"
    }

    /// Approval link while the buyer can still pay this order
    pub fn open_url(&self) -> Option<&str> {
        match self.status.as_str() {
            "CREATED" | "PAYER_ACTION_REQUIRED" | "APPROVED" => self.approval_url(),
            _ => None,
        }
    }
}

/// Client for the PayPal Orders v2 API
#[derive(Clone)]
pub struct PayPalClient {
    client: Client,
    api_base: String,
    client_id: String,
    client_secret: String,
}

impl PayPalClient {
    pub fn new(
        api_base: String,
        client_id: String,
        client_secret: String,
    ) -> Result<Self, PayPalError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
        })
    }

    async fn access_token(&self) -> Result<String, PayPalError> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(PayPalError::NotConfigured);
        }

        let response = self
            .client
            .post(format!("{}/v1/oauth2/token", self.api_base))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let token: AccessToken = Self::parse(response).await?;
        Ok(token.access_token)
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PayPalError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PayPalError::Api { status, body });
        }
        Ok(response.json().await?)
    }

    /// Create an order the buyer approves on PayPal's side
    pub async fn create_order(
        &self,
        purpose: &CheckoutPurpose,
        description: &str,
        amount_cents: i64,
        currency: &str,
        return_url: &str,
        cancel_url: &str,
    ) -> Result<Order, PayPalError> {
        let token = self.access_token().await?;

        let body = json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "custom_id": purpose.to_custom_id(),
                "description": description,
                "amount": {
                    "currency_code": currency.to_uppercase(),
                    "value": format_cents(amount_cents),
                },
            }],
            "application_context": {
                "return_url": return_url,
                "cancel_url": cancel_url,
                "user_action": "PAY_NOW",
            },
        });

        let response = self
            .client
            .post(format!("{}/v2/checkout/orders", self.api_base))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let order: Order = Self::parse(response).await?;
        if order.approval_url().is_none() {
            return Err(PayPalError::MissingApprovalLink);
        }

        tracing::debug!(order_id = %order.id, kind = purpose.kind(), "PayPal order created");
        Ok(order)
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Order, PayPalError> {
        let token = self.access_token().await?;

        let response = self
            .client
            .get(format!("{}/v2/checkout/orders/{}", self.api_base, order_id))
            .bearer_auth(token)
            .send()
            .await?;

        Self::parse(response).await
    }

    pub async fn capture_order(&self, order_id: &str) -> Result<Order, PayPalError> {
        let token = self.access_token().await?;

        let response = self
            .client
            .post(format!(
                "{}/v2/checkout/orders/{}/capture",
                self.api_base, order_id
            ))
            .bearer_auth(token)
            .json(&json!({}))
            .send()
            .await?;

        Self::parse(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_order_parsing() {
        let user_id = Uuid::new_v4();
        let raw = format!(
            r#"{{
                "id": "5O190127TN364715T",
                "status": "COMPLETED",
                "links": [
                    {{"href": "https://api.paypal.com/v2/checkout/orders/5O1", "rel": "self"}},
                    {{"href": "https://www.paypal.com/checkoutnow?token=5O1", "rel": "approve"}}
                ],
                "purchase_units": [{{"custom_id": "credits:{}:15"}}]
            }}"#,
            user_id
        );
        let order: Order = serde_json::from_str(&raw).unwrap();

        assert!(order.is_completed());
        assert_eq!(order.open_url(), None);
        assert_eq!(
            order.approval_url(),
            Some("https://www.paypal.com/checkoutnow?token=5O1")
        );
        assert_eq!(
            order.purpose(),
            Some(CheckoutPurpose::Credits {
                user_id,
                credits: 15
            })
        );
    }

    #[test]
    fn test_order_without_units() {
        let order: Order = serde_json::from_str(r#"{"id": "X", "status": "CREATED"}"#).unwrap();
        assert!(!order.is_completed());
        assert!(order.purpose().is_none());
        assert!(order.approval_url().is_none());
    }

    #[test]
    fn test_open_url_while_payable() {
        let mut order: Order = serde_json::from_str(
            r#"{"id": "Y", "status": "PAYER_ACTION_REQUIRED",
                "links": [{"href": "https://www.paypal.com/checkoutnow?token=Y", "rel": "payer-action"}]}"#,
        )
        .unwrap();
        assert_eq!(order.open_url(), Some("https://www.paypal.com/checkoutnow?token=Y"));

        order.status = "VOIDED".to_string();
        assert_eq!(order.open_url(), None);
    }
}
