//! # Payment Gateway
//!
//! The seam between checkout and the payment provider.
//!
//! ## PayPal v2 Orders Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Server                                   PayPal                        │
//! │                                                                         │
//! │  access_token() ──── POST /v1/oauth2/token ────────────► bearer token   │
//! │       (client credentials, cached until shortly before expiry)          │
//! │                                                                         │
//! │  create_order() ──── POST /v2/checkout/orders ─────────► { id }         │
//! │       one purchase unit: amount = total,                                │
//! │       breakdown = item_total − discount, items = cart lines             │
//! │                                                                         │
//! │                 (shopper approves on PayPal)                            │
//! │                                                                         │
//! │  capture_order() ─── POST /v2/checkout/orders/{id}/capture ──► status,  │
//! │                                               payer, captured amount    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use shopfront_core::Money;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;

// =============================================================================
// Gateway Contract
// =============================================================================

/// Payment provider failures.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Client id / secret missing.
    #[error("Payment provider is not configured")]
    NotConfigured,

    /// Network or TLS failure talking to the provider.
    #[error("Payment provider unreachable: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("Payment provider returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The provider's answer didn't have the expected shape.
    #[error("Malformed payment provider response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for PaymentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PaymentError::MalformedResponse(err.to_string())
        } else {
            PaymentError::Transport(err.to_string())
        }
    }
}

/// One cart line as shown to the payer.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentLine {
    pub name: String,
    pub unit_amount: Money,
    pub quantity: i64,
}

/// What to charge.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub currency: String,
    pub lines: Vec<PaymentLine>,
    /// Σ lines before discount.
    pub item_total: Money,
    pub discount: Money,
    /// Amount charged: `item_total − discount`.
    pub total: Money,
    pub return_url: String,
    pub cancel_url: String,
}

/// A provider order awaiting approval.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedPayment {
    pub order_id: String,
    pub status: String,
}

/// Result of a capture.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedPayment {
    pub order_id: String,
    pub payer_id: String,
    /// Provider status string (`COMPLETED`, `DECLINED`, ...).
    pub status: String,
    pub amount: Money,
    pub currency: String,
    /// Full provider payload, returned to the storefront as-is.
    pub raw: Value,
}

/// A payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, request: &PaymentRequest) -> Result<CreatedPayment, PaymentError>;

    async fn capture_order(&self, order_id: &str) -> Result<CapturedPayment, PaymentError>;
}

// =============================================================================
// PayPal
// =============================================================================

/// Tokens are refreshed this long before PayPal says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// PayPal REST implementation of [`PaymentGateway`].
#[derive(Debug)]
pub struct PayPalGateway {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    id: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct CaptureResponse {
    id: String,
    status: String,
    #[serde(default)]
    payer: Option<Payer>,
    #[serde(default)]
    purchase_units: Vec<CapturedUnit>,
}

#[derive(Debug, Deserialize)]
struct Payer {
    #[serde(default)]
    payer_id: String,
}

#[derive(Debug, Deserialize)]
struct CapturedUnit {
    payments: Payments,
}

#[derive(Debug, Deserialize)]
struct Payments {
    #[serde(default)]
    captures: Vec<Capture>,
}

#[derive(Debug, Deserialize)]
struct Capture {
    amount: Amount,
}

#[derive(Debug, Deserialize)]
struct Amount {
    currency_code: String,
    value: String,
}

impl PayPalGateway {
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        PayPalGateway {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token: Mutex::new(None),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        PayPalGateway::new(
            &config.paypal_api_base,
            &config.paypal_client_id,
            &config.paypal_client_secret,
        )
    }

    async fn access_token(&self) -> Result<String, PaymentError> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(PaymentError::NotConfigured);
        }

        {
            let cached = self.token.lock().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at > Instant::now() {
                    return Ok(token.value.clone());
                }
            }
        }

        debug!("Requesting PayPal access token");
        let response = self
            .client
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
            .send()
            .await?;

        let token: TokenResponse = read_json(response).await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);

        *self.token.lock().await = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }
}

#[async_trait]
impl PaymentGateway for PayPalGateway {
    async fn create_order(&self, request: &PaymentRequest) -> Result<CreatedPayment, PaymentError> {
        let token = self.access_token().await?;

        let response = self
            .client
            .post(format!("{}/v2/checkout/orders", self.base_url))
            .bearer_auth(token)
            .json(&order_body(request))
            .send()
            .await?;

        let created: CreateOrderResponse = read_json(response).await?;
        info!(order_id = %created.id, total = %request.total, "PayPal order created");

        Ok(CreatedPayment {
            order_id: created.id,
            status: created.status,
        })
    }

    async fn capture_order(&self, order_id: &str) -> Result<CapturedPayment, PaymentError> {
        let token = self.access_token().await?;

        let response = self
            .client
            .post(format!("{}/v2/checkout/orders/{}/capture", self.base_url, order_id))
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let raw: Value = read_json(response).await?;
        let captured = parse_capture(raw)?;
        info!(order_id = %captured.order_id, status = %captured.status, "PayPal order captured");
        Ok(captured)
    }
}

/// Builds the `POST /v2/checkout/orders` body.
fn order_body(request: &PaymentRequest) -> Value {
    let money = |amount: Money| {
        json!({
            "currency_code": request.currency,
            "value": amount.to_decimal_string(),
        })
    };

    let items: Vec<Value> = request
        .lines
        .iter()
        .map(|line| {
            json!({
                "name": line.name,
                "quantity": line.quantity.to_string(),
                "unit_amount": money(line.unit_amount),
            })
        })
        .collect();

    let mut breakdown = json!({ "item_total": money(request.item_total) });
    if request.discount.is_positive() {
        breakdown["discount"] = money(request.discount);
    }

    json!({
        "intent": "CAPTURE",
        "purchase_units": [{
            "amount": {
                "currency_code": request.currency,
                "value": request.total.to_decimal_string(),
                "breakdown": breakdown,
            },
            "items": items,
        }],
        "application_context": {
            "return_url": request.return_url,
            "cancel_url": request.cancel_url,
        },
    })
}

fn parse_capture(raw: Value) -> Result<CapturedPayment, PaymentError> {
    let parsed: CaptureResponse = serde_json::from_value(raw.clone())
        .map_err(|e| PaymentError::MalformedResponse(e.to_string()))?;

    let amount = parsed
        .purchase_units
        .first()
        .and_then(|unit| unit.payments.captures.first())
        .map(|capture| &capture.amount)
        .ok_or_else(|| PaymentError::MalformedResponse("capture has no amount".to_string()))?;

    let value = Money::parse_decimal(&amount.value).ok_or_else(|| {
        PaymentError::MalformedResponse(format!("bad capture amount '{}'", amount.value))
    })?;

    Ok(CapturedPayment {
        order_id: parsed.id,
        payer_id: parsed.payer.map(|p| p.payer_id).unwrap_or_default(),
        status: parsed.status,
        amount: value,
        currency: amount.currency_code.clone(),
        raw,
    })
}

/// Decodes a success body, or turns PayPal's error body into
/// [`PaymentError::Status`].
async fn read_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, PaymentError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body: Value = response.json().await.unwrap_or(Value::Null);
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| body.get("error_description").and_then(Value::as_str))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error"))
        .to_string();

    if status == StatusCode::UNAUTHORIZED {
        warn!("PayPal rejected the credentials");
    }

    Err(PaymentError::Status {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(discount: i64) -> PaymentRequest {
        PaymentRequest {
            currency: "USD".to_string(),
            lines: vec![
                PaymentLine {
                    name: "Norton 360".to_string(),
                    unit_amount: Money::from_cents(3000),
                    quantity: 1,
                },
                PaymentLine {
                    name: "Norton VPN".to_string(),
                    unit_amount: Money::from_cents(1000),
                    quantity: 2,
                },
            ],
            item_total: Money::from_cents(5000),
            discount: Money::from_cents(discount),
            total: Money::from_cents(5000 - discount),
            return_url: "http://localhost:3000/checkout/success".to_string(),
            cancel_url: "http://localhost:3000/checkout/cancel".to_string(),
        }
    }

    #[test]
    fn test_order_body_charges_discounted_total() {
        let body = order_body(&request(500));
        let unit = &body["purchase_units"][0];

        assert_eq!(body["intent"], "CAPTURE");
        assert_eq!(unit["amount"]["value"], "45.00");
        assert_eq!(unit["amount"]["breakdown"]["item_total"]["value"], "50.00");
        assert_eq!(unit["amount"]["breakdown"]["discount"]["value"], "5.00");
        assert_eq!(unit["items"][1]["quantity"], "2");
        assert_eq!(unit["items"][1]["unit_amount"]["value"], "10.00");
    }

    #[test]
    fn test_order_body_omits_zero_discount() {
        let body = order_body(&request(0));
        let breakdown = &body["purchase_units"][0]["amount"]["breakdown"];
        assert!(breakdown.get("discount").is_none());
    }

    #[test]
    fn test_parse_capture() {
        let raw = json!({
            "id": "5O190127TN364715T",
            "status": "COMPLETED",
            "payer": { "payer_id": "QYR5Z8XDVJNXQ" },
            "purchase_units": [{
                "payments": {
                    "captures": [{
                        "amount": { "currency_code": "USD", "value": "45.00" }
                    }]
                }
            }]
        });

        let captured = parse_capture(raw).unwrap();
        assert_eq!(captured.order_id, "5O190127TN364715T");
        assert_eq!(captured.payer_id, "QYR5Z8XDVJNXQ");
        assert_eq!(captured.amount, Money::from_cents(4500));
        assert_eq!(captured.currency, "USD");
    }

    #[test]
    fn test_parse_capture_without_amount() {
        let raw = json!({ "id": "X", "status": "COMPLETED", "purchase_units": [] });
        assert!(matches!(
            parse_capture(raw),
            Err(PaymentError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_gateway() {
        let gateway = PayPalGateway::new("https://api-m.sandbox.paypal.com", "", "");
        assert!(matches!(
            gateway.capture_order("X").await,
            Err(PaymentError::NotConfigured)
        ));
    }
}
