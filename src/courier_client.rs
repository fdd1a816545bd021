use crate::errors::AppError;
use crate::models::{DeltaQuote, DraftOrder, NewOrderQuote, ServiceAvailability};
use chrono::NaiveDate;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

/// Client for the upstream courier platform API.
///
/// All persistence and pricing live upstream; this client only shapes
/// requests and validates responses at the boundary, one explicit schema per
/// endpoint.
#[derive(Clone)]
pub struct CourierApiClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

/// Slot responses arrive either as a bare array or wrapped in a `data`
/// envelope depending on the upstream deployment; both are normalized here,
/// once, instead of being optional-chained at every call site.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SlotsEnvelope {
    Wrapped { data: Vec<ServiceAvailability> },
    Bare(Vec<ServiceAvailability>),
}

impl SlotsEnvelope {
    fn into_inner(self) -> Vec<ServiceAvailability> {
        match self {
            SlotsEnvelope::Wrapped { data } => data,
            SlotsEnvelope::Bare(list) => list,
        }
    }
}

/// `POST /order/quote` response schema.
#[derive(Debug, Deserialize)]
struct NewQuoteResponse {
    pricing: PricingBody,
}

#[derive(Debug, Deserialize)]
struct PricingBody {
    price: i64,
    tip: i64,
    #[serde(default)]
    discount: Option<DiscountBody>,
}

#[derive(Debug, Deserialize)]
struct DiscountBody {
    original: i64,
}

/// `POST /order` / `POST /order?order_id=` response schema. Some upstream
/// versions return the id as a number.
#[derive(Debug, Deserialize)]
struct OrderCreatedResponse {
    order_id: OrderId,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OrderId {
    Text(String),
    Number(i64),
}

impl OrderId {
    fn into_string(self) -> String {
        match self {
            OrderId::Text(id) => id,
            OrderId::Number(id) => id.to_string(),
        }
    }
}

impl CourierApiClient {
    /// Creates a new `CourierApiClient`.
    pub fn new(base_url: String, token: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::UpstreamError(format!("Failed to create courier client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Fetches available service/slot combinations for a date and draft.
    ///
    /// One request per qualifying state change; never retried here. The date
    /// travels as `MM-DD-YYYY` per the upstream contract.
    pub async fn fetch_slots(
        &self,
        date: NaiveDate,
        draft: &DraftOrder,
    ) -> Result<Vec<ServiceAvailability>, AppError> {
        let url = Url::parse_with_params(
            &format!("{}/slots", self.base_url),
            &[("date", date.format("%m-%d-%Y").to_string())],
        )
        .map_err(|e| AppError::UpstreamError(format!("Failed to build URL: {}", e)))?;

        tracing::info!("Fetching slot availability for {}", date);

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(draft)
            .send()
            .await
            .map_err(|e| AppError::UpstreamError(format!("Slots request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(upstream_error("Slots", response).await);
        }

        let envelope: SlotsEnvelope = response.json().await.map_err(|e| {
            AppError::UpstreamError(format!("Failed to parse slots response: {}", e))
        })?;

        let candidates = envelope.into_inner();
        tracing::info!("Received {} service tier(s)", candidates.len());
        Ok(candidates)
    }

    /// Requests an absolute quote for a not-yet-submitted order.
    pub async fn quote_new(&self, draft: &DraftOrder) -> Result<NewOrderQuote, AppError> {
        let url = format!("{}/order/quote", self.base_url);
        tracing::info!("Requesting new-order quote");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(draft)
            .send()
            .await
            .map_err(|e| AppError::UpstreamError(format!("Quote request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(upstream_error("Quote", response).await);
        }

        let body: NewQuoteResponse = response.json().await.map_err(|e| {
            AppError::UpstreamError(format!("Failed to parse quote response: {}", e))
        })?;

        Ok(NewOrderQuote {
            price: body.pricing.price,
            tip: body.pricing.tip,
            original_price: body.pricing.discount.map(|d| d.original),
        })
    }

    /// Requests a delta quote while editing an already-submitted order.
    pub async fn quote_update(
        &self,
        order_id: &str,
        draft: &DraftOrder,
    ) -> Result<DeltaQuote, AppError> {
        let url = Url::parse_with_params(
            &format!("{}/orders/quote", self.base_url),
            &[("order_id", order_id)],
        )
        .map_err(|e| AppError::UpstreamError(format!("Failed to build URL: {}", e)))?;

        tracing::info!("Requesting delta quote for order {}", order_id);

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(draft)
            .send()
            .await
            .map_err(|e| AppError::UpstreamError(format!("Delta quote request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(upstream_error("Delta quote", response).await);
        }

        let quote: DeltaQuote = response.json().await.map_err(|e| {
            AppError::UpstreamError(format!("Failed to parse delta quote response: {}", e))
        })?;

        Ok(quote)
    }

    /// Submits a new order; returns the created order id.
    pub async fn create_order(&self, draft: &DraftOrder) -> Result<String, AppError> {
        let url = format!("{}/order", self.base_url);
        tracing::info!("Submitting new order");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(draft)
            .send()
            .await
            .map_err(|e| AppError::UpstreamError(format!("Order submission failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(upstream_error("Order submission", response).await);
        }

        let created: OrderCreatedResponse = response.json().await.map_err(|e| {
            AppError::UpstreamError(format!("Failed to parse order response: {}", e))
        })?;

        let order_id = created.order_id.into_string();
        tracing::info!("Order created: {}", order_id);
        Ok(order_id)
    }

    /// Updates an existing order with the edited draft.
    pub async fn update_order(
        &self,
        order_id: &str,
        draft: &DraftOrder,
    ) -> Result<String, AppError> {
        let url = Url::parse_with_params(
            &format!("{}/order", self.base_url),
            &[("order_id", order_id)],
        )
        .map_err(|e| AppError::UpstreamError(format!("Failed to build URL: {}", e)))?;

        tracing::info!("Updating order {}", order_id);

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(draft)
            .send()
            .await
            .map_err(|e| AppError::UpstreamError(format!("Order update failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(upstream_error("Order update", response).await);
        }

        let updated: OrderCreatedResponse = response.json().await.map_err(|e| {
            AppError::UpstreamError(format!("Failed to parse order update response: {}", e))
        })?;

        Ok(updated.order_id.into_string())
    }
}

/// Extracts the most useful message from an upstream failure body.
///
/// The server sends `{"error": "..."}` or `{"message": "..."}` on quote
/// rejections; the raw text is the fallback so the dashboard always has
/// something to show next to the disabled submit action.
async fn upstream_error(operation: &str, response: reqwest::Response) -> AppError {
    let status = response.status();
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|body| {
            body.get("error")
                .or_else(|| body.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or(text);

    AppError::UpstreamError(format!("{} returned {}: {}", operation, status, message))
}
