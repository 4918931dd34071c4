//! HTTP implementation of the ordering endpoints consumed by the client core.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{
    config::ClientConfig,
    domain::{
        IdempotencyToken, Menu, Order, OrderPayload, OrderStatus, OrderingError, OrderingResult,
    },
    dto::orders::{
        CreateOrderResponse, IDEMPOTENCY_KEY_HEADER, ORDER_TOKEN_HEADER, OrderList,
        TransitionOrderRequest,
    },
};

use super::{
    identity::Identity,
    submitter::{CreateOrderOutcome, OrderGateway},
};

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    code: Option<String>,
    detail: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> reqwest::Result<Self> {
        // The submitter enforces its own deadline; this one only guards reads.
        let client = Client::builder()
            .timeout(Duration::from_secs(config.submit_timeout_secs.max(1) * 2))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token.or(self.token.as_deref()) {
            Some(token) => request.bearer_auth(token.trim_start_matches("Bearer ").trim()),
            None => request,
        }
    }

    pub async fn get_catalog(&self, restaurant_id: Uuid) -> OrderingResult<Menu> {
        let request = self
            .client
            .get(self.url(&format!("restaurants/{restaurant_id}/menu")));
        fetch(request).await
    }

    /// Fetch one order. Guests pass the idempotency token they ordered with.
    pub async fn get_order(
        &self,
        order_id: Uuid,
        guest_token: Option<&str>,
    ) -> OrderingResult<Order> {
        let mut request = self.authorize(
            self.client.get(self.url(&format!("orders/{order_id}"))),
            None,
        );
        if let Some(token) = guest_token {
            request = request.header(ORDER_TOKEN_HEADER, token);
        }
        fetch(request).await
    }

    pub async fn list_orders_for_user(&self) -> OrderingResult<Vec<Order>> {
        if self.token.is_none() {
            return Err(OrderingError::MissingIdentity(
                "listing orders requires a signed-in user".into(),
            ));
        }
        let request = self.authorize(self.client.get(self.url("orders")), None);
        let list: OrderList = fetch(request).await?;
        Ok(list.items)
    }

    pub async fn transition_order(
        &self,
        order_id: Uuid,
        status: OrderStatus,
        expected_version: Option<i64>,
        guest_token: Option<&str>,
    ) -> OrderingResult<Order> {
        let body = TransitionOrderRequest {
            status,
            expected_version,
        };
        let mut request = self.authorize(
            self.client
                .patch(self.url(&format!("orders/{order_id}/status")))
                .json(&body),
            None,
        );
        if let Some(token) = guest_token {
            request = request.header(ORDER_TOKEN_HEADER, token);
        }
        fetch(request).await
    }
}

impl OrderGateway for ApiClient {
    async fn create_order(
        &self,
        payload: &OrderPayload,
        token: &IdempotencyToken,
        identity: &Identity,
    ) -> OrderingResult<CreateOrderOutcome> {
        let bearer = match identity {
            Identity::Authenticated(user) => Some(user.token.as_str()),
            Identity::Guest(_) => None,
        };
        let request = self
            .client
            .post(self.url("orders"))
            .header(IDEMPOTENCY_KEY_HEADER, token.as_str())
            .json(payload);
        let request = match bearer {
            Some(bearer) => self.authorize(request, Some(bearer)),
            // Never leak a stored token into a guest submission.
            None => request,
        };

        let response: CreateOrderResponse = fetch(request).await?;
        Ok(if response.duplicate {
            CreateOrderOutcome::Duplicate(response.order)
        } else {
            CreateOrderOutcome::Created(response.order)
        })
    }
}

async fn fetch<T: DeserializeOwned>(request: RequestBuilder) -> OrderingResult<T> {
    let response = request.send().await.map_err(transport_error)?;
    let status = response.status();

    if status.is_success() {
        // A success we cannot read may still have created state; retrying with
        // the same token is the safe recovery.
        let envelope: Envelope<T> = response.json().await.map_err(transport_error)?;
        return envelope
            .data
            .ok_or_else(|| OrderingError::NetworkFailure("response carried no data".into()));
    }

    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        return Err(OrderingError::NetworkFailure(format!("server answered {status}")));
    }

    let text = response.text().await.map_err(transport_error)?;
    let body = serde_json::from_str::<Envelope<ErrorBody>>(&text)
        .ok()
        .and_then(|envelope| envelope.data);

    Err(match body {
        Some(ErrorBody {
            code: Some(code),
            detail,
            error,
        }) => OrderingError::from_code(&code, detail.unwrap_or(error)),
        Some(ErrorBody { error, .. }) => status_error(status, error),
        None => status_error(status, text),
    })
}

fn status_error(status: StatusCode, message: String) -> OrderingError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => OrderingError::Unauthorized(message),
        _ => OrderingError::ValidationFailure(format!("{status}: {message}")),
    }
}

fn transport_error(err: reqwest::Error) -> OrderingError {
    OrderingError::NetworkFailure(err.to_string())
}
