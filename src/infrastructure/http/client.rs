//! REST adapter for the billing backend

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::errors::{classify_response, classify_transport};
use crate::config::ApiConfig;
use crate::domain::{Bill, BillableConnection, BillingApi, NewBill, Rate, RemoteResult};
use crate::shared::errors::{ConfigError, RemoteError, RemoteErrorKind};

const BILLINGS_PATH: &str = "billings";
const BILLABLE_CONNECTIONS_PATH: &str = "connections/billable";
const ACTIVE_RATE_PATH: &str = "rates/active";

/// [`BillingApi`] over HTTP/JSON
pub struct HttpBillingApi {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpBillingApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::Invalid(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone().filter(|t| !t.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self.client.request(method, self.url(path));
        match &self.auth_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> RemoteResult<T> {
        let response = req.send().await.map_err(|e| classify_transport(&e))?;
        let status = response.status();
        debug!(call = what, status = status.as_u16(), "Billing backend responded");

        if status.is_success() {
            return response.json::<T>().await.map_err(|e| {
                RemoteError::new(
                    RemoteErrorKind::Unknown,
                    format!("unexpected {} response body: {}", what, e),
                )
                .with_status(status.as_u16())
            });
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_response(status.as_u16(), &body))
    }
}

#[async_trait]
impl BillingApi for HttpBillingApi {
    async fn create_bill(&self, bill: &NewBill) -> RemoteResult<Bill> {
        let req = self.request(Method::POST, BILLINGS_PATH).json(bill);
        self.send(req, "create_bill").await
    }

    async fn list_billable_connections(&self) -> RemoteResult<Vec<BillableConnection>> {
        let req = self.request(Method::GET, BILLABLE_CONNECTIONS_PATH);
        self.send(req, "list_billable_connections").await
    }

    async fn list_bills(&self) -> RemoteResult<Vec<Bill>> {
        let req = self.request(Method::GET, BILLINGS_PATH);
        self.send(req, "list_bills").await
    }

    async fn active_rate(&self) -> RemoteResult<Rate> {
        let req = self.request(Method::GET, ACTIVE_RATE_PATH);
        self.send(req, "active_rate").await
    }
}
