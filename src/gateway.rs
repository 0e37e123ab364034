use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{error, info};

use crate::{filter::FilterSet, vehicle::Vehicle};

pub const SEARCH_PATH: &str = "/mcp/buscar_veiculos/";
const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("cannot reach the inventory service at {url}: {source}")]
    Connection { url: String, source: reqwest::Error },
    #[error("the inventory service did not answer within {0:?}")]
    Timeout(Duration),
    #[error("the inventory service answered with status {status}: {body}")]
    Http { status: StatusCode, body: String },
    #[error("unexpected response from the inventory service: {0}")]
    InvalidResponse(String),
}

/// The search service as seen by the conversation.
#[async_trait]
pub trait QueryGateway: Send + Sync {
    async fn search(&self, filters: &FilterSet) -> Result<Vec<Vehicle>, GatewayError>;
}

/// Posts filters as a flat JSON object and reads back a JSON array of vehicles.
pub struct HttpGateway {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .build()?;
        let endpoint = format!("{}{SEARCH_PATH}", base_url.trim_end_matches('/'));
        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    fn classify(&self, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout(self.timeout)
        } else if err.is_connect() {
            GatewayError::Connection {
                url: self.endpoint.clone(),
                source: err,
            }
        } else {
            GatewayError::InvalidResponse(err.to_string())
        }
    }
}

#[async_trait]
impl QueryGateway for HttpGateway {
    async fn search(&self, filters: &FilterSet) -> Result<Vec<Vehicle>, GatewayError> {
        info!("Sending filters to {}: {}", self.endpoint, filters);

        let resp = self
            .client
            .post(&self.endpoint)
            .json(filters)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read response body: {e}>"));
            error!("Inventory service returned {status}: {body}");
            return Err(GatewayError::Http { status, body });
        }

        let body = resp.bytes().await.map_err(|e| self.classify(e))?;
        let vehicles: Vec<Vehicle> = serde_json::from_slice(&body)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        info!("Received {} vehicles", vehicles.len());
        Ok(vehicles)
    }
}
