//! Attribute inference clients
//!
//! Each external service answers `GET <endpoint>?name=<given name>` with a small
//! JSON document. One generic HTTP client covers all three services; the
//! response type decides how the body is decoded.
//!
//! API documentation: https://agify.io, https://genderize.io, https://nationalize.io

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::marker::PhantomData;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

use people_common::Gender;

/// Failure of a single attribute lookup
#[derive(Debug, Error)]
pub enum AttributeError {
    /// Network failure (connect, reset, TLS)
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// Service answered with a non-2xx status
    #[error("service returned HTTP {0}")]
    Status(u16),

    /// Body could not be decoded into the expected shape
    #[error("malformed response: {0}")]
    Decode(#[source] serde_json::Error),

    /// Call exceeded its deadline
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// Configured endpoint is not a usable URL
    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),
}

/// Age service response: `{"age": 42}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AgeResponse {
    #[serde(default)]
    pub age: Option<i64>,
}

/// Gender service response: `{"gender": "male", "probability": 0.98}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GenderResponse {
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub probability: Option<f64>,
}

/// Nationality service response: `{"country": [{"country_id": "RU", "probability": 0.6}]}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NationalityResponse {
    #[serde(default)]
    pub country: Vec<CountryCandidate>,
}

/// One ranked nationality candidate
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CountryCandidate {
    #[serde(default)]
    pub country_id: String,
    #[serde(default)]
    pub probability: f64,
}

/// Looks up one inferred attribute for a given name
#[async_trait]
pub trait AttributeClient: Send + Sync {
    /// Decoded service response
    type Response: Send + 'static;

    /// Attribute name used in logs ("age", "gender", "nationality")
    fn attribute(&self) -> &'static str;

    /// Query the service with the given name only
    async fn fetch(&self, given_name: &str) -> Result<Self::Response, AttributeError>;
}

/// reqwest-backed client for one attribute service
pub struct HttpAttributeClient<R> {
    attribute: &'static str,
    client: Client,
    endpoint: Url,
    timeout: Duration,
    _response: PhantomData<fn() -> R>,
}

impl<R> HttpAttributeClient<R> {
    /// Build a client for `endpoint` with a per-call deadline
    pub fn new(
        attribute: &'static str,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<Self, AttributeError> {
        let endpoint =
            Url::parse(endpoint).map_err(|_| AttributeError::InvalidEndpoint(endpoint.to_string()))?;

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!("people-info/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(AttributeError::Request)?;

        Ok(Self {
            attribute,
            client,
            endpoint,
            timeout,
            _response: PhantomData,
        })
    }
}

#[async_trait]
impl<R> AttributeClient for HttpAttributeClient<R>
where
    R: DeserializeOwned + Send + 'static,
{
    type Response = R;

    fn attribute(&self) -> &'static str {
        self.attribute
    }

    async fn fetch(&self, given_name: &str) -> Result<R, AttributeError> {
        debug!(attribute = self.attribute, given_name, "Querying attribute service");

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("name", given_name)])
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttributeError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        serde_json::from_slice(&body).map_err(AttributeError::Decode)
    }
}

impl<R> HttpAttributeClient<R> {
    fn classify(&self, err: reqwest::Error) -> AttributeError {
        if err.is_timeout() {
            AttributeError::Timeout(self.timeout)
        } else {
            AttributeError::Request(err)
        }
    }
}
