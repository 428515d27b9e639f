//! [Doc](https://developer.apple.com/documentation/appstoreconnectapi)

pub use apple_app_store_connect_api_token;
pub use reqwest::Method;
pub use serde_json::Value;

use apple_app_store_connect_api_token::{CreateError, Credentials};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, warn};

pub const BASE_URL: &str = "https://api.appstoreconnect.apple.com/v1";

//
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("token: {0}")]
    Token(#[from] CreateError),

    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One JSON request against the App Store Connect API.
///
/// `Ok(None)` means the server answered 2xx with an empty body.
#[async_trait]
pub trait Requester: Send + Sync {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>, RequestError>;

    async fn get(&self, path: &str) -> Result<Option<Value>, RequestError> {
        self.request(Method::GET, path, None).await
    }

    async fn patch(&self, path: &str, body: &Value) -> Result<Option<Value>, RequestError> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Option<Value>, RequestError> {
        self.request(Method::POST, path, Some(body)).await
    }
}

//
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    token: Box<str>,
    base_url: Box<str>,
}

impl Client {
    /// Signs a fresh token; it stays valid for the lifetime of one run.
    pub fn new(credentials: &Credentials) -> Result<Self, RequestError> {
        let token = credentials.sign(None, None)?;
        Ok(Self::with_token(token))
    }

    pub fn with_token(token: impl AsRef<str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.as_ref().into(),
            base_url: BASE_URL.into(),
        }
    }

    pub fn base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.base_url = base_url.as_ref().trim_end_matches('/').into();
        self
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_owned()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl Requester for Client {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>, RequestError> {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let mut builder = self
            .http
            .request(method, &url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!("HTTP {}: {}", status.as_u16(), text);
            return Err(RequestError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }
}
