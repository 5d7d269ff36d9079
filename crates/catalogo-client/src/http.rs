//! Shared HTTP plumbing for catalog clients.
//!
//! One GET per call, no retries. Failures map onto [`AppError`]:
//!
//! | Failure            | Error                         |
//! |--------------------|-------------------------------|
//! | timeout            | [`AppError::Timeout`]         |
//! | connection refused | [`AppError::NetworkError`]    |
//! | HTTP 404           | [`AppError::NotFound`]        |
//! | other non-2xx      | [`AppError::ClientError`]     |
//! | body is not JSON   | [`AppError::SerializationError`] |

use catalogo_core::HttpConfig;
use catalogo_core::error::AppError;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

/// Header carrying the Socrata app token.
pub const APP_TOKEN_HEADER: &str = "X-App-Token";

/// Cheaply clonable HTTP client shared by every catalog client of a run.
#[derive(Clone)]
pub struct CatalogHttp {
    client: Client,
    timeout_secs: u64,
}

impl CatalogHttp {
    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ClientError` if the HTTP client cannot be built.
    pub fn new(config: &HttpConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::ClientError(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs: config.timeout.as_secs(),
        })
    }

    /// GETs `url` and decodes the JSON body.
    ///
    /// `label` names the resource in [`AppError::NotFound`] (a domain or a
    /// base URL). `app_token` is sent as [`APP_TOKEN_HEADER`] when present.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        label: &str,
        app_token: Option<&str>,
    ) -> Result<T, AppError> {
        let mut request = self.client.get(url.clone());
        if let Some(token) = app_token {
            request = request.header(APP_TOKEN_HEADER, token);
        }

        let resp = request.send().await.map_err(|e| self.map_send_error(e))?;
        if let Some(err) = status_error(resp.status(), label, &url) {
            return Err(err);
        }

        let body = resp
            .text()
            .await
            .map_err(|e| self.map_send_error(e))?;
        Ok(serde_json::from_str(&body)?)
    }

    fn map_send_error(&self, e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            AppError::NetworkError(format!("Connection failed: {}", e))
        } else {
            AppError::ClientError(e.to_string())
        }
    }
}

/// Maps a response status onto the error it stands for, `None` on 2xx.
pub fn status_error(status: StatusCode, label: &str, url: &Url) -> Option<AppError> {
    if status == StatusCode::NOT_FOUND {
        Some(AppError::NotFound(label.to_string()))
    } else if !status.is_success() {
        Some(AppError::ClientError(format!(
            "HTTP {} from {}",
            status.as_u16(),
            url
        )))
    } else {
        None
    }
}

/// Parses `raw` as an absolute HTTP(S) URL.
pub fn parse_base_url(raw: &str) -> Result<Url, AppError> {
    let url = Url::parse(raw.trim()).map_err(|_| AppError::InvalidUrl(raw.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(AppError::InvalidUrl(raw.to_string())),
    }
}
