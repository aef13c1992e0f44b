//! Ultimate Guitar API client.
//!
//! Talks to the JSON API used by the site's mobile app.
//!
//! - **Endpoints**: `GET /tab/search` and `GET /tab/info`
//! - **Authentication**: `X-UG-CLIENT-ID` carries a random per-client device
//!   id; `X-UG-API-KEY` is the hex MD5 of device id, the current UTC
//!   `YYYY-MM-DD:H` and the literal `createLog()`. The key is recomputed on
//!   every request since it rolls over each hour.
//! - **Empty searches**: the API answers 404 when nothing matches; that is
//!   reported as an empty hit list.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use reqwest::{header, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::{SearchParams, TabDocument, TabHit, TabSource, UpstreamError};

/// Default base URL for the mobile API.
const DEFAULT_BASE_URL: &str = "https://api.ultimate-guitar.com/api/v1";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// User agent the API expects from its Android client.
const DEFAULT_USER_AGENT: &str = "UGT_ANDROID/4.11.1 (Pixel; 8.1.0)";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct UltimateGuitarConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for UltimateGuitarConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    tabs: Vec<TabHit>,
}

/// [`TabSource`] backed by the Ultimate Guitar API.
#[derive(Debug, Clone)]
pub struct UltimateGuitarClient {
    http: reqwest::Client,
    config: UltimateGuitarConfig,
    device_id: String,
}

impl UltimateGuitarClient {
    pub fn new(config: UltimateGuitarConfig) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            config,
            device_id: generate_device_id(),
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url, path);
        self.http
            .get(url)
            .header(header::ACCEPT, "application/json")
            .header(header::ACCEPT_CHARSET, "utf-8")
            .header(header::USER_AGENT, &self.config.user_agent)
            .header("X-UG-CLIENT-ID", &self.device_id)
            .header("X-UG-API-KEY", api_key(&self.device_id, Utc::now()))
    }
}

#[async_trait]
impl TabSource for UltimateGuitarClient {
    async fn search(&self, params: &SearchParams) -> Result<Vec<TabHit>, UpstreamError> {
        debug!(
            "searching tabs: title={} type={}",
            params.title, params.tab_type
        );

        let response = self
            .get("/tab/search")
            .query(&[
                ("title", params.title.clone()),
                ("page", params.page.to_string()),
                ("type[]", params.tab_type.code().to_string()),
            ])
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            status if status.is_success() => {
                let envelope: SearchEnvelope = response.json().await?;
                Ok(envelope.tabs)
            }
            status => Err(UpstreamError::Status {
                status: status.as_u16(),
                context: format!("search '{}'", params.title),
            }),
        }
    }

    async fn fetch_tab(&self, id: i64) -> Result<TabDocument, UpstreamError> {
        debug!("fetching tab {}", id);

        let response = self
            .get("/tab/info")
            .query(&[
                ("tab_id", id.to_string()),
                ("tab_access_type", "private".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                context: format!("tab {}", id),
            });
        }

        Ok(response.json().await?)
    }
}

/// Sixteen lowercase hex characters, like an Android device id.
fn generate_device_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..16].to_string()
}

fn api_key(device_id: &str, now: DateTime<Utc>) -> String {
    let payload = format!("{}{}createLog()", device_id, now.format("%Y-%m-%d:%-H"));
    hex::encode(Md5::digest(payload.as_bytes()))
}
