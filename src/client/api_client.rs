use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::config::HTTP_TIMEOUT_SECS;
use crate::error::{AppError, Result};
use crate::types::{AccountList, QueryParams, QuerySpec, ResultPage};

/// HTTP transport for the polling client. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn fetch_page(&self, spec: &QuerySpec) -> Result<ResultPage> {
        let url = format!("{}/disabled", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&QueryParams::from(spec))
            .send()
            .await?;
        Self::decode(resp).await
    }

    pub async fn fetch_accounts(&self) -> Result<Vec<String>> {
        let url = format!("{}/accounts", self.base_url);
        let resp = self.http.get(&url).send().await?;
        let list: AccountList = Self::decode(resp).await?;
        Ok(list.accounts)
    }

    /// Transport errors stay `Http`; a body that does not match the schema is `Json`.
    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let body = Self::check(resp).await?.bytes().await?;
        parse_body(&body)
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(AppError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(body)?)
}
