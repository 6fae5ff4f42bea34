use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::GeoConfig;

/// External geolocation lookup. Returns the provider's JSON untouched.
#[async_trait]
pub trait GeoProvider: Send + Sync {
    async fn lookup(&self, ip: &str) -> anyhow::Result<Value>;
}

/// ipinfo.io client: `GET {base_url}/{ip}/geo`.
#[derive(Clone)]
pub struct IpInfoProvider {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl IpInfoProvider {
    pub fn new(cfg: &GeoConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("build geo http client")?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            token: cfg.token.clone(),
        })
    }
}

#[async_trait]
impl GeoProvider for IpInfoProvider {
    async fn lookup(&self, ip: &str) -> anyhow::Result<Value> {
        let url = format!("{}/{}/geo", self.base_url, ip);
        let mut req = self.client.get(&url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let res = req
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url}"))?;
        let body = res.json::<Value>().await.context("decode geo response")?;
        debug!(%ip, "geo lookup ok");
        Ok(body)
    }
}
