use anyhow::{Context, bail};
use infrastructure::HttpClientConfig;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::Value;

use crate::port::WeatherApi;

#[derive(Debug, Clone, Deserialize)]
pub struct AerisSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://api.aerisapi.com/".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl AerisSettings {
    pub fn new_client(&self) -> anyhow::Result<AerisClient> {
        let client = HttpClientConfig::new(self.timeout_secs).new_tracing_client()?;
        Ok(AerisClient { client })
    }
}

#[derive(Debug, Clone)]
pub struct AerisClient {
    client: ClientWithMiddleware,
}

impl WeatherApi for AerisClient {
    async fn fetch(&self, url: &str) -> anyhow::Result<Value> {
        let response = self.client.get(url).send().await.context("HTTP request to Aeris failed")?;

        let status = response.status();
        let doc = response
            .json::<Value>()
            .await
            .with_context(|| format!("Error parsing Aeris response ({})", status))?;

        check_envelope(doc)
    }
}

/// Aeris reports failures in the body as `{"success": false, "error": {...}}`.
fn check_envelope(doc: Value) -> anyhow::Result<Value> {
    if doc.get("success").and_then(Value::as_bool) == Some(false) {
        let description = doc
            .get("error")
            .and_then(|e| e.get("description"))
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        bail!("Aeris query returned no data: {}", description);
    }

    Ok(doc)
}
