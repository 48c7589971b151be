use std::time::Duration;

use reqwest_middleware::ClientWithMiddleware;
use reqwest_tracing::TracingMiddleware;

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    timeout_secs: u64,
}

impl HttpClientConfig {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    //every request carries this deadline, connecting gets at most 10s of it
    pub fn new_tracing_client(&self) -> anyhow::Result<ClientWithMiddleware> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout())
            .connect_timeout(self.timeout().min(Duration::from_secs(10)))
            .build()?;

        Ok(reqwest_middleware::ClientBuilder::new(client)
            .with(TracingMiddleware::default())
            .build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_timeout_never_exceeds_request_timeout() {
        let config = HttpClientConfig::new(4);

        assert_eq!(config.timeout(), Duration::from_secs(4));
        assert!(config.new_tracing_client().is_ok());
    }
}
