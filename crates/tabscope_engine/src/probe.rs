use std::time::Duration;

use async_trait::async_trait;
use tabscope_core::ProbeFailure;

/// Issues one lightweight request and reports the immediate status.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, url: &str) -> Result<u16, ProbeFailure>;
}

/// `HEAD` prober that never follows redirects, so 3xx codes are reported as-is.
#[derive(Debug, Clone)]
pub struct ReqwestProber {
    client: reqwest::Client,
}

impl ReqwestProber {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Prober for ReqwestProber {
    async fn probe(&self, url: &str) -> Result<u16, ProbeFailure> {
        let parsed = reqwest::Url::parse(url).map_err(|_| ProbeFailure::Network)?;
        let response = self
            .client
            .head(parsed)
            .send()
            .await
            .map_err(|err| classify(&err))?;
        Ok(response.status().as_u16())
    }
}

fn classify(err: &reqwest::Error) -> ProbeFailure {
    if err.is_timeout() {
        return ProbeFailure::Timeout;
    }
    if err.is_connect() || err.is_request() || err.is_builder() {
        return ProbeFailure::Network;
    }
    ProbeFailure::Other
}
