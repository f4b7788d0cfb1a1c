//! HTTP status probe backed by reqwest

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use webinstall_core::{HttpProbe, InstallResult};

use crate::error::BrowserResult;

/// Issues plain GET requests and reports the status code, whatever it is.
#[derive(Debug, Clone)]
pub struct ReqwestProbe {
    client: reqwest::Client,
}

impl ReqwestProbe {
    pub fn new(timeout: Duration) -> BrowserResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }

    async fn fetch_status(&self, url: &str) -> BrowserResult<u16> {
        let resp = self.client.get(url).send().await?;
        Ok(resp.status().as_u16())
    }
}

#[async_trait]
impl HttpProbe for ReqwestProbe {
    async fn status(&self, url: &str) -> InstallResult<u16> {
        let status = self.fetch_status(url).await?;
        debug!("GET {} -> {}", url, status);
        Ok(status)
    }
}
