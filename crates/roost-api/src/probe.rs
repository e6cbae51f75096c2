use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

/// Live reachability check for dossier verification links.
#[async_trait]
pub trait UrlProbe: Send + Sync {
    async fn is_reachable(&self, url: &Url) -> bool;
}

/// Issues a HEAD request; anything but a 2xx within the timeout counts as
/// unreachable.
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UrlProbe for HttpProbe {
    async fn is_reachable(&self, url: &Url) -> bool {
        match self.client.head(url.clone()).send().await {
            Ok(resp) => {
                debug!(%url, status = %resp.status(), "probed dossier url");
                resp.status().is_success()
            }
            Err(e) => {
                debug!(%url, "dossier url probe failed: {}", e);
                false
            }
        }
    }
}
