use crate::domain::invoice::InvoiceId;
use crate::domain::ports::StatusSource;
use crate::domain::status::{Status, StatusPayload};
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Builds the HTTP client shared by the poll source and the event connector.
///
/// `timeout` bounds connect time and, for polls, the whole request. The event
/// stream is long-lived and only uses the connect bound.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .connect_timeout(timeout)
        .build()?;
    Ok(client)
}

/// Reads the current status with `GET {api_base}/api/invoice/{id}`.
#[derive(Debug, Clone)]
pub struct HttpStatusSource {
    http: reqwest::Client,
    url: Url,
    timeout: Duration,
}

impl HttpStatusSource {
    /// Creates a new source for `invoice` under `api_base`.
    ///
    /// `timeout` bounds each whole request.
    pub fn new(
        http: reqwest::Client,
        api_base: &Url,
        invoice: &InvoiceId,
        timeout: Duration,
    ) -> Result<Self> {
        let url = join_segments(api_base, &["api", "invoice", invoice.as_str()])?;
        Ok(Self { http, url, timeout })
    }

    /// The invoice URL every poll requests.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn fetch(&self) -> Result<Status> {
        let resp = self
            .http
            .get(self.url.clone())
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SyncError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.url.to_string(),
            });
        }

        let body = resp.text().await?;
        let payload = StatusPayload::parse(&body)?;
        Ok(payload.status)
    }
}

/// Appends path segments to `base`, keeping any path prefix it already has.
pub(crate) fn join_segments(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| SyncError::Config(format!("{base} cannot be used as a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
