//! reqwest-backed data source

use std::time::Duration;

use agro_core::{DeletedParcela, HistoricalPoint, Interval, ParcelaId, Snapshot};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::wire::SnapshotPayload;
use crate::{ClientError, ClientResult, DataSource};

/// HTTP client for the IoT snapshot API and the history API
pub struct HttpDataSource {
    client: Client,
    iot_base: Url,
    history_base: Url,
}

impl HttpDataSource {
    pub fn new(iot_base_url: &str, history_base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let iot_base = parse_base(iot_base_url)?;
        let history_base = parse_base(history_base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;
        Ok(Self {
            client,
            iot_base,
            history_base,
        })
    }

    fn snapshot_url(&self) -> ClientResult<Url> {
        // The snapshot endpoint is only served with its trailing slash
        endpoint(&self.iot_base, &["iotapp", ""])
    }

    fn history_url(
        &self,
        parcela_id: Option<ParcelaId>,
        days: u32,
        interval: Interval,
    ) -> ClientResult<Url> {
        let mut url = match parcela_id {
            Some(id) => {
                let id = id.to_string();
                endpoint(&self.history_base, &["history", "parcelas", id.as_str()])?
            }
            None => endpoint(&self.history_base, &["history", "sensors"])?,
        };
        url.query_pairs_mut()
            .append_pair("days", &days.to_string())
            .append_pair("interval", interval.as_str());
        Ok(url)
    }

    fn deleted_url(&self) -> ClientResult<Url> {
        endpoint(&self.history_base, &["parcelas", "deleted"])
    }

    #[instrument(skip(self, url), fields(url = %url))]
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ClientResult<T> {
        let resp = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "request failed");
                ClientError::Transport(e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%status, "non-success status");
            return Err(ClientError::Transport(format!("HTTP {}", status)));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        debug!(bytes = body.len(), "response received");

        serde_json::from_slice(&body).map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }
}

#[async_trait::async_trait]
impl DataSource for HttpDataSource {
    async fn fetch_snapshot(&self) -> ClientResult<Snapshot> {
        let payload: SnapshotPayload = self.get_json(self.snapshot_url()?).await?;
        payload.into_snapshot()
    }

    async fn fetch_history(
        &self,
        parcela_id: Option<ParcelaId>,
        days: u32,
        interval: Interval,
    ) -> ClientResult<Vec<HistoricalPoint>> {
        let url = self.history_url(parcela_id, days, interval)?;
        let mut points: Vec<HistoricalPoint> = self.get_json(url).await?;
        points.sort_by_key(|p| p.timestamp);
        Ok(points)
    }

    async fn fetch_deleted_parcelas(&self) -> ClientResult<Vec<DeletedParcela>> {
        self.get_json(self.deleted_url()?).await
    }
}

fn parse_base(raw: &str) -> ClientResult<Url> {
    let url = Url::parse(raw).map_err(|e| ClientError::InvalidConfig(format!("{}: {}", raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(ClientError::InvalidConfig(format!("not a base URL: {}", raw)));
    }
    Ok(url)
}

/// Append path segments to `base`, keeping any path prefix it already has
fn endpoint(base: &Url, segments: &[&str]) -> ClientResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ClientError::InvalidConfig(format!("not a base URL: {}", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
