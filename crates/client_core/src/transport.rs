use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use futures::{future, stream::BoxStream, StreamExt};
use reqwest::{Client, Response, StatusCode};
use shared::{
    domain::{NewWorkOrder, WorkOrder, WorkOrderId, WorkOrderPatch},
    error::ApiError,
    protocol::{WorkOrderEvent, EVENTS_ROUTE, HEALTH_ROUTE, WORK_ORDERS_ROUTE},
};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{info, warn};
use url::Url;

use crate::{error::StoreError, store::WorkOrderStore};

/// Talks to the work-order server over HTTP/JSON.
pub struct HttpWorkOrderStore {
    http: Client,
    server_url: String,
}

impl HttpWorkOrderStore {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: impl Into<String>) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        Self { http, server_url }
    }

    fn url(&self, route: &str) -> String {
        format!("{}{route}", self.server_url)
    }

    /// `/work_orders/<id>` with the id as one percent-encoded path segment,
    /// so ids such as `1?x` or `x/../2` cannot address another order.
    fn item_url(&self, id: &WorkOrderId) -> Result<Url> {
        let mut url = Url::parse(&self.url(WORK_ORDERS_ROUTE))
            .with_context(|| format!("invalid server url '{}'", self.server_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("server url '{}' cannot carry a path", self.server_url))?
            .push(id.as_str());
        Ok(url)
    }

    pub async fn health_check(&self) -> Result<()> {
        let response = self.http.get(self.url(HEALTH_ROUTE)).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }

    /// Streams mutation events pushed by the server until the socket closes.
    pub async fn watch_events(&self) -> Result<BoxStream<'static, WorkOrderEvent>> {
        let url = events_url(&self.server_url)?;
        let (socket, _) = connect_async(url.as_str())
            .await
            .with_context(|| format!("failed to connect to {url}"))?;
        info!(%url, "subscribed to work order events");

        let (_sink, stream) = socket.split();
        Ok(stream
            .take_while(|message| future::ready(message.is_ok()))
            .filter_map(|message| async move {
                let Ok(Message::Text(text)) = message else {
                    return None;
                };
                match serde_json::from_str::<WorkOrderEvent>(&text) {
                    Ok(event) => Some(event),
                    Err(error) => {
                        warn!(%error, "dropping undecodable event");
                        None
                    }
                }
            })
            .boxed())
    }
}

#[async_trait]
impl WorkOrderStore for HttpWorkOrderStore {
    async fn list(&self) -> Result<Vec<WorkOrder>> {
        let response = self.http.get(self.url(WORK_ORDERS_ROUTE)).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn create(&self, new: NewWorkOrder) -> Result<WorkOrder> {
        let response = self
            .http
            .post(self.url(WORK_ORDERS_ROUTE))
            .json(&new)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn update(&self, id: &WorkOrderId, patch: WorkOrderPatch) -> Result<Option<WorkOrder>> {
        if !addressable(id) {
            return Ok(None);
        }
        let response = self
            .http
            .patch(self.item_url(id)?)
            .json(&patch)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(Some(response.json().await?))
    }

    async fn delete(&self, id: &WorkOrderId) -> Result<bool> {
        if !addressable(id) {
            return Ok(false);
        }
        let response = self
            .http
            .delete(self.item_url(id)?)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(true)
    }
}

/// Ids that cannot be a single path segment never name a server-side order.
fn addressable(id: &WorkOrderId) -> bool {
    !matches!(id.as_str(), "" | "." | "..")
}

async fn api_error(response: Response) -> anyhow::Error {
    let status = response.status();
    let error = response
        .json::<ApiError>()
        .await
        .unwrap_or_else(|_| ApiError::internal(format!("unexpected status {status}")));
    warn!(%status, code = %error.code, message = %error.message, "request failed");
    StoreError::Api {
        status: status.as_u16(),
        error,
    }
    .into()
}

pub(crate) fn events_url(server_url: &str) -> Result<Url> {
    let mut url = Url::parse(server_url)
        .with_context(|| format!("invalid server url '{server_url}'"))?
        .join(EVENTS_ROUTE)?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => bail!("unsupported server url scheme '{other}'"),
    };
    url.set_scheme(scheme)
        .map_err(|_| anyhow!("cannot switch '{server_url}' to {scheme}"))?;
    Ok(url)
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
