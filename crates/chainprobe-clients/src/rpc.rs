//! Shared HTTP plumbing for the network clients.

use chainprobe_core::collaborator::Reachability;
use chainprobe_core::{CollaboratorError, NetworkId};
use tracing::debug;

/// Host part of a URL, for logs.
pub(crate) fn url_host(url: &str) -> &str {
    let without_scheme = url.split("://").nth(1).unwrap_or(url);
    without_scheme
        .split('/')
        .next()
        .filter(|host| !host.is_empty())
        .unwrap_or("unknown")
}

/// POSTs a JSON body and returns the decoded JSON response.
///
/// Non-2xx statuses become [`CollaboratorError::Rpc`] with the status code.
pub(crate) async fn post_json(
    http: &reqwest::Client,
    network: NetworkId,
    url: &str,
    body: &serde_json::Value,
) -> Result<serde_json::Value, CollaboratorError> {
    debug!(
        event = "rpc.request",
        network = %network,
        url_host = url_host(url),
        "posting request"
    );
    let response = http
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| CollaboratorError::transport(network, format!("request failed: {e}")))?;
    let status = response.status();
    if !status.is_success() {
        return Err(CollaboratorError::rpc(
            network,
            format!("{} API error: {}", network.label(), status.as_u16()),
            Some(status.as_u16()),
        ));
    }
    response
        .json()
        .await
        .map_err(|e| CollaboratorError::protocol(network, format!("invalid JSON response: {e}")))
}

/// Treats any HTTP answer from `url` as reachable.
pub struct HttpPing {
    http: reqwest::Client,
    network: NetworkId,
    method: reqwest::Method,
    url: String,
}

impl HttpPing {
    pub fn head(http: reqwest::Client, network: NetworkId, url: impl Into<String>) -> Self {
        Self {
            http,
            network,
            method: reqwest::Method::HEAD,
            url: url.into(),
        }
    }

    /// POSTs an empty JSON object, for endpoints that reject other methods.
    pub fn post(http: reqwest::Client, network: NetworkId, url: impl Into<String>) -> Self {
        Self {
            http,
            network,
            method: reqwest::Method::POST,
            url: url.into(),
        }
    }
}

#[async_trait::async_trait]
impl Reachability for HttpPing {
    async fn ping(&self) -> Result<(), CollaboratorError> {
        let mut request = self.http.request(self.method.clone(), &self.url);
        if self.method == reqwest::Method::POST {
            request = request.body("{}");
        }
        let response = request
            .send()
            .await
            .map_err(|e| CollaboratorError::transport(self.network, format!("fetch failed: {e}")))?;
        debug!(
            event = "rpc.ping",
            network = %self.network,
            url_host = url_host(&self.url),
            status = response.status().as_u16(),
            "endpoint answered"
        );
        Ok(())
    }
}
