//! Ict REST API client
//!
//! The node exposes a local control API over HTTP. Every endpoint is a POST
//! carrying the API password as a form field; the monitor only ever reads.
//!
//! ## Protocol
//!
//! 1. POST `http://{host}:{port}/{endpoint}` with form field `password`
//! 2. The node checks the password and answers with a JSON body
//! 3. Transport error, rejection, and undecodable body all count as "no data
//!    this cycle" for the caller

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::types::{NodeConfigInfo, NodeInfo, RemoteNeighbor};

/// Read access to the node's control API
///
/// `None` uniformly covers an unreachable node, a rejected password, and a
/// malformed response; callers cannot and should not tell them apart.
#[async_trait]
pub trait NodeApi: Send + Sync {
    async fn get_info(&self, port: u16, password: &str) -> Option<NodeInfo>;
    async fn get_config(&self, port: u16, password: &str) -> Option<NodeConfigInfo>;
    async fn get_neighbors(&self, port: u16, password: &str) -> Option<Vec<RemoteNeighbor>>;
}

/// HTTP implementation of [`NodeApi`]
pub struct NodeClient {
    client: reqwest::Client,
    host: String,
}

impl NodeClient {
    /// Create a client for a node reachable at `host`
    ///
    /// The timeout bounds every call; the node enforces the same bound on
    /// its side.
    pub fn new(host: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            host: host.to_string(),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        port: u16,
        password: &str,
    ) -> Option<T> {
        let url = format!("http://{}:{}/{}", self.host, port, endpoint);

        let response = match self
            .client
            .post(&url)
            .form(&[("password", password)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!("Request to {} failed: {}", url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            debug!("Node rejected {}: {}", url, response.status());
            return None;
        }

        match response.json::<T>().await {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Undecodable response from {}: {}", url, e);
                None
            }
        }
    }
}

#[async_trait]
impl NodeApi for NodeClient {
    async fn get_info(&self, port: u16, password: &str) -> Option<NodeInfo> {
        self.call("getInfo", port, password).await
    }

    async fn get_config(&self, port: u16, password: &str) -> Option<NodeConfigInfo> {
        self.call("getConfig", port, password).await
    }

    async fn get_neighbors(&self, port: u16, password: &str) -> Option<Vec<RemoteNeighbor>> {
        self.call("getNeighbors", port, password).await
    }
}
