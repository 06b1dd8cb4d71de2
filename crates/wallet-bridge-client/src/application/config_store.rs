//! Single-writer store for partial app-config updates.
//!
//! The backend only offers "read whole config" and "replace whole config".
//! Two callers doing read-merge-write at the same time would each post a
//! config missing the other's change.  `ConfigStore` runs every write through
//! one actor task:
//!
//! ```text
//! set_config(patch) ──▶ queue ──▶ actor: drain queue
//!                                        GET config        (once)
//!                                        merge patches     (arrival order)
//!                                        POST config       (once)
//!                                        answer every drained caller
//! ```

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use wallet_bridge_core::{AppConfig, ConfigPatch};

use crate::application::api::WalletApi;
use crate::application::client::ClientError;

struct SetRequest {
    patch: ConfigPatch,
    reply: oneshot::Sender<Result<AppConfig, ClientError>>,
}

/// Handle to the config writer task.  Clones share the same task.
///
/// The task stops once every handle is dropped.
#[derive(Clone)]
pub struct ConfigStore {
    api: WalletApi,
    requests: mpsc::UnboundedSender<SetRequest>,
}

impl ConfigStore {
    /// Starts the writer task on the current tokio runtime.
    pub fn spawn(api: WalletApi) -> Self {
        let (requests, queue) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(api.clone(), queue));
        Self { api, requests }
    }

    /// The stored config as the backend has it now.
    pub async fn get_config(&self) -> Result<AppConfig, ClientError> {
        self.api.get_config().await
    }

    /// Merges `patch` into the stored config and returns the config that was
    /// written.
    ///
    /// Patches queued together are written together, so the returned config
    /// may also contain other callers' changes.
    ///
    /// # Errors
    ///
    /// The error of the read or write that failed (shared by every patch in
    /// the same batch), or [`ClientError::Closed`] if the writer has stopped.
    pub async fn set_config(&self, patch: ConfigPatch) -> Result<AppConfig, ClientError> {
        let (reply, answer) = oneshot::channel();
        self.requests
            .send(SetRequest { patch, reply })
            .map_err(|_| ClientError::Closed)?;
        answer.await.map_err(|_| ClientError::Closed)?
    }
}

async fn run_writer(api: WalletApi, mut queue: mpsc::UnboundedReceiver<SetRequest>) {
    while let Some(first) = queue.recv().await {
        let mut batch = vec![first];
        while let Ok(next) = queue.try_recv() {
            batch.push(next);
        }

        let mut combined = ConfigPatch::default();
        for request in &batch {
            combined.absorb(request.patch.clone());
        }
        debug!(patches = batch.len(), "writing app config");

        let outcome = write_merged(&api, &combined).await;
        if let Err(e) = &outcome {
            warn!(patches = batch.len(), "app config update failed: {e}");
        }
        for request in batch {
            // A caller that stopped waiting no longer needs the answer.
            let _ = request.reply.send(outcome.clone());
        }
    }
    debug!("config writer stopped");
}

async fn write_merged(api: &WalletApi, patch: &ConfigPatch) -> Result<AppConfig, ClientError> {
    let merged = api.get_config().await?.merged(patch);
    api.put_config(&merged).await?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::client::BridgeClient;
    use crate::domain::ClientConfig;
    use crate::infrastructure::transport::mock::MockTransport;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use wallet_bridge_core::{BackendError, Method};

    /// A backend that stores whatever config is posted to it.
    fn config_backend(initial: Value) -> MockTransport {
        let stored = Arc::new(Mutex::new(initial));
        MockTransport::new(move |q| {
            let mut stored = stored.lock().unwrap();
            match (q.method, q.endpoint.as_str()) {
                (Method::Get, "config") => Some(stored.clone()),
                (Method::Post, "config") => {
                    *stored = q.body.clone().unwrap_or(Value::Null);
                    Some(Value::Null)
                }
                _ => Some(json!({"error": "unknown endpoint"})),
            }
        })
    }

    async fn store_for(mock: MockTransport) -> (ConfigStore, Arc<MockTransport>) {
        let mock = Arc::new(mock);
        let client = BridgeClient::new(mock.clone(), ClientConfig::default());
        client.connect().await.unwrap();
        (ConfigStore::spawn(WalletApi::new(client)), mock)
    }

    fn frontend(key: &str, value: Value) -> ConfigPatch {
        let mut patch = ConfigPatch::default();
        patch.set("frontend", key, value);
        patch
    }

    #[tokio::test]
    async fn test_set_config_keeps_untouched_keys() {
        // Arrange
        let (store, _mock) = store_for(config_backend(json!({
            "backend": {"proxy": {"useProxy": false}},
            "frontend": {"theme": "dark"}
        })))
        .await;

        // Act
        let written = store.set_config(frontend("language", json!("de"))).await.unwrap();

        // Assert
        assert_eq!(written.get("frontend", "theme"), Some(&json!("dark")));
        assert_eq!(written.get("frontend", "language"), Some(&json!("de")));
        assert_eq!(written, store.get_config().await.unwrap());
    }

    #[tokio::test]
    async fn test_overlapping_writers_lose_nothing() {
        let (store, _mock) = store_for(config_backend(json!({"backend": {}, "frontend": {}}))).await;

        let (a, b) = tokio::join!(
            store.set_config(frontend("a", json!(1))),
            store.set_config(frontend("b", json!(2))),
        );

        assert!(a.is_ok() && b.is_ok());
        let stored = store.get_config().await.unwrap();
        assert_eq!(stored.get("frontend", "a"), Some(&json!(1)));
        assert_eq!(stored.get("frontend", "b"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn test_failed_read_is_shared_by_the_batch() {
        let (store, mock) =
            store_for(MockTransport::new(|_q| Some(json!({"error": "backend busy"})))).await;

        let result = store.set_config(frontend("a", json!(1))).await;

        assert_eq!(
            result,
            Err(ClientError::Backend(BackendError::Reported("backend busy".into())))
        );
        // No write after a failed read.
        assert!(mock.calls().iter().all(|(_, q)| q.method == Method::Get));
    }
}
