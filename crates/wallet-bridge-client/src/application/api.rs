//! `WalletApi`: typed access to the backend endpoints.
//!
//! Every operation goes through the same path:
//!
//! ```text
//! BridgeClient::call ─▶ classify ─▶ serde_json::from_value::<T>
//! ```
//!
//! so a backend `{"error": "..."}` always surfaces as
//! [`ClientError::Backend`], never as a value of `T` that merely looks empty.
//! Failures are handed to the configured [`ErrorReporter`] before being
//! returned; whether anything is shown to the user is the reporter's call.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::error;
use wallet_bridge_core::domain::dto::{
    Account, AccountStatus, Balance, KeystoreInfo, NotifyUser, OpenUrl, UpdateInfo,
};
use wallet_bridge_core::{classify, AppConfig, Query, SuccessResponse};

#[cfg(test)]
use mockall::automock;

use crate::application::client::{BridgeClient, ClientError};

/// Receives every error a [`WalletApi`] operation is about to return.
#[cfg_attr(test, automock)]
pub trait ErrorReporter: Send + Sync {
    fn report(&self, endpoint: &str, error: &ClientError);
}

/// Reports errors to the log at `error` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, endpoint: &str, error: &ClientError) {
        error!(endpoint, "backend request failed: {error}");
    }
}

/// Typed facade over a [`BridgeClient`].
#[derive(Clone)]
pub struct WalletApi {
    client: BridgeClient,
    reporter: Option<Arc<dyn ErrorReporter>>,
}

impl WalletApi {
    /// A facade that returns errors without reporting them anywhere.
    pub fn new(client: BridgeClient) -> Self {
        Self {
            client,
            reporter: None,
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn client(&self) -> &BridgeClient {
        &self.client
    }

    // ── Generic operations ────────────────────────────────────────────────────

    /// `GET endpoint`, decoded into `T`.
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ClientError> {
        self.request(Query::get(endpoint)).await
    }

    /// `POST endpoint` with `body` as JSON, decoded into `T`.
    pub async fn post<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body).map_err(|e| {
            self.reported(
                endpoint,
                ClientError::Decode {
                    endpoint: endpoint.to_string(),
                    reason: format!("request body: {e}"),
                },
            )
        })?;
        self.request(Query::post(endpoint, Some(body))).await
    }

    /// `POST endpoint` without a body.
    pub async fn post_empty<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ClientError> {
        self.request(Query::post(endpoint, None)).await
    }

    async fn request<T: DeserializeOwned>(&self, query: Query) -> Result<T, ClientError> {
        let endpoint = query.endpoint.clone();
        let outcome = async {
            let value = classify(self.client.call(query).await?)?;
            serde_json::from_value(value).map_err(|e| ClientError::Decode {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })
        }
        .await;
        outcome.map_err(|e| self.reported(&endpoint, e))
    }

    fn reported(&self, endpoint: &str, error: ClientError) -> ClientError {
        if let Some(reporter) = &self.reporter {
            reporter.report(endpoint, &error);
        }
        error
    }

    // ── Accounts ──────────────────────────────────────────────────────────────

    pub async fn accounts(&self) -> Result<Vec<Account>, ClientError> {
        self.get("accounts").await
    }

    /// Status flags of one account; an empty list means "still syncing".
    pub async fn account_status(&self, code: &str) -> Result<Vec<AccountStatus>, ClientError> {
        self.get(&format!("account/{code}/status")).await
    }

    pub async fn account_balance(&self, code: &str) -> Result<Balance, ClientError> {
        self.get(&format!("account/{code}/balance")).await
    }

    /// Asks the backend to (re)initialise an account.
    ///
    /// A `{"success": false, ...}` answer becomes [`ClientError::Backend`].
    pub async fn account_init(&self, code: &str) -> Result<(), ClientError> {
        let endpoint = format!("account/{code}/init");
        let answer: Value = self.post_empty(&endpoint).await?;
        if answer.get("success").is_none() {
            return Ok(());
        }
        serde_json::from_value::<SuccessResponse<Map<String, Value>>>(answer)
            .map_err(|e| ClientError::Decode {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })
            .and_then(|envelope| envelope.into_result().map_err(ClientError::from))
            .map(|_| ())
            .map_err(|e| self.reported(&endpoint, e))
    }

    // ── Backend and device info ───────────────────────────────────────────────

    pub async fn keystores(&self) -> Result<Vec<KeystoreInfo>, ClientError> {
        self.get("keystores").await
    }

    pub async fn version(&self) -> Result<String, ClientError> {
        self.get("version").await
    }

    /// Whether the backend runs against test networks.
    pub async fn testing(&self) -> Result<bool, ClientError> {
        self.get("testing").await
    }

    pub async fn native_locale(&self) -> Result<String, ClientError> {
        self.get("native-locale").await
    }

    /// `None` when the running version is current.
    pub async fn check_update(&self) -> Result<Option<UpdateInfo>, ClientError> {
        self.get("update").await
    }

    // ── Host actions ──────────────────────────────────────────────────────────

    pub async fn notify_user(&self, text: &str) -> Result<(), ClientError> {
        let body = NotifyUser {
            text: text.to_string(),
        };
        self.post::<_, Value>("notify-user", &body).await.map(drop)
    }

    /// Opens `url` in the system browser (the backend filters what it allows).
    pub async fn open_url(&self, url: &str) -> Result<(), ClientError> {
        self.post::<_, Value>("open", &OpenUrl(url.to_string()))
            .await
            .map(drop)
    }

    // ── App config ────────────────────────────────────────────────────────────

    pub async fn get_config(&self) -> Result<AppConfig, ClientError> {
        self.get("config").await
    }

    pub async fn get_default_config(&self) -> Result<AppConfig, ClientError> {
        self.get("config/default").await
    }

    /// Replaces the whole stored config.  For partial updates use
    /// [`ConfigStore::set_config`](crate::ConfigStore::set_config).
    pub async fn put_config(&self, config: &AppConfig) -> Result<(), ClientError> {
        self.post::<_, Value>("config", config).await.map(drop)
    }
}
