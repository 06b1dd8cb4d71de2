//! Typed payloads of the backend endpoints the facade exposes.
//!
//! Field names follow the backend's camelCase JSON.  Fields the backend may
//! omit are `#[serde(default)]` so older backends still decode.

use serde::{Deserialize, Serialize};

/// Keystore information attached to each account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountKeystore {
    #[serde(default)]
    pub root_fingerprint: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub connected: bool,
}

/// One entry of `GET accounts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub code: String,
    pub name: String,
    pub coin_code: String,
    #[serde(default)]
    pub coin_unit: String,
    #[serde(default)]
    pub coin_name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub watch: bool,
    #[serde(default)]
    pub is_token: bool,
    #[serde(default)]
    pub keystore: Option<AccountKeystore>,
    #[serde(default)]
    pub block_explorer_tx_prefix: String,
}

/// One flag of `GET account/{code}/status`.  The endpoint returns a list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountStatus {
    AccountSynced,
    AccountDisabled,
    OfflineMode,
    #[serde(other)]
    Unknown,
}

/// A formatted amount: a decimal string plus its unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub amount: String,
    pub unit: String,
}

/// `GET account/{code}/balance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub available: Amount,
    pub incoming: Amount,
    #[serde(default)]
    pub has_incoming: bool,
}

/// One entry of `GET keystores`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystoreInfo {
    #[serde(rename = "type")]
    pub kind: String,
}

/// `GET update`; the backend answers `null` when no update is available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInfo {
    pub current_version: String,
    pub new_version: String,
    #[serde(default)]
    pub description: String,
}

/// Body of `POST notify-user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyUser {
    pub text: String,
}

/// Body of `POST open`: the backend expects a bare JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpenUrl(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_account_decodes_backend_shape() {
        // Arrange
        let wire = json!({
            "keystore": {"rootFingerprint": "f00d", "name": "My BitBox", "connected": true},
            "active": true,
            "bitsuranceStatus": "",
            "watch": false,
            "coinCode": "btc",
            "coinUnit": "BTC",
            "coinName": "Bitcoin",
            "code": "v0-f00d-btc-0",
            "name": "Bitcoin",
            "isToken": false,
            "blockExplorerTxPrefix": "https://example.invalid/tx/"
        });

        // Act
        let account: Account = serde_json::from_value(wire).unwrap();

        // Assert
        assert_eq!(account.code, "v0-f00d-btc-0");
        assert_eq!(account.coin_code, "btc");
        assert_eq!(account.keystore.map(|k| k.connected), Some(true));
    }

    #[test]
    fn test_account_status_unknown_flag() {
        let flags: Vec<AccountStatus> =
            serde_json::from_value(json!(["accountSynced", "somethingNew"])).unwrap();

        assert_eq!(flags, vec![AccountStatus::AccountSynced, AccountStatus::Unknown]);
    }

    #[test]
    fn test_balance_decodes() {
        let balance: Balance = serde_json::from_value(json!({
            "available": {"amount": "0.1", "unit": "BTC"},
            "incoming": {"amount": "0", "unit": "BTC"},
            "hasIncoming": false
        }))
        .unwrap();

        assert_eq!(balance.available.amount, "0.1");
        assert!(!balance.has_incoming);
    }

    #[test]
    fn test_open_url_is_bare_string() {
        let body = serde_json::to_value(OpenUrl("https://example.invalid".into())).unwrap();

        assert_eq!(body, json!("https://example.invalid"));
    }

    #[test]
    fn test_update_null_is_none() {
        let update: Option<UpdateInfo> = serde_json::from_value(serde_json::Value::Null).unwrap();

        assert!(update.is_none());
    }
}
