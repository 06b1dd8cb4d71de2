//! Push events: messages the backend sends without being asked.
//!
//! Two shapes are in circulation.  Newer notifications name the endpoint whose
//! value changed:
//!
//! ```json
//! {"subject": "accounts", "action": "reload"}
//! {"subject": "using-mobile-data", "action": "replace", "object": true}
//! ```
//!
//! Older device and account notifications use a `type`/`data` pair:
//!
//! ```json
//! {"type": "devices", "data": "registeredChanged"}
//! {"type": "device", "deviceID": "abc", "data": "statusChanged", "meta": null}
//! ```
//!
//! Anything else is still delivered as [`PushEvent::Other`]; subscribers decide
//! whether they care.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a subscriber should do with a [`SubjectEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventAction {
    /// The new value of `subject` is carried in `object`.
    Replace,
    /// The value of `subject` changed; GET it again.
    Reload,
    /// An action this client does not know, kept verbatim.
    Other(String),
}

impl From<String> for EventAction {
    fn from(value: String) -> Self {
        match value.as_str() {
            "replace" => EventAction::Replace,
            "reload" => EventAction::Reload,
            _ => EventAction::Other(value),
        }
    }
}

impl From<EventAction> for String {
    fn from(action: EventAction) -> Self {
        match action {
            EventAction::Replace => "replace".to_string(),
            EventAction::Reload => "reload".to_string(),
            EventAction::Other(other) => other,
        }
    }
}

/// A notification naming the endpoint (`subject`) whose value changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectEvent {
    pub subject: String,
    pub action: EventAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<Value>,
}

/// The older `{type, data}` notification shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    #[serde(rename = "deviceID", default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Account code, set on account notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Any unsolicited message from the backend.
///
/// Variants are tried in order, so an object carrying both `subject` and
/// `type` decodes as [`PushEvent::Subject`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PushEvent {
    Subject(SubjectEvent),
    Legacy(LegacyEvent),
    Other(Value),
}

impl PushEvent {
    /// Parses the raw JSON text of a push message.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Returns the subject for subject-style events.
    pub fn subject(&self) -> Option<&str> {
        match self {
            PushEvent::Subject(event) => Some(event.subject.as_str()),
            _ => None,
        }
    }

    /// Returns `true` when this is a subject event for `subject`.
    ///
    /// A leading `/` on either side is ignored; the backend emits both forms.
    pub fn is_about(&self, subject: &str) -> bool {
        match self.subject() {
            Some(own) => own.trim_start_matches('/') == subject.trim_start_matches('/'),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subject_reload_event() {
        // Arrange
        let text = r#"{"subject":"accounts","action":"reload"}"#;

        // Act
        let event = PushEvent::parse(text).unwrap();

        // Assert
        assert_eq!(event.subject(), Some("accounts"));
        match event {
            PushEvent::Subject(e) => {
                assert_eq!(e.action, EventAction::Reload);
                assert!(e.object.is_none());
            }
            other => panic!("expected subject event, got {other:?}"),
        }
    }

    #[test]
    fn test_subject_replace_event_keeps_object() {
        let text = r#"{"subject":"using-mobile-data","action":"replace","object":true}"#;

        let event = PushEvent::parse(text).unwrap();

        match event {
            PushEvent::Subject(e) => {
                assert_eq!(e.action, EventAction::Replace);
                assert_eq!(e.object, Some(json!(true)));
            }
            other => panic!("expected subject event, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_action_is_kept_verbatim() {
        let text = r#"{"subject":"aopp","action":"refresh"}"#;

        let event = PushEvent::parse(text).unwrap();

        match event {
            PushEvent::Subject(e) => assert_eq!(e.action, EventAction::Other("refresh".into())),
            other => panic!("expected subject event, got {other:?}"),
        }
    }

    #[test]
    fn test_legacy_device_event() {
        let text = r#"{"type":"device","deviceID":"abc","data":"statusChanged","meta":null}"#;

        let event = PushEvent::parse(text).unwrap();

        match event {
            PushEvent::Legacy(e) => {
                assert_eq!(e.kind, "device");
                assert_eq!(e.device_id.as_deref(), Some("abc"));
                assert_eq!(e.data, Some(json!("statusChanged")));
            }
            other => panic!("expected legacy event, got {other:?}"),
        }
        assert!(PushEvent::parse(text).unwrap().subject().is_none());
    }

    #[test]
    fn test_other_json_is_still_delivered() {
        let event = PushEvent::parse("[1,2,3]").unwrap();

        assert_eq!(event, PushEvent::Other(json!([1, 2, 3])));
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(PushEvent::parse("{not json").is_err());
    }

    #[test]
    fn test_is_about_ignores_leading_slash() {
        let event = PushEvent::parse(r#"{"subject":"/bitboxbases/x/event","action":"reload"}"#).unwrap();

        assert!(event.is_about("bitboxbases/x/event"));
        assert!(!event.is_about("accounts"));
    }
}
