//! Clinic notification feed.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::store::Reducer;

/// A notification shown in the navbar dropdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Backend id; numeric ids are kept as their decimal text
    #[serde(deserialize_with = "id_text")]
    pub id: String,
    #[serde(default)]
    pub is_read: bool,
    /// Template-specific fields (type, title, payload, ...)
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

fn id_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "notification id must be a string or number, got {}",
            other
        ))),
    }
}

impl Notification {
    /// Create an unread notification.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Parse a fetched notification list.
///
/// The endpoint answers either with a bare array or with
/// `{ "notifications": [...] }`; entries that do not parse are skipped.
pub fn parse_feed(response: &Value) -> Vec<Notification> {
    let items = match response {
        Value::Array(items) => items.as_slice(),
        Value::Object(obj) => match obj.get("notifications") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };

    items
        .iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(n) => Some(n),
            Err(e) => {
                log::warn!("Skipping malformed notification: {}", e);
                None
            }
        })
        .collect()
}

/// Notifications, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationState {
    pub notifications: Vec<Notification>,
    pub loading: bool,
}

impl NotificationState {
    /// Number of unread notifications.
    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.is_read).count()
    }

    /// Find a notification by id.
    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.id == id)
    }
}

/// Actions accepted by [`NotificationState`].
#[derive(Debug, Clone)]
pub enum NotificationAction {
    FetchStarted,
    /// Replace the feed with a fetched list
    Replace(Vec<Notification>),
    FetchFailed,
    /// Prepend a notification
    Add(Notification),
    /// Prepend a pushed notification unless its id is already present
    AddFromSocket(Notification),
    /// Shallow-merge fields into a notification
    UpdateStatus {
        id: String,
        fields: Map<String, Value>,
    },
    Remove(String),
    MarkAsRead(String),
    Clear,
}

impl Reducer for NotificationState {
    type Action = NotificationAction;

    fn reduce(&mut self, action: NotificationAction) {
        match action {
            NotificationAction::FetchStarted => self.loading = true,
            NotificationAction::Replace(notifications) => {
                self.notifications = notifications;
                self.loading = false;
            }
            NotificationAction::FetchFailed => self.loading = false,
            NotificationAction::Add(notification) => self.notifications.insert(0, notification),
            NotificationAction::AddFromSocket(notification) => {
                if self.get(&notification.id).is_some() {
                    log::debug!("Notification {} already present", notification.id);
                    return;
                }
                self.notifications.insert(0, notification);
            }
            NotificationAction::UpdateStatus { id, mut fields } => {
                let Some(n) = self.notifications.iter_mut().find(|n| n.id == id) else {
                    return;
                };
                if let Some(is_read) = fields.remove("is_read").and_then(|v| v.as_bool()) {
                    n.is_read = is_read;
                }
                fields.remove("id");
                n.fields.extend(fields);
            }
            NotificationAction::Remove(id) => self.notifications.retain(|n| n.id != id),
            NotificationAction::MarkAsRead(id) => {
                if let Some(n) = self.notifications.iter_mut().find(|n| n.id == id) {
                    n.is_read = true;
                }
            }
            NotificationAction::Clear => self.notifications.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_feed_shapes() {
        let bare = json!([{ "id": "1", "type": "invitation" }, { "id": "2", "is_read": true }]);
        let wrapped = json!({ "notifications": [{ "id": "3" }], "total": 1 });

        let feed = parse_feed(&bare);
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].fields.get("type"), Some(&json!("invitation")));
        assert!(feed[1].is_read);
        assert_eq!(parse_feed(&wrapped)[0].id, "3");
        assert!(parse_feed(&json!({ "error": "x" })).is_empty());
        assert_eq!(parse_feed(&json!([{ "no_id": true }, { "id": "4" }])).len(), 1);
    }

    #[test]
    fn test_parse_feed_numeric_ids() {
        let feed = parse_feed(&json!([
            { "id": 41, "title": "Report ready" },
            { "id": null },
            { "id": "x" }
        ]));
        let ids: Vec<_> = feed.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["41", "x"]);
        assert_eq!(feed[0].fields.get("title"), Some(&json!("Report ready")));
        assert!(!feed[0].fields.contains_key("id"));
    }

    #[test]
    fn test_add_prepends_and_socket_deduplicates() {
        let mut state = NotificationState::default();
        state.reduce(NotificationAction::Add(Notification::new("a")));
        state.reduce(NotificationAction::AddFromSocket(Notification::new("b")));
        state.reduce(NotificationAction::AddFromSocket(Notification::new("a")));

        let ids: Vec<_> = state.notifications.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_update_mark_remove() {
        let mut state = NotificationState::default();
        state.reduce(NotificationAction::Replace(vec![
            Notification::new("a"),
            Notification::new("b"),
        ]));
        assert_eq!(state.unread_count(), 2);

        state.reduce(NotificationAction::MarkAsRead("a".into()));
        let mut fields = Map::new();
        fields.insert("status".into(), json!("accepted"));
        fields.insert("is_read".into(), json!(true));
        state.reduce(NotificationAction::UpdateStatus {
            id: "b".into(),
            fields,
        });
        assert_eq!(state.unread_count(), 0);
        assert_eq!(state.get("b").unwrap().fields.get("status"), Some(&json!("accepted")));

        state.reduce(NotificationAction::Remove("a".into()));
        assert!(state.get("a").is_none());
        state.reduce(NotificationAction::Clear);
        assert!(state.notifications.is_empty());
    }

    #[test]
    fn test_loading_flag() {
        let mut state = NotificationState::default();
        state.reduce(NotificationAction::FetchStarted);
        assert!(state.loading);
        state.reduce(NotificationAction::FetchFailed);
        assert!(!state.loading);
    }
}
