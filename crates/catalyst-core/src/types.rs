//! Core data types for the catalyst records console
//!
//! Records are owned by the backend. The console only holds transient copies:
//! fetched on load, mutated locally as an optimistic preview of a pending
//! write, and replaced whenever a fresh fetch arrives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Record identifier type, always echoed from the backend
pub type RecordId = i64;

/// Field changes sent as a PATCH payload (only the changed fields)
pub type FieldChanges = Map<String, Value>;

/// A backend-owned record (a claim, an upload, ...)
///
/// Everything but the `id` is kept verbatim as an opaque field map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Backend identifier
    pub id: RecordId,

    /// All remaining fields, in backend order
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Create a record from an id and a field map
    #[must_use]
    pub const fn new(id: RecordId, fields: Map<String, Value>) -> Self {
        Self { id, fields }
    }

    /// Look up a field by name
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        if key == "id" {
            return None;
        }
        self.fields.get(key)
    }

    /// Field rendered as plain text, `None` when absent or null
    #[must_use]
    pub fn text(&self, key: &str) -> Option<String> {
        if key == "id" {
            return Some(self.id.to_string());
        }
        match self.fields.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Overwrite the named fields with the given values (shallow merge)
    pub fn apply(&mut self, changes: &FieldChanges) {
        for (key, value) in changes {
            if key == "id" {
                continue;
            }
            self.fields.insert(key.clone(), value.clone());
        }
    }
}

/// One backend-produced audit entry for a record's status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    /// History entry identifier
    pub status_history_id: i64,

    /// Status the record moved to
    pub status: String,

    /// When the change happened
    pub status_date: DateTime<Utc>,

    /// Free-form notes attached to the change
    #[serde(default)]
    pub notes: Option<String>,

    /// Acting user id
    #[serde(default)]
    pub user_id: Option<i64>,

    /// Acting user's first name
    #[serde(default)]
    pub user_first_name: Option<String>,

    /// Acting user's last name
    #[serde(default)]
    pub user_last_name: Option<String>,

    /// Acting user's email
    #[serde(default)]
    pub user_email: Option<String>,
}

impl StatusHistoryEntry {
    /// Acting user as "First Last (email)", with missing parts left out
    #[must_use]
    pub fn acting_user(&self) -> String {
        let name = [self.user_first_name.as_deref(), self.user_last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        match (name.is_empty(), self.user_email.as_deref()) {
            (false, Some(email)) => format!("{name} ({email})"),
            (false, None) => name,
            (true, Some(email)) => email.to_string(),
            (true, None) => self
                .user_id
                .map_or_else(|| "unknown".to_string(), |id| format!("user #{id}")),
        }
    }
}

/// A comment attached to a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment identifier
    pub id: i64,

    /// Comment body
    #[serde(alias = "comment")]
    pub comment_text: String,

    /// Author id
    #[serde(default)]
    pub user_id: Option<i64>,

    /// Creation time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// An opaque, short-lived bearer credential
///
/// The console never inspects or persists it; it only produces the
/// `Authorization` header value from it.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token string
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn claim() -> Record {
        serde_json::from_value(json!({
            "id": 1,
            "claim_id": "CLM-0001",
            "business_status": "Submitted",
            "claim_amount": 1250.5,
            "adjuster_assigned": null
        }))
        .unwrap()
    }

    #[test]
    fn test_record_keeps_fields_in_backend_order() {
        let record = claim();
        assert_eq!(record.id, 1);
        let keys: Vec<_> = record.fields.keys().cloned().collect();
        assert_eq!(
            keys,
            vec!["claim_id", "business_status", "claim_amount", "adjuster_assigned"]
        );
    }

    #[test]
    fn test_record_round_trips_through_json() {
        let record = claim();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], json!(1));
        assert_eq!(value["business_status"], json!("Submitted"));
    }

    #[test]
    fn test_record_without_id_is_rejected() {
        let result = serde_json::from_value::<Record>(json!({"claim_id": "CLM-0001"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_record_text() {
        let record = claim();
        assert_eq!(record.text("id").as_deref(), Some("1"));
        assert_eq!(record.text("business_status").as_deref(), Some("Submitted"));
        assert_eq!(record.text("claim_amount").as_deref(), Some("1250.5"));
        assert_eq!(record.text("adjuster_assigned"), None);
        assert_eq!(record.text("missing"), None);
    }

    #[test]
    fn test_apply_only_touches_named_fields() {
        let mut record = claim();
        let before = record.clone();

        let mut changes = FieldChanges::new();
        changes.insert("business_status".to_string(), json!("Approved"));
        changes.insert("id".to_string(), json!(99));
        record.apply(&changes);

        assert_eq!(record.id, 1);
        assert_eq!(record.get("business_status"), Some(&json!("Approved")));
        assert_eq!(record.get("claim_id"), before.get("claim_id"));
        assert_eq!(record.fields.len(), before.fields.len());
    }

    #[test]
    fn test_status_history_entry_parses() {
        let entry: StatusHistoryEntry = serde_json::from_value(json!({
            "status_history_id": 7,
            "status": "Under Review",
            "status_date": "2025-03-01T14:30:00Z",
            "notes": "Assigned to adjuster",
            "user_id": 1,
            "user_first_name": "Dana",
            "user_last_name": "Lee",
            "user_email": "dana@example.com"
        }))
        .unwrap();

        assert_eq!(entry.status, "Under Review");
        assert_eq!(entry.acting_user(), "Dana Lee (dana@example.com)");
    }

    #[test]
    fn test_acting_user_fallbacks() {
        let mut entry: StatusHistoryEntry = serde_json::from_value(json!({
            "status_history_id": 1,
            "status": "Submitted",
            "status_date": "2025-03-01T14:30:00+02:00"
        }))
        .unwrap();
        assert_eq!(entry.acting_user(), "unknown");

        entry.user_id = Some(4);
        assert_eq!(entry.acting_user(), "user #4");

        entry.user_email = Some("ops@example.com".to_string());
        assert_eq!(entry.acting_user(), "ops@example.com");
    }

    #[test]
    fn test_comment_accepts_backend_column_name() {
        let comment: Comment =
            serde_json::from_value(json!({"id": 3, "comment": "Called policyholder"})).unwrap();
        assert_eq!(comment.comment_text, "Called policyholder");
        assert!(comment.created_at.is_none());
    }

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken::new("secret-value");
        assert_eq!(format!("{token:?}"), "AccessToken(<redacted>)");
        assert_eq!(token.bearer(), "Bearer secret-value");
    }
}
