//! Declarative resource descriptors
//!
//! A descriptor tells the console everything it needs to list, show and edit
//! one record type: endpoint paths, table columns, detail fields and which
//! fields are editable.

use crate::types::{Record, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// How a field value is formatted for display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Shown as-is
    #[default]
    Text,
    /// Monetary amount, shown as `$1,234.50`
    Currency,
    /// Date or timestamp, shown as its date part
    Date,
}

/// One displayed (and possibly editable) field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name in the record
    pub key: String,

    /// Human-readable label
    pub label: String,

    /// Display kind
    #[serde(default)]
    pub kind: FieldKind,

    /// Allowed values for editable fields (empty means free text)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl FieldSpec {
    /// Plain text field
    #[must_use]
    pub fn text(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: FieldKind::Text,
            options: Vec::new(),
        }
    }

    /// Currency field
    #[must_use]
    pub fn currency(key: &str, label: &str) -> Self {
        Self {
            kind: FieldKind::Currency,
            ..Self::text(key, label)
        }
    }

    /// Date field
    #[must_use]
    pub fn date(key: &str, label: &str) -> Self {
        Self {
            kind: FieldKind::Date,
            ..Self::text(key, label)
        }
    }

    /// Field restricted to a fixed set of values
    #[must_use]
    pub fn choice(key: &str, label: &str, options: &[&str]) -> Self {
        Self {
            options: options.iter().map(ToString::to_string).collect(),
            ..Self::text(key, label)
        }
    }

    /// Format this field of `record` for display
    #[must_use]
    pub fn format(&self, record: &Record) -> String {
        if self.key == "id" {
            return record.id.to_string();
        }
        record
            .get(&self.key)
            .map_or_else(|| EMPTY_CELL.to_string(), |value| self.format_value(value))
    }

    /// Format a raw JSON value according to this field's kind
    #[must_use]
    pub fn format_value(&self, value: &Value) -> String {
        match (self.kind, value) {
            (_, Value::Null) => EMPTY_CELL.to_string(),
            (FieldKind::Currency, Value::Number(n)) => {
                n.as_f64().map_or_else(|| n.to_string(), format_currency)
            }
            (FieldKind::Currency, Value::String(s)) => s
                .parse::<f64>()
                .map_or_else(|_| s.clone(), format_currency),
            (FieldKind::Date, Value::String(s)) => {
                s.split_once('T').map_or_else(|| s.clone(), |(date, _)| date.to_string())
            }
            (_, Value::String(s)) => s.clone(),
            (_, other) => other.to_string(),
        }
    }
}

/// Placeholder for absent or null values
pub const EMPTY_CELL: &str = "—";

/// Format an amount as US dollars with thousands separators
#[must_use]
pub fn format_currency(amount: f64) -> String {
    let negative = amount < 0.0;
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-${grouped}.{cents}")
    } else {
        format!("${grouped}.{cents}")
    }
}

/// Declarative description of one record type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ResourceDescriptor {
    /// Short name used on the command line (`claims`)
    #[validate(length(min = 1, max = 64))]
    pub name: String,

    /// Screen title
    pub title: String,

    /// Screen description
    #[serde(default)]
    pub description: String,

    /// Singular label used in the detail heading (`Claim`)
    pub singular: String,

    /// Collection path relative to the API base URL (`/api/insurance/claims`)
    #[validate(custom(function = "validate_collection_path"))]
    pub collection_path: String,

    /// Field shown in the detail heading
    #[serde(default = "default_title_field")]
    pub title_field: String,

    /// Table columns
    #[validate(length(min = 1))]
    pub columns: Vec<FieldSpec>,

    /// Read-only detail fields
    #[serde(default)]
    pub fields: Vec<FieldSpec>,

    /// Editable status fields
    #[serde(default)]
    pub status_fields: Vec<FieldSpec>,

    /// Whether the backend exposes status history for this resource
    #[serde(default)]
    pub history: bool,

    /// Whether the backend exposes comments for this resource
    #[serde(default)]
    pub comments: bool,
}

fn default_title_field() -> String {
    "id".to_string()
}

fn validate_collection_path(path: &str) -> Result<(), validator::ValidationError> {
    if path.starts_with('/') && !path.ends_with('/') {
        Ok(())
    } else {
        Err(validator::ValidationError::new("collection_path")
            .with_message("must start with '/' and must not end with '/'".into()))
    }
}

impl ResourceDescriptor {
    /// `GET` path for the whole collection
    #[must_use]
    pub fn list_path(&self) -> &str {
        &self.collection_path
    }

    /// `GET`/`PATCH` path for one record
    #[must_use]
    pub fn record_path(&self, id: RecordId) -> String {
        format!("{}/{id}", self.collection_path)
    }

    /// `GET` path for a record's status history
    #[must_use]
    pub fn history_path(&self, id: RecordId) -> String {
        format!("{}/history/{id}", self.collection_path)
    }

    /// `GET`/`POST` path for a record's comments
    #[must_use]
    pub fn comments_path(&self, id: RecordId) -> String {
        format!("{}/{id}/comments", self.collection_path)
    }

    /// Look up an editable field
    #[must_use]
    pub fn status_field(&self, key: &str) -> Option<&FieldSpec> {
        self.status_fields.iter().find(|f| f.key == key)
    }

    /// Detail heading, e.g. `Claim Details: CLM-0001`
    #[must_use]
    pub fn detail_heading(&self, record: &Record) -> String {
        let title = record
            .text(&self.title_field)
            .unwrap_or_else(|| record.id.to_string());
        format!("{} Details: {title}", self.singular)
    }

    /// Insurance claims
    #[must_use]
    pub fn claims() -> Self {
        Self {
            name: "claims".to_string(),
            title: "General Securities Assurance - Policy Claims".to_string(),
            description: "Browse and manage all insurance claims.".to_string(),
            singular: "Claim".to_string(),
            collection_path: "/api/insurance/claims".to_string(),
            title_field: "claim_id".to_string(),
            columns: vec![
                FieldSpec::text("claim_id", "Claim ID"),
                FieldSpec::text("policy_number", "Policy #"),
                FieldSpec::text("claim_type", "Claim Type"),
                FieldSpec::currency("claim_amount", "Amount"),
                FieldSpec::text("business_status", "Status"),
            ],
            fields: vec![
                FieldSpec::text("policy_number", "Policy #"),
                FieldSpec::text("claim_type", "Claim Type"),
                FieldSpec::date("date_of_loss", "Date of Loss"),
                FieldSpec::currency("claim_amount", "Claim Amount"),
                FieldSpec::text("adjuster_assigned", "Adjuster"),
                FieldSpec::text("policyholder_name", "Policyholder"),
                FieldSpec::text("customer_level", "Customer Level"),
                FieldSpec::date("customer_since_date", "Customer Since"),
            ],
            status_fields: vec![FieldSpec::choice(
                "business_status",
                "Status",
                &[
                    "Submitted",
                    "Under Review",
                    "Flagged for Fraud Review",
                    "Approved",
                    "Paid",
                    "Denied",
                ],
            )],
            history: true,
            comments: true,
        }
    }

    /// Uploaded data files
    #[must_use]
    pub fn uploads() -> Self {
        Self {
            name: "uploads".to_string(),
            title: "Uploads".to_string(),
            description: "Files ingested into the platform.".to_string(),
            singular: "Upload".to_string(),
            collection_path: "/api/uploads".to_string(),
            title_field: "file_name".to_string(),
            columns: vec![
                FieldSpec::text("file_name", "File"),
                FieldSpec::text("upload_type", "Type"),
                FieldSpec::date("created_at", "Uploaded"),
                FieldSpec::text("status", "Status"),
            ],
            fields: vec![
                FieldSpec::text("upload_type", "Type"),
                FieldSpec::text("uploaded_by", "Uploaded By"),
                FieldSpec::date("created_at", "Uploaded"),
                FieldSpec::text("row_count", "Rows"),
                FieldSpec::text("error_details", "Errors"),
            ],
            status_fields: vec![FieldSpec::choice(
                "status",
                "Status",
                &["Pending", "Processing", "Completed", "Failed"],
            )],
            history: false,
            comments: false,
        }
    }

    /// Built-in descriptors
    #[must_use]
    pub fn builtin() -> Vec<Self> {
        vec![Self::claims(), Self::uploads()]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(0.0, "$0.00")]
    #[case(5.5, "$5.50")]
    #[case(999.999, "$1,000.00")]
    #[case(1250.5, "$1,250.50")]
    #[case(1_234_567.891, "$1,234,567.89")]
    #[case(-42.0, "-$42.00")]
    fn test_format_currency(#[case] amount: f64, #[case] expected: &str) {
        assert_eq!(format_currency(amount), expected);
    }

    #[rstest]
    #[case(FieldKind::Text, json!("Approved"), "Approved")]
    #[case(FieldKind::Text, json!(42), "42")]
    #[case(FieldKind::Text, json!(null), EMPTY_CELL)]
    #[case(FieldKind::Currency, json!(1250.5), "$1,250.50")]
    #[case(FieldKind::Currency, json!("300"), "$300.00")]
    #[case(FieldKind::Currency, json!("n/a"), "n/a")]
    #[case(FieldKind::Date, json!("2024-11-02T00:00:00Z"), "2024-11-02")]
    #[case(FieldKind::Date, json!("2024-11-02"), "2024-11-02")]
    fn test_format_value(#[case] kind: FieldKind, #[case] value: Value, #[case] expected: &str) {
        let spec = FieldSpec {
            kind,
            ..FieldSpec::text("x", "X")
        };
        assert_eq!(spec.format_value(&value), expected);
    }

    #[test]
    fn test_claims_paths() {
        let claims = ResourceDescriptor::claims();
        assert_eq!(claims.list_path(), "/api/insurance/claims");
        assert_eq!(claims.record_path(12), "/api/insurance/claims/12");
        assert_eq!(claims.history_path(12), "/api/insurance/claims/history/12");
        assert_eq!(claims.comments_path(12), "/api/insurance/claims/12/comments");
    }

    #[test]
    fn test_builtin_descriptors_validate() {
        for descriptor in ResourceDescriptor::builtin() {
            assert!(descriptor.validate().is_ok(), "{} failed validation", descriptor.name);
        }
    }

    #[test]
    fn test_bad_collection_path_is_rejected() {
        let mut descriptor = ResourceDescriptor::uploads();
        descriptor.collection_path = "api/uploads/".to_string();
        assert!(descriptor.validate().is_err());
    }

    #[test]
    fn test_detail_heading_falls_back_to_id() {
        let claims = ResourceDescriptor::claims();
        let with_title: Record =
            serde_json::from_value(json!({"id": 1, "claim_id": "CLM-0001"})).unwrap();
        let without_title: Record = serde_json::from_value(json!({"id": 2})).unwrap();

        assert_eq!(claims.detail_heading(&with_title), "Claim Details: CLM-0001");
        assert_eq!(claims.detail_heading(&without_title), "Claim Details: 2");
    }

    #[test]
    fn test_status_field_lookup() {
        let claims = ResourceDescriptor::claims();
        let status = claims.status_field("business_status").unwrap();
        assert_eq!(status.options.len(), 6);
        assert!(claims.status_field("claim_amount").is_none());
    }

    #[test]
    fn test_descriptor_from_toml_uses_defaults() {
        let descriptor: ResourceDescriptor = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                name = "policyholders"
                title = "Policyholders"
                singular = "Policyholder"
                collection_path = "/api/insurance/policyholders"
                columns = [{ key = "name", label = "Name" }]
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(descriptor.title_field, "id");
        assert_eq!(descriptor.columns[0].kind, FieldKind::Text);
        assert!(descriptor.status_fields.is_empty());
        assert!(!descriptor.history);
    }
}
