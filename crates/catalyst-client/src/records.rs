//! Typed access to one resource's collection endpoints

use crate::http::ApiClient;
use catalyst_core::{
    AccessToken, Comment, Error, FieldChanges, Record, RecordId, ResourceDescriptor, Result,
    StatusHistoryEntry,
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

/// Query-string filters for a collection listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    filters: Vec<(String, String)>,
}

impl ListQuery {
    /// Empty query
    #[must_use]
    pub const fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a `key=value` filter
    #[must_use]
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }

    /// Whether no filters were given
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Encoded query string without the leading `?`
    #[must_use]
    pub fn to_query_string(&self) -> String {
        self.filters
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Record endpoints for one resource descriptor
#[derive(Debug, Clone)]
pub struct RecordApi {
    client: ApiClient,
    descriptor: ResourceDescriptor,
}

impl RecordApi {
    /// Bind a client to a resource
    #[must_use]
    pub const fn new(client: ApiClient, descriptor: ResourceDescriptor) -> Self {
        Self { client, descriptor }
    }

    /// The bound resource
    #[must_use]
    pub const fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    /// The underlying HTTP client
    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Fetch the full collection
    pub async fn list(&self, token: &AccessToken) -> Result<Vec<Record>> {
        self.list_filtered(token, &ListQuery::new()).await
    }

    /// Fetch the collection with query-string filters
    pub async fn list_filtered(
        &self,
        token: &AccessToken,
        query: &ListQuery,
    ) -> Result<Vec<Record>> {
        let path = if query.is_empty() {
            self.descriptor.list_path().to_string()
        } else {
            format!("{}?{}", self.descriptor.list_path(), query.to_query_string())
        };

        let records: Vec<Record> = parse_list(self.client.get(&path, token).await?)?;
        debug!(resource = %self.descriptor.name, count = records.len(), "Fetched records");
        Ok(records)
    }

    /// Fetch one record
    pub async fn get(&self, token: &AccessToken, id: RecordId) -> Result<Record> {
        let path = self.descriptor.record_path(id);
        match self.client.get(&path, token).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Err(Error::not_found(path)),
        }
    }

    /// Fetch a record's status history, newest first as the backend orders it
    pub async fn history(
        &self,
        token: &AccessToken,
        id: RecordId,
    ) -> Result<Vec<StatusHistoryEntry>> {
        if !self.descriptor.history {
            return Err(Error::Other(format!(
                "{} does not expose status history",
                self.descriptor.name
            )));
        }
        parse_list(self.client.get(&self.descriptor.history_path(id), token).await?)
    }

    /// Send a partial update
    ///
    /// Returns the record echoed by the backend, or `None` for an empty or
    /// unrecognised success body.
    pub async fn update(
        &self,
        token: &AccessToken,
        id: RecordId,
        changes: &FieldChanges,
    ) -> Result<Option<Record>> {
        let body = Value::Object(changes.clone());
        let response = self
            .client
            .patch(&self.descriptor.record_path(id), token, Some(&body))
            .await?;
        Ok(parse_lenient(response))
    }

    /// Fetch a record's comments
    pub async fn comments(&self, token: &AccessToken, id: RecordId) -> Result<Vec<Comment>> {
        self.ensure_comments()?;
        parse_list(self.client.get(&self.descriptor.comments_path(id), token).await?)
    }

    /// Post a comment on a record
    pub async fn add_comment(
        &self,
        token: &AccessToken,
        id: RecordId,
        text: &str,
    ) -> Result<Option<Comment>> {
        self.ensure_comments()?;
        if text.trim().is_empty() {
            return Err(Error::Validation {
                field: "comment_text".to_string(),
                message: "comment must not be empty".to_string(),
            });
        }

        let body = json!({ "comment_text": text });
        let response = self
            .client
            .post(&self.descriptor.comments_path(id), token, Some(&body))
            .await?;
        Ok(parse_lenient(response))
    }

    fn ensure_comments(&self) -> Result<()> {
        if self.descriptor.comments {
            Ok(())
        } else {
            Err(Error::Other(format!(
                "{} does not expose comments",
                self.descriptor.name
            )))
        }
    }
}

// A null body lists as empty
fn parse_list<T: DeserializeOwned>(value: Option<Value>) -> Result<Vec<T>> {
    value.map_or_else(|| Ok(Vec::new()), |v| Ok(serde_json::from_value(v)?))
}

fn parse_lenient<T: DeserializeOwned>(value: Option<Value>) -> Option<T> {
    let value = value?;
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            debug!(error = %e, "Ignoring unrecognised success body");
            None
        }
    }
}
