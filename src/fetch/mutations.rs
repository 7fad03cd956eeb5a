//! Record mutations
//!
//! Create, update and delete calls on a single record. A successful mutation
//! may shift every later page, so callers follow it with
//! [`PaginationController::after_mutation`](crate::pagination::PaginationController::after_mutation).

use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::resource::ResourceSpec;
use crate::types::Method;
use serde_json::Value;
use tracing::info;

/// What the server said about a successful mutation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationOutcome {
    /// Server message, e.g. "Product deleted successfully"
    pub message: Option<String>,
    /// Returned record, if any
    pub data: Option<Value>,
}

/// Mutates single records of a resource
#[derive(Debug, Clone)]
pub struct RecordClient {
    client: HttpClient,
    resource: ResourceSpec,
}

impl RecordClient {
    /// Create a record client for a resource
    pub fn new(client: HttpClient, resource: impl Into<ResourceSpec>) -> Self {
        Self {
            client,
            resource: resource.into(),
        }
    }

    /// Create a record (`POST {path}`)
    pub async fn create(&self, body: Value) -> Result<MutationOutcome> {
        let path = self.resource.path.clone();
        self.send(Method::POST, &path, Some(body)).await
    }

    /// Replace a record (`PUT {path}/{id}`)
    pub async fn update(&self, id: &str, body: Value) -> Result<MutationOutcome> {
        let path = self.resource.record_path(id);
        self.send(Method::PUT, &path, Some(body)).await
    }

    /// Delete a record (`DELETE {path}/{id}`)
    pub async fn delete(&self, id: &str) -> Result<MutationOutcome> {
        let path = self.resource.record_path(id);
        self.send(Method::DELETE, &path, None).await
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<MutationOutcome> {
        let mut config = RequestConfig::new().authenticated(self.resource.requires_auth);
        if let Some(body) = body {
            config = config.json(body);
        }

        let response = self.client.request(method.into(), path, config).await?;
        let text = response.text().await?;
        let outcome = parse_outcome(&text)?;

        info!(
            resource = %self.resource.kind,
            ?method,
            path,
            "Mutation succeeded"
        );
        Ok(outcome)
    }
}

/// Read the `{ success, message, data }` envelope
///
/// An empty body (e.g. 204) counts as success.
fn parse_outcome(body: &str) -> Result<MutationOutcome> {
    if body.trim().is_empty() {
        return Ok(MutationOutcome::default());
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::malformed(format!("mutation response is not valid JSON: {e}")))?;

    let message = value
        .get("message")
        .and_then(Value::as_str)
        .map(String::from);

    if value.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(Error::api(
            200,
            message.unwrap_or_else(|| "mutation was not successful".to_string()),
        ));
    }

    Ok(MutationOutcome {
        message,
        data: value.get("data").cloned(),
    })
}
