//! Request/response wrappers for the forms and tables API.
//!
//! Calls are not retried. A failure is returned to the caller as a
//! [`RequestError`] carrying the server's `message` when it sent one.

use crate::config::ApiConfig;
use crate::error::{FormError, RequestError};
use crate::model::Form;
use crate::registry::TableColumn;
use crate::wire::{self, FieldValuesSubmission, WireForm};
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};
use url::Url;

const FORMS_PATH: &str = "api/v1/form/";
const CREATE_FORM_PATH: &str = "api/v1/form/create/";
const FIELD_VALUES_PATH: &str = "api/v1/form/field-values-submission/";
const TABLES_PATH: &str = "api/v1/tables/empty/";

fn update_form_path(id: i64) -> String {
    format!("api/v1/form/create-update/{}/", id)
}

fn soft_delete_path(id: i64) -> String {
    format!("api/v1/form/soft-delete/{}/", id)
}

// Table names are user data and go through segment encoding.
fn table_segments<'a>(table: &'a str, leaf: &'a str) -> [&'a str; 5] {
    ["api", "v1", "tables", table, leaf]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    fn failure_message(self) -> &'static str {
        match self {
            Method::Get => "GET request failed",
            Method::Post => "POST request failed",
            Method::Put => "PUT request failed",
            Method::Delete => "Failed to delete",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<Value>,
}

/// Status and decoded body. An empty or non-JSON body decodes to `Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request. Implementations report a missing response as
/// [`RequestError::network`]; any received status is returned as a response.
pub trait HttpTransport: Send + Sync {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, RequestError>>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, RequestError>> {
        Box::pin(async move {
            let method = match request.method {
                Method::Get => reqwest::Method::GET,
                Method::Post => reqwest::Method::POST,
                Method::Put => reqwest::Method::PUT,
                Method::Delete => reqwest::Method::DELETE,
            };
            let mut builder = self.client.request(method, request.url);
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }
            let response = builder
                .send()
                .await
                .map_err(|e| RequestError::network(e.to_string()))?;
            let status = response.status().as_u16();
            let bytes = response
                .bytes()
                .await
                .map_err(|e| RequestError::network(e.to_string()))?;
            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            Ok(ApiResponse { status, body })
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    #[serde(default = "default_success")]
    pub success: bool,
}

fn default_success() -> bool {
    true
}

/// Clears the in-flight flag when a save finishes, successfully or not.
struct SaveGuard<'a>(&'a AtomicBool);

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Pulls a list out of a response that is either a bare array or an
/// object wrapping it under `key`.
fn unwrap_list(body: Value, key: &str) -> Value {
    match body {
        Value::Object(mut map) => map.remove(key).unwrap_or(Value::Array(Vec::new())),
        Value::Null => Value::Array(Vec::new()),
        other => other,
    }
}

pub struct FormsApi<T: HttpTransport> {
    config: ApiConfig,
    transport: T,
    saving: AtomicBool,
}

impl<T: HttpTransport> FormsApi<T> {
    pub fn new(config: ApiConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            saving: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Whether a [`save`](Self::save) is currently awaiting its response.
    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, FormError> {
        let url = self.config.endpoint(path)?;
        self.request_url(method, url, body).await
    }

    async fn request_url(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> Result<Value, FormError> {
        debug!(%method, %url, "sending API request");
        let response = self
            .transport
            .send(ApiRequest {
                method,
                url: url.clone(),
                body,
            })
            .await
            .inspect_err(|err| warn!(%method, %url, error = %err, "API request failed"))?;

        if response.is_success() {
            return Ok(response.body);
        }
        let message = response
            .body
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or(method.failure_message())
            .to_string();
        warn!(%method, %url, status = response.status, %message, "API returned an error");
        Err(RequestError::http(response.status, message).into())
    }

    async fn request_as<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<R, FormError> {
        let value = self.request(method, path, body).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn list_forms(&self) -> Result<Vec<WireForm>, FormError> {
        let body = self.request(Method::Get, FORMS_PATH, None).await?;
        Ok(serde_json::from_value(unwrap_list(body, "forms"))?)
    }

    pub async fn create_form(&self, form: &WireForm) -> Result<WireForm, FormError> {
        let body = serde_json::to_value(form)?;
        self.request_as(Method::Post, CREATE_FORM_PATH, Some(body))
            .await
    }

    pub async fn update_form(&self, id: i64, form: &WireForm) -> Result<WireForm, FormError> {
        let body = serde_json::to_value(form)?;
        self.request_as(Method::Put, &update_form_path(id), Some(body))
            .await
    }

    pub async fn soft_delete_form(&self, id: i64) -> Result<DeleteOutcome, FormError> {
        let body = self.request(Method::Delete, &soft_delete_path(id), None).await?;
        if body.is_null() {
            return Ok(DeleteOutcome { success: true });
        }
        Ok(serde_json::from_value(body)?)
    }

    /// Names of the tables a new form can be bound to. Entries may be plain
    /// strings or objects with a `name`.
    pub async fn fetch_table_names(&self) -> Result<Vec<String>, FormError> {
        let body = self.request(Method::Get, TABLES_PATH, None).await?;
        let entries = match unwrap_list(body, "tables") {
            Value::Array(entries) => entries,
            _ => Vec::new(),
        };
        Ok(entries
            .into_iter()
            .filter_map(|entry| match entry {
                Value::String(name) => Some(name),
                Value::Object(map) => map
                    .get("name")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string()),
                _ => None,
            })
            .collect())
    }

    pub async fn fetch_table_fields(&self, table: &str) -> Result<Vec<TableColumn>, FormError> {
        let url = self.config.endpoint_segments(&table_segments(table, "fields"))?;
        let body = self.request_url(Method::Get, url, None).await?;
        Ok(serde_json::from_value(unwrap_list(body, "fields"))?)
    }

    /// Existing rows of a table, used to prefill a linked record.
    pub async fn fetch_table_data(&self, table: &str) -> Result<Vec<Map<String, Value>>, FormError> {
        let url = self.config.endpoint_segments(&table_segments(table, "data"))?;
        let body = self.request_url(Method::Get, url, None).await?;
        Ok(serde_json::from_value(unwrap_list(body, "data"))?)
    }

    /// POSTs a new record, or PUTs when the payload carries a record id.
    pub async fn submit_field_values(
        &self,
        payload: &FieldValuesSubmission,
    ) -> Result<Value, FormError> {
        let method = if payload.record_id().is_some() {
            Method::Put
        } else {
            Method::Post
        };
        let body = serde_json::to_value(payload)?;
        self.request(method, FIELD_VALUES_PATH, Some(body)).await
    }

    /// Validates and persists a form: created when it has no server id yet,
    /// updated otherwise. Fails fast with [`FormError::SaveInProgress`]
    /// while an earlier save on this gateway is still pending.
    pub async fn save(&self, form: &Form) -> Result<WireForm, FormError> {
        wire::validate_for_save(form)?;
        if self
            .saving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(FormError::SaveInProgress);
        }
        let _guard = SaveGuard(&self.saving);

        let payload = wire::to_wire(form);
        match form.id {
            Some(id) => self.update_form(id, &payload).await,
            None => self.create_form(&payload).await,
        }
    }
}
