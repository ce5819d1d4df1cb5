//! Azure DevOps work item client.
//!
//! Owns the HTTP session, authentication, retry/backoff policy, and all
//! request construction. Every operation is a single logical unit of work:
//! one or more sequential HTTP exchanges bounded by the configured timeout,
//! returning a parsed record model or one of the taxonomy errors. The
//! client is cheap to clone and safe to share across tasks; the underlying
//! connection pool handles concurrent calls without external locking.

use std::collections::HashMap;
use std::time::Duration;

use base64::Engine;
use reqwest::{StatusCode, header};
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::parsers::ParsePayload;
use super::wiql::WiqlQuery;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::models::{FieldUpdates, fields};

const USER_AGENT: &str = concat!("azdo-workitems/", env!("CARGO_PKG_VERSION"));
const PATCH_CONTENT_TYPE: &str = "application/json-patch+json";

/// Retry policy for transient failures.
///
/// Reads retry connection errors, timeouts, and retryable statuses with
/// exponential backoff. Mutations retry only failures that occur before the
/// request is transmitted; a mutating request that has produced any response
/// is never re-sent, so a flaky network cannot duplicate a create or
/// double-apply a patch.
#[derive(Debug, Clone, Copy)]
struct RetryPolicy {
    max_retries: u32,
    backoff_factor: f64,
}

impl RetryPolicy {
    /// Statuses worth retrying on idempotent requests: request timeout,
    /// throttling, and server-side failures.
    fn is_retryable_status(status: StatusCode) -> bool {
        status == StatusCode::REQUEST_TIMEOUT
            || status == StatusCode::TOO_MANY_REQUESTS
            || status.is_server_error()
    }

    /// Delay before the given retry: factor * 2^attempt seconds.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        Duration::from_secs_f64(self.backoff_factor * f64::powi(2.0, attempt as i32))
    }
}

/// Client for the Azure DevOps work item tracking REST surface.
///
/// # Example
///
/// ```rust,no_run
/// use azdo_workitems::{Settings, WorkItemClient, WorkItem};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = WorkItemClient::new(Settings::new("my-org", "my-project", "my-pat"))?;
///
/// let stories: Vec<WorkItem> = client.get_work_items("User Story", 25).await?;
/// println!("Found {} stories", stories.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WorkItemClient {
    settings: Settings,
    http: reqwest::Client,
}

impl WorkItemClient {
    /// Creates a client from an immutable settings bundle.
    ///
    /// Fails fast with a configuration error when the bundle is invalid —
    /// most importantly when the personal access token, the single
    /// mandatory credential, is empty.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let credentials = format!(":{}", settings.pat.expose_secret());
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        let mut auth_value = header::HeaderValue::from_str(&format!("Basic {encoded}"))
            .map_err(|_| Error::config("access token contains bytes not valid in a header"))?;
        auth_value.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth_value);
        headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));

        let mut builder = reqwest::Client::builder()
            .timeout(settings.timeout)
            .default_headers(headers);
        if !settings.verify_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { settings, http })
    }

    /// Returns the organization name.
    pub fn organization(&self) -> &str {
        &self.settings.organization
    }

    /// Returns the project name.
    pub fn project(&self) -> &str {
        &self.settings.project
    }

    /// Lists up to `top` items of the given type, most recently changed
    /// first.
    ///
    /// Two-phase: a WIQL query selects the ordered id set, then the full
    /// records are batch-fetched. The returned order matches the query
    /// result order.
    pub async fn get_work_items<T: ParsePayload>(
        &self,
        item_type: &str,
        top: usize,
    ) -> Result<Vec<T>> {
        let query = WiqlQuery::for_type(&self.settings.project, item_type).top(top);
        self.query_and_fetch(&query, top).await
    }

    /// Searches items of the given type whose title contains `term`.
    ///
    /// The term is passed as a literal operand to the WIQL CONTAINS
    /// predicate; it cannot alter the query structure.
    pub async fn search_work_items_by_title<T: ParsePayload>(
        &self,
        item_type: &str,
        term: &str,
        top: usize,
    ) -> Result<Vec<T>> {
        let query = WiqlQuery::for_type(&self.settings.project, item_type)
            .title_contains(term)
            .top(top);
        self.query_and_fetch(&query, top).await
    }

    /// Lists items of the given type in an exact state.
    pub async fn get_work_items_by_state<T: ParsePayload>(
        &self,
        item_type: &str,
        state: &str,
        top: usize,
    ) -> Result<Vec<T>> {
        let query = WiqlQuery::for_type(&self.settings.project, item_type)
            .state(state)
            .top(top);
        self.query_and_fetch(&query, top).await
    }

    /// Fetches a single work item by id.
    ///
    /// A missing id surfaces as [`Error::NotFound`], never as a transport
    /// error, so callers can branch on "does not exist".
    pub async fn get_work_item_by_id<T: ParsePayload>(&self, id: i32) -> Result<T> {
        let url = format!("{}/workitems/{id}", self.wit_base());
        debug!(id, "fetching work item");

        let response = self
            .send_with_retry(false, || {
                self.http.get(&url).query(&[
                    ("api-version", self.settings.api_version.as_str()),
                    ("$expand", "fields"),
                ])
            })
            .await?;

        let response = self
            .check_status(response, &format!("work item {id}"))
            .await?;
        let raw: Value = self.read_json(response).await?;
        T::parse(&raw)
    }

    /// Applies field updates to an existing work item and returns the
    /// record as confirmed by the service's response body.
    ///
    /// The request is a JSON-patch document with one `add` operation per
    /// field. An empty update map is a validation error.
    pub async fn update_work_item<T: ParsePayload>(
        &self,
        id: i32,
        updates: &FieldUpdates,
    ) -> Result<T> {
        if updates.is_empty() {
            return Err(Error::validation("no fields provided for update"));
        }

        let patch = patch_document(updates);
        let body = serde_json::to_vec(&patch)
            .map_err(|e| Error::validation(format!("failed to encode patch document: {e}")))?;
        let url = format!("{}/workitems/{id}", self.wit_base());
        debug!(id, fields = updates.len(), "updating work item");

        let response = self
            .send_with_retry(true, || {
                self.http
                    .patch(&url)
                    .query(&[("api-version", self.settings.api_version.as_str())])
                    .header(header::CONTENT_TYPE, PATCH_CONTENT_TYPE)
                    .body(body.clone())
            })
            .await?;

        let response = self
            .check_status(response, &format!("work item {id}"))
            .await?;
        let raw: Value = self.read_json(response).await?;
        T::parse(&raw)
    }

    /// Creates a work item of the given type and returns the record with
    /// its freshly assigned id.
    ///
    /// `System.Title` is the only mandatory field; entries with null values
    /// are skipped.
    pub async fn create_work_item<T: ParsePayload>(
        &self,
        item_type: &str,
        item_fields: &FieldUpdates,
    ) -> Result<T> {
        match item_fields.get(fields::TITLE).and_then(Value::as_str) {
            Some(title) if !title.trim().is_empty() => {}
            _ => {
                return Err(Error::validation(format!(
                    "{} is mandatory when creating a work item",
                    fields::TITLE
                )));
            }
        }

        let patch = patch_document(item_fields);
        let body = serde_json::to_vec(&patch)
            .map_err(|e| Error::validation(format!("failed to encode patch document: {e}")))?;
        let url = format!(
            "{}/workitems/${}",
            self.wit_base(),
            urlencoding::encode(item_type)
        );
        debug!(item_type, "creating work item");

        let response = self
            .send_with_retry(true, || {
                self.http
                    .post(&url)
                    .query(&[("api-version", self.settings.api_version.as_str())])
                    .header(header::CONTENT_TYPE, PATCH_CONTENT_TYPE)
                    .body(body.clone())
            })
            .await?;

        let response = self
            .check_status(response, &format!("{item_type} creation endpoint"))
            .await?;
        let raw: Value = self.read_json(response).await?;
        T::parse(&raw)
    }

    /// Runs the two-phase listing: WIQL ids first, then full records in the
    /// id order the query returned.
    async fn query_and_fetch<T: ParsePayload>(
        &self,
        query: &WiqlQuery,
        top: usize,
    ) -> Result<Vec<T>> {
        let mut ids = self.run_query(query).await?;
        ids.truncate(top);
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.fetch_details(&ids).await
    }

    /// Executes a WIQL query and extracts the ordered id set.
    async fn run_query(&self, query: &WiqlQuery) -> Result<Vec<i32>> {
        let url = format!("{}/wiql", self.wit_base());
        let body = json!({ "query": query.build() });
        debug!("running WIQL query");

        let response = self
            .send_with_retry(false, || {
                self.http
                    .post(&url)
                    .query(&[("api-version", self.settings.wiql_api_version.as_str())])
                    .json(&body)
            })
            .await?;

        let response = self.check_status(response, "WIQL query").await?;
        let result: Value = self.read_json(response).await?;

        let ids = result
            .get("workItems")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get("id").and_then(Value::as_i64))
                    .map(|id| id as i32)
                    .collect()
            })
            .unwrap_or_default();
        Ok(ids)
    }

    /// Batch-fetches full records for the given ids, preserving id order.
    async fn fetch_details<T: ParsePayload>(&self, ids: &[i32]) -> Result<Vec<T>> {
        let ids_param = ids
            .iter()
            .map(i32::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/workitems", self.wit_base());
        debug!(count = ids.len(), "fetching work item details");

        let response = self
            .send_with_retry(false, || {
                self.http.get(&url).query(&[
                    ("ids", ids_param.as_str()),
                    ("api-version", self.settings.api_version.as_str()),
                    ("$expand", "fields"),
                ])
            })
            .await?;

        let response = self.check_status(response, "work item batch").await?;
        let result: Value = self.read_json(response).await?;

        let mut by_id: HashMap<i32, Value> = result
            .get("value")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let id = item.get("id").and_then(Value::as_i64)? as i32;
                        Some((id, item.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        ids.iter()
            .filter_map(|id| by_id.remove(id))
            .map(|raw| T::parse(&raw))
            .collect()
    }

    /// Sends a request, retrying transient failures per the policy.
    ///
    /// `mutating` restricts retries to connection-establishment failures:
    /// once a mutating request has been transmitted, any failure surfaces
    /// as transient instead of risking a duplicate side effect.
    async fn send_with_retry<F>(&self, mutating: bool, build: F) -> Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let policy = RetryPolicy {
            max_retries: self.settings.max_retries,
            backoff_factor: self.settings.backoff_factor,
        };
        let mut attempt: u32 = 0;

        loop {
            match build().send().await {
                Ok(response) => {
                    let status = response.status();
                    if !RetryPolicy::is_retryable_status(status) {
                        return Ok(response);
                    }
                    if !mutating && attempt < policy.max_retries {
                        let delay = policy.backoff_delay(attempt);
                        warn!(%status, attempt, ?delay, "transient response, retrying");
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::Transient {
                        attempts: attempt + 1,
                        message: format!("HTTP {status}: {body}"),
                    });
                }
                Err(err) => {
                    let retryable = if mutating {
                        // The request never reached the wire.
                        err.is_connect()
                    } else {
                        err.is_connect() || err.is_timeout() || err.is_request()
                    };
                    if retryable && attempt < policy.max_retries {
                        let delay = policy.backoff_delay(attempt);
                        warn!(error = %err, attempt, ?delay, "transport failure, retrying");
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(Error::Transient {
                        attempts: attempt + 1,
                        message: err.to_string(),
                    });
                }
            }
        }
    }

    /// Maps non-success statuses onto the error taxonomy. Retryable
    /// statuses never reach this point; they are handled by the retry loop.
    async fn check_status(
        &self,
        response: reqwest::Response,
        resource: &str,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Permission {
                status: status.as_u16(),
                message,
            },
            StatusCode::NOT_FOUND => Error::not_found(resource.to_string()),
            _ => Error::validation(format!("HTTP {status}: {message}")),
        })
    }

    async fn read_json(&self, response: reqwest::Response) -> Result<Value> {
        response
            .json()
            .await
            .map_err(|e| Error::validation(format!("failed to decode response body: {e}")))
    }

    fn wit_base(&self) -> String {
        format!(
            "{}/{}/{}/_apis/wit",
            self.settings.base_url, self.settings.organization, self.settings.project
        )
    }
}

/// Renders a field map as a JSON-patch document, one `add` per field,
/// skipping null values.
fn patch_document(updates: &FieldUpdates) -> Vec<Value> {
    updates
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(path, value)| {
            json!({
                "op": "add",
                "path": format!("/fields/{path}"),
                "value": value,
            })
        })
        .collect()
}
