//! REST backend for the hosted backend-as-a-service
//!
//! Speaks the PostgREST dialect: collection endpoints under `/rest/v1/`,
//! `column=eq.value` filters, and `Prefer: return=representation` so that
//! mutations report which rows they touched.

use crate::adapter::{sort_newest_first, Fetched, RecordStore};
use crate::config::{ConfigError, StoreConfig};
use crate::error::{
    CreateError, DeleteError, ErrorKind, FetchError, StoreError, StoreOp, UpdateError,
};
use async_trait::async_trait;
use ministry_records::{NewRecord, Record, RecordId, RecordKind, Status};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};

const RETURN_REPRESENTATION: &str = "return=representation";
const MAX_DETAIL_LEN: usize = 300;

/// Map an HTTP status to an error kind
#[must_use]
pub fn classify_status(status: StatusCode) -> ErrorKind {
    match status.as_u16() {
        401 | 403 => ErrorKind::Forbidden,
        404 | 406 => ErrorKind::NotFound,
        409 | 412 => ErrorKind::Conflict,
        400 | 422 => ErrorKind::Invalid,
        _ => ErrorKind::Network,
    }
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(MAX_DETAIL_LEN) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn transport(op: StoreOp, err: &reqwest::Error) -> StoreError {
    let detail = if err.is_timeout() {
        format!("request timed out: {err}")
    } else {
        err.to_string()
    };
    StoreError::new(op, ErrorKind::Network, detail)
}

async fn ensure_success(op: StoreOp, response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::new(
        op,
        classify_status(status),
        format!("HTTP {}: {}", status.as_u16(), truncate(&body)),
    ))
}

async fn rows(op: StoreOp, response: Response) -> Result<Vec<Value>, StoreError> {
    response.json::<Vec<Value>>().await.map_err(|e| {
        StoreError::new(op, ErrorKind::Network, format!("unexpected response body: {e}"))
    })
}

/// One backend table accessed over HTTP
#[derive(Debug, Clone)]
pub struct RestStore {
    client: reqwest::Client,
    kind: RecordKind,
    url: String,
    api_key: String,
}

impl RestStore {
    /// Build a store for one record kind
    ///
    /// # Errors
    /// `ConfigError::HttpClient` if the HTTP client cannot be constructed.
    pub fn new(config: &StoreConfig, kind: RecordKind) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self::with_client(client, config, kind))
    }

    /// Build a store sharing an existing client
    #[must_use]
    pub fn with_client(client: reqwest::Client, config: &StoreConfig, kind: RecordKind) -> Self {
        Self {
            client,
            kind,
            url: config.collection_url(kind),
            api_key: config.api_key.clone(),
        }
    }

    /// Collection endpoint
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, &self.url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn by_id(&self, method: Method, id: &RecordId) -> RequestBuilder {
        self.request(method)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", RETURN_REPRESENTATION)
    }

    async fn send(&self, op: StoreOp, builder: RequestBuilder) -> Result<Vec<Value>, StoreError> {
        let response = builder.send().await.map_err(|e| transport(op, &e))?;
        let response = ensure_success(op, response).await?;
        rows(op, response).await
    }
}

#[async_trait]
impl RecordStore for RestStore {
    fn kind(&self) -> RecordKind {
        self.kind
    }

    async fn fetch_all(&self) -> Result<Fetched, FetchError> {
        let builder = self
            .request(Method::GET)
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        let raw = self.send(StoreOp::Fetch, builder).await?;

        let mut records = Vec::with_capacity(raw.len());
        let mut skipped = 0;
        for row in &raw {
            match Record::from_raw(self.kind, row) {
                Ok(record) => records.push(record),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(kind = %self.kind, error = %e, "skipping malformed row");
                }
            }
        }
        if sort_newest_first(&mut records) {
            tracing::debug!(kind = %self.kind, "backend returned unordered rows; sorted locally");
        }
        tracing::debug!(kind = %self.kind, count = records.len(), skipped, "fetched records");
        Ok(Fetched { records, skipped })
    }

    async fn update_status(&self, id: &RecordId, status: Status) -> Result<(), UpdateError> {
        if status.kind() != self.kind {
            return Err(StoreError::new(
                StoreOp::Update,
                ErrorKind::Invalid,
                format!("{status} is not a {} status", self.kind),
            ));
        }
        let builder = self
            .by_id(Method::PATCH, id)
            .json(&json!({ "status": status.as_str() }));
        let touched = self.send(StoreOp::Update, builder).await?;
        if touched.is_empty() {
            return Err(StoreError::new(
                StoreOp::Update,
                ErrorKind::NotFound,
                format!("no {} row with id {id}", self.kind),
            ));
        }
        tracing::info!(kind = %self.kind, %id, %status, "status updated");
        Ok(())
    }

    async fn remove(&self, id: &RecordId) -> Result<(), DeleteError> {
        let touched = self
            .send(StoreOp::Delete, self.by_id(Method::DELETE, id))
            .await?;
        if touched.is_empty() {
            return Err(StoreError::new(
                StoreOp::Delete,
                ErrorKind::NotFound,
                format!("no {} row with id {id}", self.kind),
            ));
        }
        tracing::info!(kind = %self.kind, %id, "record deleted");
        Ok(())
    }

    async fn create(&self, new: NewRecord) -> Result<Record, CreateError> {
        if new.kind() != self.kind {
            return Err(StoreError::new(
                StoreOp::Create,
                ErrorKind::Invalid,
                format!("cannot create {} in {} collection", new.kind(), self.kind),
            ));
        }
        let row = new
            .to_row()
            .map_err(|e| StoreError::new(StoreOp::Create, ErrorKind::Invalid, e.to_string()))?;
        let builder = self
            .request(Method::POST)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&row);
        let created = self.send(StoreOp::Create, builder).await?;
        let first = created.first().ok_or_else(|| {
            StoreError::new(StoreOp::Create, ErrorKind::Network, "insert returned no rows")
        })?;
        let record = Record::from_raw(self.kind, first)
            .map_err(|e| StoreError::new(StoreOp::Create, ErrorKind::Invalid, e.to_string()))?;
        tracing::info!(kind = %self.kind, id = %record.id, "record created");
        Ok(record)
    }
}
