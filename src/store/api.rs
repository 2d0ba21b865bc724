//! Remote HTTP FAQ backend.
//!
//! Talks to an external FAQ service exposing `GET/POST /faqs`,
//! `PUT/DELETE /faqs/{id}` and optionally `POST /faqs/bulk`. Observable
//! upsert/delete semantics match the file backend so the pipeline cannot
//! tell the two apart.

use reqwest::Client;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use tracing::warn;

use crate::errors::FaqBotError;
use crate::errors::Result;
use crate::models::FaqInput;
use crate::models::FaqRecord;

const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct ApiStore {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl ApiStore {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| FaqBotError::Http(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    pub async fn get_all(&self) -> Result<Vec<FaqRecord>> {
        let body: Value = self
            .request(Method::GET, "/faqs", None::<&()>)
            .await?
            .ok_or_else(|| FaqBotError::Store("Empty response from FAQ API".to_string()))?;

        // Both a bare array and a {"faqs": [...]} wrapper are accepted.
        let items = match body {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("faqs") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(FaqBotError::Store(
                        "Unexpected FAQ API response format".to_string(),
                    ))
                }
            },
            _ => {
                return Err(FaqBotError::Store(
                    "Unexpected FAQ API response format".to_string(),
                ))
            }
        };

        Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<FaqRecord>(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping undecodable FAQ record from API: {e}");
                    None
                }
            })
            .collect())
    }

    pub async fn upsert(&self, input: FaqInput) -> Result<FaqRecord> {
        let body: Value = match &input.id {
            Some(id) => self
                .request(Method::PUT, &format!("/faqs/{id}"), Some(&input))
                .await?
                .ok_or_else(|| FaqBotError::Store("FAQ API returned no record".to_string()))?,
            None => self
                .request(Method::POST, "/faqs", Some(&input))
                .await?
                .ok_or_else(|| FaqBotError::Store("FAQ API returned no record".to_string()))?,
        };

        serde_json::from_value(body).map_err(FaqBotError::Serialization)
    }

    /// Try the bulk route once; services without it get per-item upserts.
    pub async fn bulk_upsert(&self, items: &[FaqInput]) -> Result<usize> {
        #[derive(Serialize)]
        struct BulkRequest<'a> {
            faqs: &'a [FaqInput],
        }

        match self
            .request(Method::POST, "/faqs/bulk", Some(&BulkRequest { faqs: items }))
            .await
        {
            // A bulk route that reports no count is assumed to have applied
            // every item, as its success status implies.
            Ok(body) => return Ok(bulk_count(body.as_ref()).unwrap_or(items.len())),
            Err(e) => debug!("Bulk endpoint unavailable ({e}), upserting items individually"),
        }

        let mut count = 0;
        for item in items {
            match self.upsert(item.clone()).await {
                Ok(_) => count += 1,
                Err(e) => warn!("Skipping item in bulk upsert via API: {e}"),
            }
        }
        Ok(count)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        match self
            .request::<()>(Method::DELETE, &format!("/faqs/{id}"), None)
            .await
        {
            Ok(_) => Ok(true),
            Err(FaqBotError::ApiStatus { status: 404, .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<Option<Value>> {
        let url = format!("{}{endpoint}", self.base_url);
        debug!("FAQ API request: {method} {url}");

        let mut builder = self
            .client
            .request(method, &url)
            .header("Accept", "application/json");

        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| FaqBotError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FaqBotError::ApiStatus {
                status: status.as_u16(),
                message: text,
            });
        }

        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let value = response
            .json()
            .await
            .map_err(|e| FaqBotError::Store(format!("Failed to parse FAQ API response: {e}")))?;
        Ok(Some(value))
    }
}

/// Applied-item count reported by the bulk route, when the service exposes
/// one.
fn bulk_count(body: Option<&Value>) -> Option<usize> {
    let body = body?;
    body.get("count")
        .or_else(|| body.get("upserted"))
        .and_then(Value::as_u64)
        .map(|n| n as usize)
}
