/// Table client: the single point of entry for every call to the hosted table store.
///
/// Batch jobs talk to `dyn TableStore`; `AirtableClient` is the production backend.
/// This layer never retries: a failed call surfaces status and body to the caller,
/// which logs and moves on to the next record.
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

#[cfg(test)]
pub mod memory;

/// Field-name → value mapping of a single record.
pub type Fields = Map<String, Value>;

const PAGE_SIZE: &str = "100";
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid table store URL: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub fields: Fields,
    #[serde(
        rename = "createdTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListPage {
    records: Vec<Record>,
    offset: Option<String>,
}

#[derive(Debug, Serialize)]
struct FieldsBody<'a> {
    fields: &'a Fields,
}

/// Generic record access against a named table.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Returns every record in the table, following continuation cursors.
    async fn list(&self, table: &str) -> Result<Vec<Record>, StoreError>;

    async fn create(&self, table: &str, fields: Fields) -> Result<Record, StoreError>;

    /// Partial update: only the supplied fields change.
    async fn update(
        &self,
        table: &str,
        record_id: &str,
        fields: Fields,
    ) -> Result<Record, StoreError>;
}

/// Airtable REST backend.
#[derive(Clone)]
pub struct AirtableClient {
    client: Client,
    api_url: String,
    base_id: String,
    api_key: String,
}

impl AirtableClient {
    pub fn new(api_url: String, base_id: String, api_key: String) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_url,
            base_id,
            api_key,
        })
    }

    /// `{api_url}/{base_id}/{table}[/{record_id}]` with each segment percent-encoded.
    fn table_url(&self, table: &str, record_id: Option<&str>) -> Result<Url, StoreError> {
        let mut url =
            Url::parse(&self.api_url).map_err(|e| StoreError::InvalidUrl(e.to_string()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StoreError::InvalidUrl(self.api_url.clone()))?;
            segments.pop_if_empty().push(&self.base_id).push(table);
            if let Some(id) = record_id {
                segments.push(id);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl TableStore for AirtableClient {
    async fn list(&self, table: &str) -> Result<Vec<Record>, StoreError> {
        let url = self.table_url(table, None)?;
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(url.clone())
                .bearer_auth(&self.api_key)
                .query(&[("pageSize", PAGE_SIZE)]);
            if let Some(cursor) = &offset {
                request = request.query(&[("offset", cursor.as_str())]);
            }

            let page: ListPage = parse_response(request.send().await?).await?;
            debug!("Fetched {} records from '{}'", page.records.len(), table);
            records.extend(page.records);

            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(records)
    }

    async fn create(&self, table: &str, fields: Fields) -> Result<Record, StoreError> {
        let url = self.table_url(table, None)?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&FieldsBody { fields: &fields })
            .send()
            .await?;
        parse_response(response).await
    }

    async fn update(
        &self,
        table: &str,
        record_id: &str,
        fields: Fields,
    ) -> Result<Record, StoreError> {
        let url = self.table_url(table, Some(record_id))?;
        let response = self
            .client
            .patch(url)
            .bearer_auth(&self.api_key)
            .json(&FieldsBody { fields: &fields })
            .send()
            .await?;
        parse_response(response).await
    }
}

/// 200 and 201 are success; anything else becomes `StoreError::Api` with the raw body.
async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    let status = response.status().as_u16();
    let body = response.text().await?;

    if status != 200 && status != 201 {
        return Err(StoreError::Api { status, body });
    }

    serde_json::from_str(&body).map_err(StoreError::Parse)
}
