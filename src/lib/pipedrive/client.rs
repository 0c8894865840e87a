use reqwest::{Client, Method, StatusCode, Url};
use secrecy::{ExposeSecret, Secret};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use thiserror::Error;

use crate::error;
use crate::telemetry::LogKey;

const PAGE_LIMIT: u64 = 100;

/// Connection established for a Pipedrive account through OAuth2.
#[derive(Clone, Debug, Deserialize)]
pub struct PipedriveAuth {
    pub access_token: Secret<String>,
    // Company specific domain, e.g. https://acme.pipedrive.com
    pub api_domain: String,
}

#[derive(Debug, Error)]
pub enum PipedriveError {
    #[error("request to pipedrive failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("pipedrive returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("invalid pipedrive url: {0}")]
    InvalidUrl(String),
    #[error("could not decode pipedrive response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl PipedriveError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            PipedriveError::Api { status, .. } => StatusCode::from_u16(*status).ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    more_items_in_collection: bool,
    next_start: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct AdditionalData {
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct PaginatedResponse<T> {
    data: Option<Vec<T>>,
    additional_data: Option<AdditionalData>,
}

pub struct PipedriveClient {
    client: Client,
    base_url: String,
    access_token: Secret<String>,
}

impl PipedriveClient {
    pub fn new(auth: &PipedriveAuth) -> PipedriveClient {
        PipedriveClient {
            client: Client::new(),
            base_url: format!("{}/api/v1", auth.api_domain.trim_end_matches('/')),
            access_token: auth.access_token.clone(),
        }
    }

    pub fn url(&self, resource_uri: &str) -> Result<Url, PipedriveError> {
        let raw = format!("{}{}", self.base_url, resource_uri);
        Url::parse(&raw).map_err(|e| PipedriveError::InvalidUrl(format!("{}: {}", raw, e)))
    }

    /// Single request. Non-2xx responses are returned as `PipedriveError::Api`
    /// and never retried.
    pub async fn api_call<T: DeserializeOwned>(
        &self,
        method: Method,
        resource_uri: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T, PipedriveError> {
        let mut request = self
            .client
            .request(method, self.url(resource_uri)?)
            .bearer_auth(self.access_token.expose_secret())
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(
                LogKey::PipedriveRequestFailed,
                status = status.as_u16(),
                resource_uri = resource_uri,
                "Pipedrive did not return a success status."
            );
            return Err(PipedriveError::Api {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// GET every page of a collection, following `next_start`.
    pub async fn paginated_api_call<T: DeserializeOwned>(
        &self,
        resource_uri: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, PipedriveError> {
        let mut items = Vec::new();
        let mut start = 0;
        loop {
            let mut page_query = query.to_vec();
            page_query.push(("start", start.to_string()));
            page_query.push(("limit", PAGE_LIMIT.to_string()));
            let page: PaginatedResponse<T> = self
                .api_call(Method::GET, resource_uri, &page_query, None)
                .await?;
            items.extend(page.data.unwrap_or_default());
            let next = page
                .additional_data
                .and_then(|d| d.pagination)
                .filter(|p| p.more_items_in_collection)
                .and_then(|p| p.next_start);
            match next {
                Some(next_start) if next_start > start => start = next_start,
                _ => break,
            }
        }
        Ok(items)
    }
}
