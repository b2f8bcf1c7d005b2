//! Elasticsearch HTTP client implementation

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use urlencoding::encode;

use crate::domain::ports::ElasticsearchClient;
use crate::error::SourceError;

/// Elasticsearch client over plain HTTP+JSON
pub struct HttpElasticsearchClient {
    http: Client,
    base_url: String,
}

impl HttpElasticsearchClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, index: &str, action: &str) -> String {
        format!("{}/{}/{}", self.base_url, encode(index), action)
    }

    async fn post(&self, url: String, body: &Value) -> Result<Value, SourceError> {
        let response = self.http.post(&url).json(body).send().await?;
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| SourceError::Decode(e.to_string()))
        } else {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(%url, status = status.as_u16(), "Elasticsearch request failed");
            Err(SourceError::Elasticsearch {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl ElasticsearchClient for HttpElasticsearchClient {
    async fn search(&self, index: &str, body: &Value) -> Result<Value, SourceError> {
        self.post(self.endpoint(index, "_search"), body).await
    }

    async fn count(&self, index: &str, body: &Value) -> Result<Value, SourceError> {
        self.post(self.endpoint(index, "_count"), body).await
    }
}
