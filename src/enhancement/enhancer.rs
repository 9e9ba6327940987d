// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Outbound query enhancement call.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::QueryEnhancementConfig;

/// Why an enhancement call produced nothing usable.
///
/// Never leaves the crate's enhancement layer: the cache logs it and falls
/// back to the original query.
#[derive(Debug, thiserror::Error)]
pub enum EnhancementError {
    #[error("failed to create HTTP client: {0}")]
    Client(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("HTTP error! status: {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Rewrites a free-text query.
///
/// `Ok(None)` means the service answered but had no rewrite to offer.
#[async_trait]
pub trait QueryEnhancer: Send + Sync {
    async fn enhance(&self, query: &str) -> Result<Option<String>, EnhancementError>;
}

#[derive(Serialize)]
struct EnhanceRequest<'a> {
    text: &'a str,
}

/// Deployed services answer with `processed`; older ones echo `text`.
#[derive(Deserialize)]
struct EnhanceResponse {
    #[serde(default)]
    processed: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

impl EnhanceResponse {
    fn rewritten(self) -> Option<String> {
        self.processed
            .filter(|p| !p.trim().is_empty())
            .or(self.text.filter(|t| !t.trim().is_empty()))
    }
}

/// `POST <url>` with `{"text": query}`.
///
/// No timeout of its own: the cache bounds every call and dropping the
/// future aborts the request.
pub struct HttpQueryEnhancer {
    client: Client,
    url: String,
}

impl HttpQueryEnhancer {
    pub fn new(url: impl Into<String>) -> Result<Self, EnhancementError> {
        let client = Client::builder()
            .build()
            .map_err(|e| EnhancementError::Client(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_config(config: &QueryEnhancementConfig) -> Result<Self, EnhancementError> {
        Self::new(config.url.clone())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Debug for HttpQueryEnhancer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpQueryEnhancer")
            .field("url", &self.url)
            .finish()
    }
}

#[async_trait]
impl QueryEnhancer for HttpQueryEnhancer {
    async fn enhance(&self, query: &str) -> Result<Option<String>, EnhancementError> {
        // .json() sets Content-Type: application/json
        let response = self
            .client
            .post(&self.url)
            .json(&EnhanceRequest { text: query })
            .send()
            .await
            .map_err(|e| EnhancementError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnhancementError::Status(status.as_u16()));
        }

        let body: EnhanceResponse = response
            .json()
            .await
            .map_err(|e| EnhancementError::Malformed(e.to_string()))?;

        Ok(body.rewritten())
    }
}

/// Enhancer used when enhancement is disabled; never called by the cache.
#[derive(Debug, Default)]
pub struct NoopEnhancer;

#[async_trait]
impl QueryEnhancer for NoopEnhancer {
    async fn enhance(&self, _query: &str) -> Result<Option<String>, EnhancementError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Option<String> {
        serde_json::from_value::<EnhanceResponse>(value).unwrap().rewritten()
    }

    #[test]
    fn test_response_processed_field() {
        assert_eq!(
            parse(json!({ "processed": "enhanced query", "original": "original query" })),
            Some("enhanced query".to_string())
        );
    }

    #[test]
    fn test_response_text_field() {
        assert_eq!(
            parse(json!({ "text": "شامبو ضد القشرة" })),
            Some("شامبو ضد القشرة".to_string())
        );
    }

    #[test]
    fn test_response_missing_or_empty() {
        assert_eq!(parse(json!({ "invalid": "format" })), None);
        assert_eq!(parse(json!({ "processed": "" })), None);
        assert_eq!(parse(json!({ "processed": "  ", "text": "x" })), Some("x".to_string()));
    }

    #[test]
    fn test_non_string_field_is_malformed() {
        assert!(serde_json::from_value::<EnhanceResponse>(json!({ "processed": 5 })).is_err());
    }
}
