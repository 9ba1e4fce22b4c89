//! Web search client
//!
//! Provides a narrow interface over the web search collaborator:
//! - `SearchProvider` trait so pipelines can run against fakes
//! - `SerperClient` speaking the Serper JSON API
//! - `SearchResult` folding into a prompt context string

use crate::config::SearchConfig;
use crate::errors::{AppError, Result};
use crate::metrics;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single organic search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
}

/// Ranked hits for one query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub hits: Vec<SearchHit>,
}

impl SearchResult {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self { hits }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Fold hits into the prompt context: `title\nsnippet` blocks separated by a blank line
    pub fn to_context(&self) -> String {
        self.hits
            .iter()
            .map(|hit| format!("{}\n{}", hit.title, hit.snippet))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Bare snippet strings in rank order
    pub fn snippets(&self) -> Vec<&str> {
        self.hits.iter().map(|hit| hit.snippet.as_str()).collect()
    }
}

/// Trait for web search
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one query against the provider
    async fn search(&self, query: &str) -> Result<SearchResult>;
}

#[derive(Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
}

#[derive(Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperOrganic>,
}

#[derive(Deserialize)]
struct SerperOrganic {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

/// Serper search client
pub struct SerperClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    max_results: Option<usize>,
}

impl SerperClient {
    /// Create a new client from explicit configuration
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AppError::Configuration {
                message: "search.api_key is required".to_string(),
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key,
            endpoint: config.endpoint.clone(),
            max_results: config.max_results,
        })
    }

    /// Cap the number of hits kept from each response
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }
}

#[async_trait]
impl SearchProvider for SerperClient {
    async fn search(&self, query: &str) -> Result<SearchResult> {
        tracing::debug!(query = %query, "Sending search request");

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&SerperRequest { q: query })
            .send()
            .await
            .map_err(|e| {
                metrics::record_search_request("unavailable");
                AppError::SearchUnavailable {
                    message: format!("Request failed: {}", e),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            metrics::record_search_request("provider_error");
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(200).collect();
            return Err(AppError::SearchProviderError {
                status: Some(status.as_u16()),
                message: format!("API error {}: {}", status, excerpt),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            metrics::record_search_request("unavailable");
            AppError::SearchUnavailable {
                message: format!("Failed to read response body: {}", e),
            }
        })?;

        let parsed: SerperResponse = serde_json::from_slice(&body).map_err(|e| {
            metrics::record_search_request("provider_error");
            AppError::SearchProviderError {
                status: Some(status.as_u16()),
                message: format!("Failed to parse response: {}", e),
            }
        })?;

        let mut hits: Vec<SearchHit> = parsed
            .organic
            .into_iter()
            .map(|item| SearchHit {
                title: item.title,
                snippet: item.snippet,
            })
            .collect();

        if let Some(max) = self.max_results {
            hits.truncate(max);
        }

        metrics::record_search_request("success");
        tracing::info!(query = %query, hits = hits.len(), "Search completed");

        Ok(SearchResult::new(hits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> SearchConfig {
        SearchConfig {
            api_key: Some("test-key".to_string()),
            endpoint: format!("{}/search", server.uri()),
            timeout_secs: 5,
            max_results: None,
        }
    }

    #[test]
    fn test_context_joins_hits_with_blank_lines() {
        let result = SearchResult::new(vec![
            SearchHit { title: "A".into(), snippet: "first".into() },
            SearchHit { title: "B".into(), snippet: String::new() },
        ]);
        assert_eq!(result.to_context(), "A\nfirst\n\nB\n");
        assert_eq!(result.snippets(), vec!["first", ""]);
    }

    #[test]
    fn test_empty_result_gives_empty_context() {
        assert_eq!(SearchResult::default().to_context(), "");
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let err = SerperClient::new(&SearchConfig::default()).err().unwrap();
        assert!(matches!(err, AppError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_search_parses_organic_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("X-API-KEY", "test-key"))
            .and(body_json(serde_json::json!({ "q": "rust async" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "organic": [
                    { "title": "Tokio", "snippet": "An async runtime", "link": "https://tokio.rs" },
                    { "title": "No snippet" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = SerperClient::new(&config_for(&server)).unwrap();
        let result = client.search("rust async").await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result.hits[0].title, "Tokio");
        assert_eq!(result.hits[0].snippet, "An async runtime");
        assert_eq!(result.hits[1].snippet, "");
    }

    #[tokio::test]
    async fn test_missing_organic_list_is_empty_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "searchParameters": { "q": "nothing" }
            })))
            .mount(&server)
            .await;

        let client = SerperClient::new(&config_for(&server)).unwrap();
        let result = client.search("nothing").await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_max_results_truncates() {
        let server = MockServer::start().await;
        let organic: Vec<_> = (0..8)
            .map(|i| serde_json::json!({ "title": format!("T{}", i), "snippet": format!("S{}", i) }))
            .collect();
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "organic": organic })),
            )
            .mount(&server)
            .await;

        let client = SerperClient::new(&config_for(&server))
            .unwrap()
            .with_max_results(5);
        let result = client.search("many").await.unwrap();
        assert_eq!(result.len(), 5);
        assert_eq!(result.hits[4].title, "T4");
    }

    #[tokio::test]
    async fn test_non_success_status_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let client = SerperClient::new(&config_for(&server)).unwrap();
        let err = client.search("q").await.unwrap_err();
        match err {
            AppError::SearchProviderError { status, message } => {
                assert_eq!(status, Some(403));
                assert!(message.contains("invalid key"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = SerperClient::new(&config_for(&server)).unwrap();
        let err = client.search("q").await.unwrap_err();
        assert!(matches!(err, AppError::SearchProviderError { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unavailable() {
        let config = SearchConfig {
            api_key: Some("k".to_string()),
            endpoint: "http://127.0.0.1:9/search".to_string(),
            timeout_secs: 2,
            max_results: None,
        };
        let client = SerperClient::new(&config).unwrap();
        let err = client.search("q").await.unwrap_err();
        assert!(matches!(err, AppError::SearchUnavailable { .. }));
    }
}
