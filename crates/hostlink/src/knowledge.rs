//! Client for the knowledge store.
//!
//! Plain request/response HTTP, independent of the host session. Used to keep
//! design rationale and user material templates.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::KnowledgeConfig;
use crate::http::{base_url, build_client};

pub const RATIONALE_TAG: &str = "rationale";

#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("knowledge store is disabled")]
    Disabled,

    #[error("knowledge store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("knowledge store returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Serialize)]
struct AddRequest<'a> {
    document: &'a str,
    category: &'a str,
    /// Comma-separated.
    tags: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    doc_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct AddResponse {
    id: String,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    n_results: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    documents: Vec<String>,
}

pub struct KnowledgeClient {
    client: reqwest::Client,
    base_url: String,
    enabled: bool,
}

impl KnowledgeClient {
    pub fn new(config: &KnowledgeConfig) -> Result<Self, KnowledgeError> {
        Ok(Self {
            client: build_client(config.timeout)?,
            base_url: base_url(&config.base_url),
            enabled: config.enabled,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Store a document; returns the id the store assigned (or kept).
    pub async fn add(
        &self,
        document: &str,
        category: &str,
        tags: &[&str],
        doc_id: Option<&str>,
    ) -> Result<String, KnowledgeError> {
        self.ensure_enabled()?;
        let body = AddRequest {
            document,
            category,
            tags: tags.join(","),
            doc_id,
        };
        let response = self
            .client
            .post(format!("{}/knowledge", self.base_url))
            .json(&body)
            .send()
            .await?;
        let added: AddResponse = check(response).await?.json().await?;
        tracing::debug!(category, id = %added.id, "Stored knowledge document");
        Ok(added.id)
    }

    /// Documents most relevant to `query`, best first.
    pub async fn search(
        &self,
        query: &str,
        category: Option<&str>,
        n_results: u32,
    ) -> Result<Vec<String>, KnowledgeError> {
        self.ensure_enabled()?;
        let body = SearchRequest {
            query,
            category,
            n_results,
        };
        let response = self
            .client
            .post(format!("{}/knowledge/search", self.base_url))
            .json(&body)
            .send()
            .await?;
        let found: SearchResponse = check(response).await?.json().await?;
        tracing::debug!(?category, hits = found.documents.len(), "Knowledge search");
        Ok(found.documents)
    }

    pub async fn delete(&self, doc_id: &str) -> Result<(), KnowledgeError> {
        self.ensure_enabled()?;
        let response = self
            .client
            .delete(format!("{}/knowledge/{}", self.base_url, doc_id))
            .send()
            .await?;
        check(response).await?;
        tracing::debug!(doc_id, "Deleted knowledge document");
        Ok(())
    }

    /// Keep why an action was taken, alongside what it touched.
    pub async fn record_rationale(
        &self,
        action: &str,
        details: &Value,
        rationale: &str,
        category: &str,
    ) -> Result<String, KnowledgeError> {
        let document = json!({
            "action": action,
            "rationale": rationale,
            "details": details,
            "recorded_at": chrono::Utc::now().to_rfc3339(),
        });
        self.add(
            &document.to_string(),
            category,
            &[RATIONALE_TAG, action],
            None,
        )
        .await
    }

    fn ensure_enabled(&self) -> Result<(), KnowledgeError> {
        if self.enabled {
            Ok(())
        } else {
            Err(KnowledgeError::Disabled)
        }
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, KnowledgeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(KnowledgeError::Status {
        status: status.as_u16(),
        body,
    })
}
