//! Paper handlers: generation and per-user listing

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ApiJson;
use crate::AppState;
use papersmith_common::{
    db::{PaperStore, PaperSummary, UserStore},
    errors::{AppError, Result},
    paper::{GeneratedPaper, GenerationRequest, RequestOptions},
};

/// Paper configuration as submitted by the frontend
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePaperRequest {
    pub topic: String,

    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub audience: String,

    #[serde(default)]
    pub tone: String,

    /// Free-form: a page count, a word count, or a description
    #[serde(default)]
    pub page_length: serde_json::Value,

    #[serde(default)]
    pub citation_style: String,

    #[serde(default)]
    pub output_format: String,

    pub user_id: Uuid,
}

/// The stored paper, flattened next to its record id
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePaperResponse {
    pub id: Uuid,
    #[serde(flatten)]
    pub paper: GeneratedPaper,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperListItem {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub created_at: String,
}

impl From<PaperSummary> for PaperListItem {
    fn from(summary: PaperSummary) -> Self {
        Self {
            id: summary.id,
            title: summary.title,
            abstract_text: summary.abstract_text,
            created_at: summary.created_at.to_rfc3339(),
        }
    }
}

fn user_not_found(id: Uuid) -> AppError {
    AppError::NotFound {
        resource_type: "user".to_string(),
        id: id.to_string(),
    }
}

/// Generate, validate and store one paper
pub async fn generate(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GeneratePaperRequest>,
) -> Result<Json<GeneratePaperResponse>> {
    let owner_id = request.user_id;
    let generation = GenerationRequest::new(
        owner_id,
        request.topic,
        request.keywords,
        RequestOptions {
            audience: request.audience,
            tone: request.tone,
            page_length: request.page_length,
            citation_style: request.citation_style,
            output_format: request.output_format,
        },
    )?;

    if state.repo.find_user_by_id(owner_id).await?.is_none() {
        return Err(user_not_found(owner_id));
    }

    let outcome = state.pipeline.run(&generation).await?;

    let record = state
        .repo
        .find_paper_by_id(outcome.record_id)
        .await?
        .ok_or_else(|| AppError::Internal {
            message: format!("paper {} missing after insert", outcome.record_id),
        })?;

    Ok(Json(GeneratePaperResponse {
        id: outcome.record_id,
        paper: outcome.paper,
        created_at: record.created_at.to_rfc3339(),
    }))
}

/// List a user's papers, newest first
pub async fn list_papers(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<PaperListItem>>> {
    if state.repo.find_user_by_id(user_id).await?.is_none() {
        return Err(user_not_found(user_id));
    }

    let papers = state.repo.list_papers_by_owner(user_id).await?;

    tracing::debug!(user_id = %user_id, count = papers.len(), "Listed papers");

    Ok(Json(papers.into_iter().map(Into::into).collect()))
}
