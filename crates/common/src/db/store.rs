//! Persistence interfaces consumed by the pipeline and the HTTP layer

use crate::db::models::UserAccount;
use crate::errors::Result;
use crate::paper::GeneratedPaper;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Listing projection of a stored paper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperSummary {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub created_at: DateTime<FixedOffset>,
}

/// Paper record persistence
#[async_trait]
pub trait PaperStore: Send + Sync {
    /// Persist a validated paper for its owner, returning the new record id
    async fn create_paper(&self, owner_id: Uuid, paper: &GeneratedPaper) -> Result<Uuid>;

    /// Papers owned by a user, newest first
    async fn list_papers_by_owner(&self, owner_id: Uuid) -> Result<Vec<PaperSummary>>;
}

/// User account persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create an account; duplicate emails are rejected
    async fn create_user(&self, email: &str, credential_hash: &str) -> Result<UserAccount>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserAccount>>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserAccount>>;
}
