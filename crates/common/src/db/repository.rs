//! Repository pattern for database operations
//!
//! Implements the store traits on top of SeaORM.

use crate::db::models::*;
use crate::db::store::{PaperStore, PaperSummary, UserStore};
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use crate::paper::GeneratedPaper;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr,
};
use uuid::Uuid;

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.conn()
    }

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    /// Full stored record, including the serialized paper
    pub async fn find_paper_by_id(&self, id: Uuid) -> Result<Option<PaperRecord>> {
        PaperEntity::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Most recent papers across all owners
    pub async fn list_recent_papers(&self, limit: u64) -> Result<Vec<PaperSummary>> {
        let papers = PaperEntity::find()
            .order_by_desc(PaperColumn::CreatedAt)
            .limit(limit)
            .all(self.conn())
            .await?;

        Ok(papers.into_iter().map(PaperSummary::from).collect())
    }
}

impl From<PaperRecord> for PaperSummary {
    fn from(record: PaperRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            abstract_text: record.abstract_text,
            created_at: record.created_at,
        }
    }
}

#[async_trait]
impl PaperStore for Repository {
    async fn create_paper(&self, owner_id: Uuid, paper: &GeneratedPaper) -> Result<Uuid> {
        let paper_id = Uuid::new_v4();
        let now = chrono::Utc::now();

        let record = PaperActiveModel {
            id: Set(paper_id),
            owner_id: Set(owner_id),
            title: Set(paper.title.clone()),
            abstract_text: Set(paper.abstract_text.clone()),
            introduction: Set(paper.introduction.clone()),
            conclusion: Set(paper.conclusion.clone()),
            full_text: Set(paper.to_full_text()?),
            created_at: Set(now.into()),
        };

        record.insert(self.conn()).await?;

        tracing::info!(paper_id = %paper_id, owner_id = %owner_id, "Paper record created");
        Ok(paper_id)
    }

    async fn list_papers_by_owner(&self, owner_id: Uuid) -> Result<Vec<PaperSummary>> {
        let papers = PaperEntity::find()
            .filter(PaperColumn::OwnerId.eq(owner_id))
            .order_by_desc(PaperColumn::CreatedAt)
            .all(self.conn())
            .await?;

        Ok(papers.into_iter().map(PaperSummary::from).collect())
    }
}

#[async_trait]
impl UserStore for Repository {
    async fn create_user(&self, email: &str, credential_hash: &str) -> Result<UserAccount> {
        if self.find_user_by_email(email).await?.is_some() {
            return Err(AppError::Duplicate {
                message: format!("email {} is already registered", email),
            });
        }

        let user = UserActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            credential_hash: Set(credential_hash.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };

        user.insert(self.conn()).await.map_err(|e| match e.sql_err() {
            // Lost a race with a concurrent signup for the same email
            Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Duplicate {
                message: format!("email {} is already registered", email),
            },
            _ => e.into(),
        })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserAccount>> {
        UserEntity::find()
            .filter(UserColumn::Email.eq(email))
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserAccount>> {
        UserEntity::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::paper::Section;
    use std::time::Duration;

    async fn memory_repo() -> Repository {
        let pool = DbPool::new(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout_secs: 5,
            idle_timeout_secs: 300,
        })
        .await
        .unwrap();
        pool.ensure_schema().await.unwrap();
        Repository::new(pool)
    }

    fn sample_paper(title: &str) -> GeneratedPaper {
        GeneratedPaper {
            title: title.to_string(),
            abstract_text: "A".to_string(),
            introduction: "I".to_string(),
            sections: vec![Section {
                title: "S1".to_string(),
                content: "C1".to_string(),
            }],
            conclusion: "Co".to_string(),
            references: vec!["R1".to_string()],
        }
    }

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let repo = memory_repo().await;
        repo.pool.ensure_schema().await.unwrap();
        repo.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let repo = memory_repo().await;
        let user = repo.create_user("ada@example.com", "$argon2id$hash").await.unwrap();

        let by_email = repo.find_user_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert_eq!(by_email.credential_hash, "$argon2id$hash");

        let by_id = repo.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "ada@example.com");

        assert!(repo.find_user_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = memory_repo().await;
        repo.create_user("dup@example.com", "h1").await.unwrap();
        let err = repo.create_user("dup@example.com", "h2").await.unwrap_err();
        assert!(matches!(err, AppError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn test_create_paper_stores_full_text() {
        let repo = memory_repo().await;
        let user = repo.create_user("w@example.com", "h").await.unwrap();
        let paper = sample_paper("T");

        let id = repo.create_paper(user.id, &paper).await.unwrap();
        let record = repo.find_paper_by_id(id).await.unwrap().unwrap();

        assert_eq!(record.owner_id, user.id);
        assert_eq!(record.title, "T");
        assert_eq!(record.abstract_text, "A");
        assert_eq!(record.introduction, "I");
        assert_eq!(record.conclusion, "Co");
        assert_eq!(record.full_text, paper.to_full_text().unwrap());

        let restored: GeneratedPaper = serde_json::from_str(&record.full_text).unwrap();
        assert_eq!(restored, paper);
    }

    #[tokio::test]
    async fn test_list_by_owner_newest_first() {
        let repo = memory_repo().await;
        let owner = repo.create_user("o@example.com", "h").await.unwrap();
        let other = repo.create_user("x@example.com", "h").await.unwrap();

        let first = repo.create_paper(owner.id, &sample_paper("first")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(15)).await;
        let second = repo.create_paper(owner.id, &sample_paper("second")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(15)).await;
        repo.create_paper(other.id, &sample_paper("not mine")).await.unwrap();

        let listed = repo.list_papers_by_owner(owner.id).await.unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second, first]);

        let recent = repo.list_recent_papers(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].title, "not mine");
    }

    #[tokio::test]
    async fn test_identical_papers_create_distinct_records() {
        let repo = memory_repo().await;
        let owner = repo.create_user("twice@example.com", "h").await.unwrap();
        let a = repo.create_paper(owner.id, &sample_paper("same")).await.unwrap();
        let b = repo.create_paper(owner.id, &sample_paper("same")).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(repo.list_papers_by_owner(owner.id).await.unwrap().len(), 2);
    }
}
