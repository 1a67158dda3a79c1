use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Choice, Question};
use crate::error::RepoError;

/// Generic repository trait defining the standard record operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity.
    async fn create(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// Ordering applied to `pub_date` when listing questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PubDateOrder {
    NewestFirst,
    OldestFirst,
}

/// Filter for questions published at or before `cutoff`.
#[derive(Debug, Clone, Copy)]
pub struct PublishedQuestions {
    pub cutoff: DateTime<Utc>,
    pub order: PubDateOrder,
    pub limit: Option<u64>,
}

impl PublishedQuestions {
    /// The `limit` newest questions published at or before `cutoff`.
    pub fn latest(cutoff: DateTime<Utc>, limit: u64) -> Self {
        Self {
            cutoff,
            order: PubDateOrder::NewestFirst,
            limit: Some(limit),
        }
    }
}

/// Question repository. Deleting a question cascades to its choices.
#[async_trait]
pub trait QuestionRepository: BaseRepository<Question, Uuid> {
    /// Questions matching the filter, in the requested order.
    async fn find_published(&self, query: PublishedQuestions)
    -> Result<Vec<Question>, RepoError>;

    /// Find the question with exactly this text and publish time.
    async fn find_by_text_and_pub_date(
        &self,
        question_text: &str,
        pub_date: DateTime<Utc>,
    ) -> Result<Option<Question>, RepoError>;
}

/// Choice repository.
#[async_trait]
pub trait ChoiceRepository: BaseRepository<Choice, Uuid> {
    /// All choices of a question, in creation order.
    async fn find_by_question(&self, question_id: Uuid) -> Result<Vec<Choice>, RepoError>;

    /// Insert several choices; either all are stored or none.
    async fn create_many(&self, choices: Vec<Choice>) -> Result<Vec<Choice>, RepoError>;

    /// Atomically add one vote to a choice of the given question.
    ///
    /// Returns `false` when no choice with that ID belongs to the question.
    async fn increment_votes(&self, question_id: Uuid, choice_id: Uuid)
    -> Result<bool, RepoError>;
}
