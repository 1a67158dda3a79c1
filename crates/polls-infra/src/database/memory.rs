//! In-memory poll storage - used when no database is configured.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use polls_core::domain::{Choice, Question};
use polls_core::error::RepoError;
use polls_core::ports::{
    BaseRepository, ChoiceRepository, PubDateOrder, PublishedQuestions, QuestionRepository,
};

#[derive(Default)]
struct StoreState {
    questions: Vec<Question>,
    /// Kept in insertion order.
    choices: Vec<Choice>,
}

/// Questions and choices held behind a single async RwLock, so cascades and
/// vote increments happen under one write guard.
///
/// Note: Data is lost on process restart.
pub struct InMemoryPollStore {
    state: RwLock<StoreState>,
}

impl InMemoryPollStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
        }
    }
}

impl Default for InMemoryPollStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRepository<Question, Uuid> for InMemoryPollStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Question>, RepoError> {
        let state = self.state.read().await;
        Ok(state.questions.iter().find(|q| q.id == id).cloned())
    }

    async fn create(&self, question: Question) -> Result<Question, RepoError> {
        let mut state = self.state.write().await;

        if state.questions.iter().any(|q| q.id == question.id) {
            return Err(RepoError::Constraint("Question id already exists".to_string()));
        }
        if state.questions.iter().any(|q| {
            q.question_text == question.question_text && q.pub_date == question.pub_date
        }) {
            return Err(RepoError::Constraint(
                "Question with this text and publish date already exists".to_string(),
            ));
        }

        state.questions.push(question.clone());
        Ok(question)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut state = self.state.write().await;

        let before = state.questions.len();
        state.questions.retain(|q| q.id != id);
        if state.questions.len() == before {
            return Err(RepoError::NotFound);
        }

        state.choices.retain(|c| c.question_id != id);
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryPollStore {
    async fn find_published(
        &self,
        query: PublishedQuestions,
    ) -> Result<Vec<Question>, RepoError> {
        let state = self.state.read().await;

        let mut found: Vec<Question> = state
            .questions
            .iter()
            .filter(|q| q.pub_date <= query.cutoff)
            .cloned()
            .collect();

        match query.order {
            PubDateOrder::NewestFirst => found.sort_by(|a, b| b.pub_date.cmp(&a.pub_date)),
            PubDateOrder::OldestFirst => found.sort_by(|a, b| a.pub_date.cmp(&b.pub_date)),
        }

        if let Some(limit) = query.limit {
            found.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }

        Ok(found)
    }

    async fn find_by_text_and_pub_date(
        &self,
        question_text: &str,
        pub_date: DateTime<Utc>,
    ) -> Result<Option<Question>, RepoError> {
        let state = self.state.read().await;
        Ok(state
            .questions
            .iter()
            .find(|q| q.question_text == question_text && q.pub_date == pub_date)
            .cloned())
    }
}

#[async_trait]
impl BaseRepository<Choice, Uuid> for InMemoryPollStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Choice>, RepoError> {
        let state = self.state.read().await;
        Ok(state.choices.iter().find(|c| c.id == id).cloned())
    }

    async fn create(&self, choice: Choice) -> Result<Choice, RepoError> {
        let mut state = self.state.write().await;
        insert_choice(&mut state, &choice)?;
        Ok(choice)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut state = self.state.write().await;

        let before = state.choices.len();
        state.choices.retain(|c| c.id != id);
        if state.choices.len() == before {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}

#[async_trait]
impl ChoiceRepository for InMemoryPollStore {
    async fn find_by_question(&self, question_id: Uuid) -> Result<Vec<Choice>, RepoError> {
        let state = self.state.read().await;
        Ok(state
            .choices
            .iter()
            .filter(|c| c.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn create_many(&self, choices: Vec<Choice>) -> Result<Vec<Choice>, RepoError> {
        let mut state = self.state.write().await;

        // Validate everything first so a failure leaves the store untouched.
        for (i, choice) in choices.iter().enumerate() {
            check_choice(&state, choice)?;
            if choices[..i].iter().any(|c| c.id == choice.id) {
                return Err(RepoError::Constraint("Choice id already exists".to_string()));
            }
        }

        state.choices.extend(choices.iter().cloned());
        Ok(choices)
    }

    async fn increment_votes(
        &self,
        question_id: Uuid,
        choice_id: Uuid,
    ) -> Result<bool, RepoError> {
        let mut state = self.state.write().await;

        match state
            .choices
            .iter_mut()
            .find(|c| c.id == choice_id && c.question_id == question_id)
        {
            Some(choice) => {
                choice.votes = choice.votes.saturating_add(1);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Mirror the foreign key and primary key constraints of the `choices` table.
fn check_choice(state: &StoreState, choice: &Choice) -> Result<(), RepoError> {
    if !state.questions.iter().any(|q| q.id == choice.question_id) {
        return Err(RepoError::Constraint(format!(
            "Question {} does not exist",
            choice.question_id
        )));
    }
    if state.choices.iter().any(|c| c.id == choice.id) {
        return Err(RepoError::Constraint("Choice id already exists".to_string()));
    }
    Ok(())
}

fn insert_choice(state: &mut StoreState, choice: &Choice) -> Result<(), RepoError> {
    check_choice(state, choice)?;
    state.choices.push(choice.clone());
    Ok(())
}
