//! Poll service - the operations behind every polls endpoint.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

use crate::domain::{Choice, MAX_TEXT_LEN, Poll, Question};
use crate::error::{DomainError, RepoError};
use crate::ports::{ChoiceRepository, Clock, PublishedQuestions, QuestionRepository};

/// Number of questions shown on the index.
pub const LATEST_QUESTIONS: u64 = 5;

/// Message shown when a vote does not name a valid choice.
pub const NO_CHOICE_SELECTED: &str = "You didn't select a choice.";

/// Input for creating a poll.
#[derive(Debug, Clone)]
pub struct NewPoll {
    pub question_text: String,
    /// One choice per line; blank lines are skipped.
    pub choice_texts: String,
    /// Publish time, defaults to now.
    pub pub_date: Option<DateTime<Utc>>,
}

/// Outcome of [`PollService::create`].
#[derive(Debug, Clone)]
pub struct CreatedPoll {
    pub question: Question,
    /// `false` when an identical question already existed and was reused.
    pub created: bool,
    /// Choices added by this call.
    pub choices: Vec<Choice>,
}

/// Poll service over the question and choice repositories.
#[derive(Clone)]
pub struct PollService {
    questions: Arc<dyn QuestionRepository>,
    choices: Arc<dyn ChoiceRepository>,
    clock: Arc<dyn Clock>,
}

impl PollService {
    pub fn new(
        questions: Arc<dyn QuestionRepository>,
        choices: Arc<dyn ChoiceRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            questions,
            choices,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The five most recently published questions, newest first.
    pub async fn latest_questions(&self) -> Result<Vec<Question>, DomainError> {
        let query = PublishedQuestions::latest(self.clock.now(), LATEST_QUESTIONS);
        Ok(self.questions.find_published(query).await?)
    }

    /// A published question with its choices. Unpublished questions are reported
    /// as missing.
    pub async fn detail(&self, question_id: Uuid) -> Result<Poll, DomainError> {
        let now = self.clock.now();
        let question = self
            .questions
            .find_by_id(question_id)
            .await?
            .filter(|q| q.is_published(now))
            .ok_or_else(|| DomainError::question_not_found(question_id))?;

        self.with_choices(question).await
    }

    /// A question with its vote tallies, whether or not it is published.
    pub async fn results(&self, question_id: Uuid) -> Result<Poll, DomainError> {
        let question = self.question(question_id).await?;
        self.with_choices(question).await
    }

    /// Record one vote for `selection`, the raw choice ID submitted with the form.
    ///
    /// Returns the ID of the choice that received the vote.
    pub async fn vote(
        &self,
        question_id: Uuid,
        selection: Option<&str>,
    ) -> Result<Uuid, DomainError> {
        self.question(question_id).await?;

        let choice_id = selection
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| DomainError::Validation(NO_CHOICE_SELECTED.to_string()))?;

        if !self.choices.increment_votes(question_id, choice_id).await? {
            return Err(DomainError::choice_not_found(choice_id));
        }

        Ok(choice_id)
    }

    /// Create a question, or reuse one with the same text and publish time, and
    /// add one choice per non-blank line of `choice_texts`.
    pub async fn create(&self, poll: NewPoll) -> Result<CreatedPoll, DomainError> {
        let question_text = poll.question_text.trim();
        if question_text.is_empty() {
            return Err(DomainError::Validation(
                "Question text is required".to_string(),
            ));
        }
        check_length("Question text", question_text)?;

        let choice_texts: Vec<&str> = poll
            .choice_texts
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        for text in &choice_texts {
            check_length("Choice text", text)?;
        }

        let pub_date = poll
            .pub_date
            .map(|d| d.trunc_subsecs(6))
            .unwrap_or_else(|| self.clock.now());

        let (question, created) = self.get_or_create_question(question_text, pub_date).await?;

        let choices = choice_texts
            .into_iter()
            .map(|text| Choice::new(question.id, text.to_string()))
            .collect();
        let choices = self.choices.create_many(choices).await?;

        Ok(CreatedPoll {
            question,
            created,
            choices,
        })
    }

    /// Delete a question together with its choices.
    pub async fn delete(&self, question_id: Uuid) -> Result<(), DomainError> {
        self.questions
            .delete(question_id)
            .await
            .map_err(|e| match e {
                RepoError::NotFound => DomainError::question_not_found(question_id),
                other => other.into(),
            })
    }

    async fn question(&self, question_id: Uuid) -> Result<Question, DomainError> {
        self.questions
            .find_by_id(question_id)
            .await?
            .ok_or_else(|| DomainError::question_not_found(question_id))
    }

    async fn with_choices(&self, question: Question) -> Result<Poll, DomainError> {
        let choices = self.choices.find_by_question(question.id).await?;
        Ok(Poll { question, choices })
    }

    async fn get_or_create_question(
        &self,
        question_text: &str,
        pub_date: DateTime<Utc>,
    ) -> Result<(Question, bool), DomainError> {
        if let Some(existing) = self
            .questions
            .find_by_text_and_pub_date(question_text, pub_date)
            .await?
        {
            return Ok((existing, false));
        }

        match self
            .questions
            .create(Question::new(question_text.to_string(), pub_date))
            .await
        {
            Ok(question) => Ok((question, true)),
            // An identical question was inserted concurrently.
            Err(RepoError::Constraint(msg)) => self
                .questions
                .find_by_text_and_pub_date(question_text, pub_date)
                .await?
                .map(|q| (q, false))
                .ok_or(DomainError::Repository(RepoError::Constraint(msg))),
            Err(e) => Err(e.into()),
        }
    }
}

fn check_length(field: &str, text: &str) -> Result<(), DomainError> {
    if text.chars().count() > MAX_TEXT_LEN {
        return Err(DomainError::Validation(format!(
            "{field} must be at most {MAX_TEXT_LEN} characters"
        )));
    }
    Ok(())
}
