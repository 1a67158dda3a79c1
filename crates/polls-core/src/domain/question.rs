use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Choice;

/// Question entity - a poll prompt with a publish time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
}

impl Question {
    /// Create a new question with a generated, time-ordered ID.
    pub fn new(question_text: String, pub_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            question_text,
            pub_date,
        }
    }

    /// A question is visible once its publish time has passed.
    pub fn is_published(&self, now: DateTime<Utc>) -> bool {
        self.pub_date <= now
    }

    /// Published within the last day, and not scheduled for the future.
    pub fn was_published_recently(&self, now: DateTime<Utc>) -> bool {
        now - Duration::days(1) <= self.pub_date && self.pub_date <= now
    }
}

/// A question together with its choices, in creation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    pub question: Question,
    pub choices: Vec<Choice>,
}

impl Poll {
    pub fn total_votes(&self) -> u64 {
        self.choices.iter().map(|c| u64::from(c.votes)).sum()
    }
}
