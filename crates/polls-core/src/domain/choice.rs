use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Choice entity - a selectable option on a question, with a vote tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: Uuid,
    pub question_id: Uuid,
    pub choice_text: String,
    pub votes: u32,
}

impl Choice {
    /// Create a new choice with no votes.
    pub fn new(question_id: Uuid, choice_text: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            question_id,
            choice_text,
            votes: 0,
        }
    }
}
