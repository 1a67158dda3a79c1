//! Data Transfer Objects - forms and documents for the polls API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Vote form. `choice` holds the ID of the selected choice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoteForm {
    #[serde(default)]
    pub choice: Option<String>,
}

/// Form for creating a question with its choices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQuestionForm {
    pub question_text: String,
    /// One choice per line.
    #[serde(default)]
    pub choice_texts: String,
    /// Optional publish time (RFC 3339); defaults to now. HTML forms submit
    /// an untouched date field as `pub_date=`, which reads as unset.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub pub_date: Option<DateTime<Utc>>,
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => DateTime::parse_from_rfc3339(value)
            .map(|date| Some(date.with_timezone(&Utc)))
            .map_err(|e| serde::de::Error::custom(format!("invalid pub_date: {e}"))),
    }
}

/// A question as listed on the index and embedded in poll documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub id: String,
    pub question_text: String,
    pub pub_date: String,
    pub was_published_recently: bool,
}

/// A choice offered on the voting form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceResponse {
    pub id: String,
    pub choice_text: String,
}

/// A choice with its tally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceResultResponse {
    pub id: String,
    pub choice_text: String,
    pub votes: u32,
}

/// Index document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexResponse {
    pub latest_question_list: Vec<QuestionResponse>,
}

/// Voting form document, optionally carrying the reason a vote was rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailResponse {
    pub question: QuestionResponse,
    pub choices: Vec<ChoiceResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Results document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsResponse {
    pub question: QuestionResponse,
    pub choices: Vec<ChoiceResultResponse>,
    pub total_votes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_omits_missing_error_message() {
        let detail = DetailResponse {
            question: QuestionResponse {
                id: "q".to_string(),
                question_text: "What's up?".to_string(),
                pub_date: "2024-01-01T00:00:00+00:00".to_string(),
                was_published_recently: false,
            },
            choices: vec![],
            error_message: None,
        };

        let json = serde_json::to_value(&detail).unwrap();
        assert!(json.get("error_message").is_none());
    }

    #[test]
    fn test_create_form_defaults() {
        let form: CreateQuestionForm =
            serde_json::from_str(r#"{"question_text": "Favorite color?"}"#).unwrap();
        assert_eq!(form.choice_texts, "");
        assert!(form.pub_date.is_none());
    }

    #[test]
    fn test_create_form_blank_pub_date_is_unset() {
        let form: CreateQuestionForm =
            serde_json::from_str(r#"{"question_text": "Favorite color?", "pub_date": " "}"#)
                .unwrap();
        assert!(form.pub_date.is_none());
    }

    #[test]
    fn test_create_form_parses_offset_pub_date() {
        let form: CreateQuestionForm = serde_json::from_str(
            r#"{"question_text": "Later?", "pub_date": "2024-01-01T02:00:00+02:00"}"#,
        )
        .unwrap();
        assert_eq!(
            form.pub_date.unwrap().to_rfc3339(),
            "2024-01-01T00:00:00+00:00"
        );
    }

    #[test]
    fn test_create_form_rejects_malformed_pub_date() {
        let result = serde_json::from_str::<CreateQuestionForm>(
            r#"{"question_text": "Later?", "pub_date": "tomorrow"}"#,
        );
        assert!(result.is_err());
    }
}
