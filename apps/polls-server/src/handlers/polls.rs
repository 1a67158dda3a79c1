//! Poll handlers.

use actix_web::{HttpResponse, http::header, web};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use polls_core::DomainError;
use polls_core::domain::{Poll, Question};
use polls_core::service::{NO_CHOICE_SELECTED, NewPoll};
use polls_shared::ApiResponse;
use polls_shared::dto::{
    ChoiceResponse, ChoiceResultResponse, CreateQuestionForm, DetailResponse, IndexResponse,
    QuestionResponse, ResultsResponse, VoteForm,
};

use crate::middleware::error::AppResult;
use crate::observability::RequestId;
use crate::state::AppState;

const INDEX_PATH: &str = "/polls";

fn results_path(question_id: Uuid) -> String {
    format!("{INDEX_PATH}/{question_id}/results")
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

fn question_response(question: &Question, now: DateTime<Utc>) -> QuestionResponse {
    QuestionResponse {
        id: question.id.to_string(),
        question_text: question.question_text.clone(),
        pub_date: question.pub_date.to_rfc3339(),
        was_published_recently: question.was_published_recently(now),
    }
}

fn detail_response(poll: &Poll, now: DateTime<Utc>, error: Option<&str>) -> DetailResponse {
    DetailResponse {
        question: question_response(&poll.question, now),
        choices: poll
            .choices
            .iter()
            .map(|c| ChoiceResponse {
                id: c.id.to_string(),
                choice_text: c.choice_text.clone(),
            })
            .collect(),
        error_message: error.map(str::to_string),
    }
}

/// GET /polls
pub async fn index(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let now = state.polls.now();
    let latest = state.polls.latest_questions().await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(IndexResponse {
        latest_question_list: latest.iter().map(|q| question_response(q, now)).collect(),
    })))
}

/// GET /polls/{question_id}
pub async fn detail(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let poll = state.polls.detail(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(detail_response(
        &poll,
        state.polls.now(),
        None,
    ))))
}

/// GET /polls/{question_id}/results
pub async fn results(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let poll = state.polls.results(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(ResultsResponse {
        question: question_response(&poll.question, state.polls.now()),
        choices: poll
            .choices
            .iter()
            .map(|c| ChoiceResultResponse {
                id: c.id.to_string(),
                choice_text: c.choice_text.clone(),
                votes: c.votes,
            })
            .collect(),
        total_votes: poll.total_votes(),
    })))
}

/// POST /polls/{question_id}/vote
///
/// Redirects to the results on success so a reload cannot submit the vote
/// twice. A missing or unknown choice redisplays the voting form, and so
/// does a submission without a form body.
pub async fn vote(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    form: Option<web::Form<VoteForm>>,
    request_id: RequestId,
) -> AppResult<HttpResponse> {
    let question_id = path.into_inner();
    let selection = form.as_ref().and_then(|f| f.choice.as_deref());

    match state.polls.vote(question_id, selection).await {
        Ok(choice_id) => {
            tracing::info!(%request_id, %question_id, %choice_id, "Vote recorded");
            Ok(see_other(&results_path(question_id)))
        }
        Err(DomainError::Validation(_))
        | Err(DomainError::NotFound {
            entity_type: "Choice",
            ..
        }) => {
            tracing::debug!(%request_id, %question_id, "Vote rejected");
            let poll = state.polls.results(question_id).await?;
            let body = detail_response(&poll, state.polls.now(), Some(NO_CHOICE_SELECTED));

            Ok(HttpResponse::UnprocessableEntity()
                .json(ApiResponse::rejected(body, NO_CHOICE_SELECTED)))
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /polls
pub async fn create(
    state: web::Data<AppState>,
    form: web::Form<CreateQuestionForm>,
    request_id: RequestId,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();

    let saved = state
        .polls
        .create(NewPoll {
            question_text: form.question_text,
            choice_texts: form.choice_texts,
            pub_date: form.pub_date,
        })
        .await?;

    tracing::info!(
        %request_id,
        question_id = %saved.question.id,
        created = saved.created,
        choices = saved.choices.len(),
        "Poll saved"
    );

    Ok(see_other(INDEX_PATH))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use chrono::{Duration, SubsecRound};
    use polls_core::ports::FixedClock;
    use polls_core::service::CreatedPoll;

    use super::*;
    use crate::handlers::configure_routes;

    fn test_state() -> AppState {
        let clock = Arc::new(FixedClock::new(Utc::now().trunc_subsecs(6)));
        AppState::in_memory(clock)
    }

    async fn seed(state: &AppState, text: &str, choices: &str, days_offset: i64) -> CreatedPoll {
        state
            .polls
            .create(NewPoll {
                question_text: text.to_string(),
                choice_texts: choices.to_string(),
                pub_date: Some(state.polls.now() + Duration::days(days_offset)),
            })
            .await
            .unwrap()
    }

    #[actix_web::test]
    async fn test_index_lists_published_questions_only() {
        let state = test_state();
        seed(&state, "Past question.", "", -1).await;
        seed(&state, "Future question.", "", 1).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/polls").to_request();
        let body: ApiResponse<IndexResponse> = test::call_and_read_body_json(&app, req).await;

        let latest = body.data.unwrap().latest_question_list;
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].question_text, "Past question.");
        assert!(latest[0].was_published_recently);
    }

    #[actix_web::test]
    async fn test_detail_of_future_question_is_not_found() {
        let state = test_state();
        let future = seed(&state, "Future question.", "Yes", 5).await;
        let past = seed(&state, "Past question.", "Yes\nNo", -5).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/polls/{}", future.question.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri(&format!("/polls/{}", past.question.id))
            .to_request();
        let body: ApiResponse<DetailResponse> = test::call_and_read_body_json(&app, req).await;
        let detail = body.data.unwrap();
        assert_eq!(detail.choices.len(), 2);
        assert!(detail.error_message.is_none());
    }

    #[actix_web::test]
    async fn test_vote_redirects_to_results() {
        let state = test_state();
        let poll = seed(&state, "Favorite color?", "Red\nBlue", -1).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure_routes),
        )
        .await;

        let choice_id = poll.choices[0].id.to_string();
        let req = test::TestRequest::post()
            .uri(&format!("/polls/{}/vote", poll.question.id))
            .set_form([("choice", choice_id.as_str())])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let location = resp.headers().get(header::LOCATION).unwrap().to_str().unwrap();
        assert_eq!(location, format!("/polls/{}/results", poll.question.id));

        let req = test::TestRequest::get().uri(location).to_request();
        let body: ApiResponse<ResultsResponse> = test::call_and_read_body_json(&app, req).await;
        let results = body.data.unwrap();
        let votes: Vec<u32> = results.choices.iter().map(|c| c.votes).collect();
        assert_eq!(votes, vec![1, 0]);
        assert_eq!(results.total_votes, 1);
    }

    #[actix_web::test]
    async fn test_vote_without_choice_redisplays_form() {
        let state = test_state();
        let poll = seed(&state, "Favorite color?", "Red\nBlue", -1).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri(&format!("/polls/{}/vote", poll.question.id))
            .set_form(VoteForm::default())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: ApiResponse<DetailResponse> = test::read_body_json(resp).await;
        assert!(!body.success);
        let detail = body.data.unwrap();
        assert_eq!(detail.error_message.as_deref(), Some(NO_CHOICE_SELECTED));
        assert_eq!(detail.question.id, poll.question.id.to_string());

        let unchanged = state.polls.results(poll.question.id).await.unwrap();
        assert_eq!(unchanged.total_votes(), 0);
    }

    #[actix_web::test]
    async fn test_vote_for_unknown_choice_redisplays_form() {
        let state = test_state();
        let poll = seed(&state, "Favorite color?", "Red", -1).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure_routes),
        )
        .await;

        let unknown = Uuid::new_v4().to_string();
        let req = test::TestRequest::post()
            .uri(&format!("/polls/{}/vote", poll.question.id))
            .set_form([("choice", unknown.as_str())])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn test_vote_on_missing_question_is_not_found() {
        let state = test_state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri(&format!("/polls/{}/vote", Uuid::new_v4()))
            .set_form([("choice", Uuid::new_v4().to_string())])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_create_poll_from_form() {
        let state = test_state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/polls")
            .set_form([
                ("question_text", "Favorite color?"),
                ("choice_texts", "Red\nBlue\n\nGreen"),
            ])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/polls");

        let latest = state.polls.latest_questions().await.unwrap();
        assert_eq!(latest.len(), 1);
        let poll = state.polls.results(latest[0].id).await.unwrap();
        let texts: Vec<&str> = poll.choices.iter().map(|c| c.choice_text.as_str()).collect();
        assert_eq!(texts, vec!["Red", "Blue", "Green"]);
    }

    #[actix_web::test]
    async fn test_create_scheduled_poll() {
        let state = test_state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure_routes),
        )
        .await;

        let pub_date = (state.polls.now() + Duration::days(2)).to_rfc3339();
        let req = test::TestRequest::post()
            .uri("/polls")
            .set_form([
                ("question_text", "Later?"),
                ("choice_texts", "Yes"),
                ("pub_date", pub_date.as_str()),
            ])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        assert!(state.polls.latest_questions().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_create_with_blank_question_is_rejected() {
        let state = test_state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/polls")
            .set_form([("question_text", " "), ("choice_texts", "Red")])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn test_vote_without_form_body_redisplays_form() {
        let state = test_state();
        let poll = seed(&state, "Favorite color?", "Red\nBlue", -1).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri(&format!("/polls/{}/vote", poll.question.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: ApiResponse<DetailResponse> = test::read_body_json(resp).await;
        let detail = body.data.unwrap();
        assert_eq!(detail.error_message.as_deref(), Some(NO_CHOICE_SELECTED));
        assert_eq!(detail.choices.len(), 2);
    }

    #[actix_web::test]
    async fn test_create_with_blank_pub_date_publishes_now() {
        let state = test_state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/polls")
            .set_form([
                ("question_text", "Favorite color?"),
                ("choice_texts", "Red"),
                ("pub_date", ""),
            ])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        let latest = state.polls.latest_questions().await.unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].pub_date, state.polls.now());
    }

    #[actix_web::test]
    async fn test_undecodable_create_form_is_a_problem_document() {
        let state = test_state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/polls")
            .set_form([("choice_texts", "Red"), ("pub_date", "next week")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], 422);
        assert_eq!(body["title"], "Validation Failed");
        assert!(state.polls.latest_questions().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_delete_route_is_not_exposed() {
        let state = test_state();
        let poll = seed(&state, "Kept?", "Yes", -1).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure_routes),
        )
        .await;

        let uri = format!("/polls/{}", poll.question.id);
        let resp =
            test::call_service(&app, test::TestRequest::delete().uri(&uri).to_request()).await;
        assert!(resp.status().is_client_error());

        assert!(state.polls.detail(poll.question.id).await.is_ok());
    }

    #[actix_web::test]
    async fn test_health_reports_storage() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "ok");
        assert_eq!(body["storage"], "memory");
    }
}
