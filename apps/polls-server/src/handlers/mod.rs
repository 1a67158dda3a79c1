//! HTTP handlers and route configuration.

mod health;
mod polls;

use actix_web::web;

use crate::middleware::error::AppError;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(form_config())
        .route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/polls")
                .route("", web::get().to(polls::index))
                .route("", web::post().to(polls::create))
                .route("/{question_id}", web::get().to(polls::detail))
                .route("/{question_id}/results", web::get().to(polls::results))
                .route("/{question_id}/vote", web::post().to(polls::vote)),
        );
}

/// Undecodable form bodies answer with a problem document like every other
/// rejected request.
fn form_config() -> web::FormConfig {
    web::FormConfig::default().error_handler(|err, _req| {
        tracing::debug!(error = %err, "Form body rejected");
        AppError::Validation(err.to_string()).into()
    })
}
