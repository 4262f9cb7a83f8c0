use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::FeedbackService;
use crate::models::ApiResponse;
use crate::models::feedbacks::requests::{NewFeedback, SendFeedbackRequest};
use crate::services::{bad_request, current_user, error_response};
use crate::try_response;
use crate::utils::validate::validate_required;

pub async fn send_feedback(
    service: &FeedbackService,
    request: &HttpRequest,
    feedback: SendFeedbackRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));

    try_response!(validate_required(&feedback.subject, "subject", 200).map_err(bad_request));
    try_response!(validate_required(&feedback.message, "message", 5000).map_err(bad_request));

    let new_feedback = NewFeedback {
        teacher_id: user.id,
        subject: feedback.subject.trim().to_string(),
        message: feedback.message.trim().to_string(),
        feedback_type: feedback.feedback_type,
    };

    match storage.create_feedback(new_feedback).await {
        Ok(saved) => {
            info!("Teacher {} sent feedback {}", user.id, saved.id);
            Ok(HttpResponse::Created().json(ApiResponse::success(
                saved,
                "Feedback sent successfully",
            )))
        }
        Err(e) => Ok(error_response(e)),
    }
}
