use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::FeedbackService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{error_response, not_found};
use crate::try_response;

pub async fn mark_read(
    service: &FeedbackService,
    request: &HttpRequest,
    feedback_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    match storage.mark_feedback_read(feedback_id).await {
        Ok(true) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Feedback marked as read"))),
        Ok(false) => Ok(not_found(ErrorCode::FeedbackNotFound, "Feedback not found")),
        Err(e) => Ok(error_response(e)),
    }
}
