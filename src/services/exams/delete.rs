use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::ExamService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{error_response, not_found};
use crate::try_response;

pub async fn delete_exam(
    service: &ExamService,
    request: &HttpRequest,
    exam_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    match storage.delete_exam(exam_id).await {
        Ok(true) => {
            info!("Exam {} deleted", exam_id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Exam deleted successfully")))
        }
        Ok(false) => Ok(not_found(ErrorCode::ExamNotFound, "Exam not found")),
        Err(e) => Ok(error_response(e)),
    }
}
