use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::StudentService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{error_response, not_found};
use crate::try_response;

/// 停用的学生不再出现在班级名单、点名与考试座位中
pub async fn set_active(
    service: &StudentService,
    request: &HttpRequest,
    student_id: i64,
    active: bool,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    match storage.set_student_active(student_id, active).await {
        Ok(true) => {
            info!("Student {} active set to {}", student_id, active);
            let message = if active {
                "Student activated successfully"
            } else {
                "Student deactivated successfully"
            };
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty(message)))
        }
        Ok(false) => Ok(not_found(ErrorCode::StudentNotFound, "Student not found")),
        Err(e) => Ok(error_response(e)),
    }
}
