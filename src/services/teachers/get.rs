use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::TeacherService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{error_response, not_found};
use crate::try_response;

pub async fn get_teacher(
    service: &TeacherService,
    request: &HttpRequest,
    teacher_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    match storage.get_teacher_with_classes(teacher_id).await {
        Ok(Some(teacher)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            teacher,
            "Teacher retrieved successfully",
        ))),
        Ok(None) => Ok(not_found(ErrorCode::UserNotFound, "Teacher not found")),
        Err(e) => Ok(error_response(e)),
    }
}
