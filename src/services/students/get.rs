use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::StudentService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{error_response, not_found};
use crate::try_response;

pub async fn get_student(
    service: &StudentService,
    request: &HttpRequest,
    student_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    match storage.get_student_by_id(student_id).await {
        Ok(Some(student)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            student,
            "Student retrieved successfully",
        ))),
        Ok(None) => Ok(not_found(ErrorCode::StudentNotFound, "Student not found")),
        Err(e) => Ok(error_response(e)),
    }
}
