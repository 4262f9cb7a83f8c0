use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ExamService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, error_response, not_found};
use crate::try_response;

pub async fn get_exam(
    service: &ExamService,
    request: &HttpRequest,
    exam_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    match storage.get_exam_detail(exam_id).await {
        Ok(Some(detail)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            detail,
            "Exam retrieved successfully",
        ))),
        Ok(None) => Ok(not_found(ErrorCode::ExamNotFound, "Exam not found")),
        Err(e) => Ok(error_response(e)),
    }
}

pub async fn get_teacher_exam(
    service: &ExamService,
    request: &HttpRequest,
    exam_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));

    let detail = match storage.get_exam_detail(exam_id).await {
        Ok(Some(detail)) => detail,
        Ok(None) => return Ok(not_found(ErrorCode::ExamNotFound, "Exam not found")),
        Err(e) => return Ok(error_response(e)),
    };

    if !user.is_admin() {
        match storage
            .is_teacher_of_class(user.id, detail.exam.exam.class_id)
            .await
        {
            Ok(true) => {}
            // 不暴露其他班级的考试是否存在
            Ok(false) => return Ok(not_found(ErrorCode::ExamNotFound, "Exam not found")),
            Err(e) => return Ok(error_response(e)),
        }
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        detail,
        "Exam retrieved successfully",
    )))
}
