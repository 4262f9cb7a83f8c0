use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Local;

use super::ExamService;
use crate::models::ApiResponse;
use crate::models::exams::{requests::ExamListParams, responses::ExamListResponse};
use crate::services::{current_user, error_response};
use crate::try_response;

pub async fn list_exams(
    service: &ExamService,
    request: &HttpRequest,
    query: ExamListParams,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let today = Local::now().date_naive();

    match storage.list_exams(query.past, today).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            ExamListResponse { items },
            "Exam list retrieved successfully",
        ))),
        Err(e) => Ok(error_response(e)),
    }
}

pub async fn list_teacher_exams(
    service: &ExamService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));

    match storage.list_teacher_exams(user.id).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            ExamListResponse { items },
            "Exam list retrieved successfully",
        ))),
        Err(e) => Ok(error_response(e)),
    }
}
