use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{Local, Utc};

use super::TeacherPortalService;
use crate::models::classes::responses::{TeacherClassDetailResponse, TeacherClassListResponse};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::attendances::list::since_days;
use crate::services::{current_user, error_response, not_found};
use crate::try_response;

pub async fn list_my_classes(
    service: &TeacherPortalService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));

    match storage
        .list_teacher_classes(user.id, Utc::now(), service.makeup_ttl())
        .await
    {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            TeacherClassListResponse { items },
            "Classes retrieved successfully",
        ))),
        Err(e) => Ok(error_response(e)),
    }
}

/// 班级详情与该教师最近 30 天的点名记录，授课关系由 RequireClassTeacher 检查
pub async fn get_my_class(
    service: &TeacherPortalService,
    request: &HttpRequest,
    class_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));

    let class = match storage
        .get_class_detail(class_id, Utc::now(), service.makeup_ttl())
        .await
    {
        Ok(Some(class)) => class,
        Ok(None) => return Ok(not_found(ErrorCode::ClassNotFound, "Class not found")),
        Err(e) => return Ok(error_response(e)),
    };

    let since = since_days(Local::now().date_naive(), None);
    match storage
        .list_attendances(Some(user.id), Some(class_id), since)
        .await
    {
        Ok(recent_attendances) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            TeacherClassDetailResponse {
                class,
                recent_attendances,
            },
            "Class retrieved successfully",
        ))),
        Err(e) => Ok(error_response(e)),
    }
}
