use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{TimeDelta, Utc};

use super::FeedbackService;
use crate::models::ApiResponse;
use crate::services::{current_user, error_response};
use crate::try_response;

/// 反馈历史查询窗口（天）
const HISTORY_DAYS: i64 = 30;

pub async fn list_my_feedbacks(
    service: &FeedbackService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));
    let since = Utc::now() - TimeDelta::days(HISTORY_DAYS);

    match storage.list_teacher_feedbacks(user.id, since).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            items,
            "Feedback history retrieved successfully",
        ))),
        Err(e) => Ok(error_response(e)),
    }
}

pub async fn list_unread(
    service: &FeedbackService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    match storage.list_unread_feedbacks(None).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            items,
            "Unread feedback retrieved successfully",
        ))),
        Err(e) => Ok(error_response(e)),
    }
}

pub async fn list_recent(
    service: &FeedbackService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let since = Utc::now() - TimeDelta::days(HISTORY_DAYS);

    match storage.list_recent_feedbacks(since).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            items,
            "Recent feedback retrieved successfully",
        ))),
        Err(e) => Ok(error_response(e)),
    }
}
