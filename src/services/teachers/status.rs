use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::TeacherService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{error_response, invalidate_user_cache, not_found};
use crate::try_response;

/// 停用后该教师的现有 access token 在下一次请求时失效
pub async fn set_active(
    service: &TeacherService,
    request: &HttpRequest,
    teacher_id: i64,
    active: bool,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    match storage.get_user_by_id(teacher_id).await {
        Ok(Some(user)) if !user.is_admin() => {}
        Ok(_) => return Ok(not_found(ErrorCode::UserNotFound, "Teacher not found")),
        Err(e) => return Ok(error_response(e)),
    }

    match storage.set_user_active(teacher_id, active).await {
        Ok(true) => {
            invalidate_user_cache(request, teacher_id).await;
            info!("Teacher {} active set to {}", teacher_id, active);
            let message = if active {
                "Teacher activated successfully"
            } else {
                "Teacher deactivated successfully"
            };
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty(message)))
        }
        Ok(false) => Ok(not_found(ErrorCode::UserNotFound, "Teacher not found")),
        Err(e) => Ok(error_response(e)),
    }
}
