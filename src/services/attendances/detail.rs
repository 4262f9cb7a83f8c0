use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AttendanceService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, error_response, not_found};
use crate::try_response;

/// 点名详情，只有点名教师本人或管理员可以查看
pub async fn get_attendance(
    service: &AttendanceService,
    request: &HttpRequest,
    attendance_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));

    match storage.get_attendance_detail(attendance_id).await {
        Ok(Some(detail)) if user.is_admin() || detail.attendance.attendance.teacher_id == user.id => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                detail,
                "Attendance retrieved successfully",
            )))
        }
        Ok(_) => Ok(not_found(
            ErrorCode::AttendanceNotFound,
            "Attendance not found",
        )),
        Err(e) => Ok(error_response(e)),
    }
}
