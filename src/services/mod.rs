pub mod attendances;
pub mod auth;
pub mod classes;
pub mod dashboard;
pub mod exams;
pub mod feedbacks;
pub mod students;
pub mod teacher;
pub mod teachers;

pub use attendances::AttendanceService;
pub use auth::AuthService;
pub use classes::ClassService;
pub use dashboard::DashboardService;
pub use exams::ExamService;
pub use feedbacks::FeedbackService;
pub use students::StudentService;
pub use teacher::TeacherPortalService;
pub use teachers::TeacherService;

use actix_web::{HttpRequest, HttpResponse, web};
use std::sync::Arc;
use tracing::error;

use crate::cache::{ObjectCache, user_cache_key};
use crate::errors::AttendifyError;
use crate::middlewares::RequireJWT;
use crate::models::classes::schedule::ScheduleError;
use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

/// 从 app data 中取出存储实例
pub(crate) fn storage_from_request(request: &HttpRequest) -> Result<Arc<dyn Storage>, HttpResponse> {
    request
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| {
            error!("Storage not registered in app data");
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                "Storage unavailable",
            ))
        })
}

/// 当前登录用户，未经过 RequireJWT 时返回 401
pub(crate) fn current_user(request: &HttpRequest) -> Result<User, HttpResponse> {
    RequireJWT::extract_user_claims(request).ok_or_else(|| {
        HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized: missing user",
        ))
    })
}

/// 把存储层错误转换为 HTTP 响应
pub(crate) fn error_response(err: AttendifyError) -> HttpResponse {
    match &err {
        AttendifyError::Validation(msg) => HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::BadRequest, msg.as_str())),
        AttendifyError::NotFound(msg) => HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::NotFound, msg.as_str())),
        AttendifyError::Conflict(msg) => HttpResponse::Conflict()
            .json(ApiResponse::error_empty(ErrorCode::Conflict, msg.as_str())),
        AttendifyError::Authentication(msg) => HttpResponse::Unauthorized()
            .json(ApiResponse::error_empty(ErrorCode::AuthFailed, msg.as_str())),
        AttendifyError::Authorization(msg) => HttpResponse::Forbidden()
            .json(ApiResponse::error_empty(ErrorCode::Forbidden, msg.as_str())),
        AttendifyError::CapacityExceeded(msg) => HttpResponse::Conflict().json(
            ApiResponse::error_empty(ErrorCode::ExamCapacityExceeded, msg.as_str()),
        ),
        AttendifyError::ScheduleCorrupted(msg) => HttpResponse::UnprocessableEntity().json(
            ApiResponse::error_empty(ErrorCode::ScheduleCorrupted, msg.as_str()),
        ),
        AttendifyError::DatabaseOperation(msg) if msg.contains("UNIQUE") || msg.contains("Duplicate entry") => {
            HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::Conflict,
                "Resource already exists",
            ))
        }
        _ => {
            error!("{}", err.format_simple());
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                "Internal server error",
            ))
        }
    }
}

/// 课表规则错误；冲突时在 data 中列出冲突的班级与时段
pub(crate) fn schedule_error_response(err: ScheduleError) -> HttpResponse {
    let message = err.to_string();
    match err {
        ScheduleError::Conflicts(conflicts) => HttpResponse::Conflict().json(ApiResponse::error(
            ErrorCode::ScheduleConflict,
            conflicts,
            message,
        )),
        ScheduleError::Occupied { .. } => HttpResponse::Conflict()
            .json(ApiResponse::error_empty(ErrorCode::ScheduleConflict, message)),
        ScheduleError::Duplicate { .. } => HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::ScheduleInvalid, message)),
        ScheduleError::Corrupted(_) => HttpResponse::UnprocessableEntity()
            .json(ApiResponse::error_empty(ErrorCode::ScheduleCorrupted, message)),
        ScheduleError::SlotNotFound { .. } => HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::NotFound, message)),
        ScheduleError::UnknownClass(_) => HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::ClassNotFound, message)),
    }
}

/// 管理员可访问所有班级，教师只能访问自己负责的班级
pub(crate) async fn ensure_class_access(
    storage: &Arc<dyn Storage>,
    user: &User,
    class_id: i64,
) -> Result<(), HttpResponse> {
    if user.is_admin() {
        return Ok(());
    }
    match storage.is_teacher_of_class(user.id, class_id).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::ClassPermissionDenied,
            "You are not assigned to this class",
        ))),
        Err(e) => Err(error_response(e)),
    }
}

/// 用户被修改或停用后删除其缓存，下次请求重新从存储层读取
pub(crate) async fn invalidate_user_cache(request: &HttpRequest, user_id: i64) {
    if let Some(cache) = request.app_data::<web::Data<Arc<dyn ObjectCache>>>() {
        cache.remove(&user_cache_key(user_id)).await;
    }
}

pub(crate) fn bad_request(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, message))
}

pub(crate) fn not_found(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(code, message))
}

/// 在服务函数中展开 `Result<T, HttpResponse>`，错误时直接返回响应
#[macro_export]
macro_rules! try_response {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(response) => return Ok(response),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use crate::models::classes::schedule::{HourSlot, SlotConflict, Weekday};

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_response(AttendifyError::validation("x")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_response(AttendifyError::not_found("x")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_response(AttendifyError::capacity_exceeded("x")).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            error_response(AttendifyError::database_operation(
                "UNIQUE constraint failed: users.username"
            ))
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            error_response(AttendifyError::database_operation("disk I/O error")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_schedule_conflict_is_409() {
        let err = ScheduleError::Conflicts(vec![SlotConflict {
            class_id: 2,
            day: Weekday::Monday,
            hour: HourSlot::from_index(0).unwrap(),
        }]);
        assert_eq!(schedule_error_response(err).status(), StatusCode::CONFLICT);
    }
}
