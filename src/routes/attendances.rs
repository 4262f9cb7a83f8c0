use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::attendances::requests::AttendanceStatsParams;
use crate::models::users::entities::UserRole;
use crate::services::AttendanceService;
use crate::utils::SafeIDI64;

// 管理员与教师路由共用
pub(crate) static ATTENDANCE_SERVICE: Lazy<AttendanceService> =
    Lazy::new(AttendanceService::new_lazy);

pub async fn list_attendances(req: HttpRequest) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE.list_attendances(&req).await
}

pub async fn get_attendance(
    req: HttpRequest,
    attendance_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE.get_attendance(&req, attendance_id.0).await
}

pub async fn get_stats(
    req: HttpRequest,
    query: web::Query<AttendanceStatsParams>,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE.get_stats(&req, query.into_inner()).await
}

// 配置路由
pub fn configure_attendances_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/attendances")
            .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_attendances))
            .route("/stats", web::get().to(get_stats))
            .route("/{id}", web::get().to(get_attendance)),
    );
}
