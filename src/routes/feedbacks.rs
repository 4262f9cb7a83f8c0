use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::users::entities::UserRole;
use crate::services::FeedbackService;
use crate::utils::SafeIDI64;

// 管理员与教师路由共用
pub(crate) static FEEDBACK_SERVICE: Lazy<FeedbackService> = Lazy::new(FeedbackService::new_lazy);

pub async fn list_unread(req: HttpRequest) -> ActixResult<HttpResponse> {
    FEEDBACK_SERVICE.list_unread(&req).await
}

pub async fn list_recent(req: HttpRequest) -> ActixResult<HttpResponse> {
    FEEDBACK_SERVICE.list_recent(&req).await
}

pub async fn mark_read(req: HttpRequest, feedback_id: SafeIDI64) -> ActixResult<HttpResponse> {
    FEEDBACK_SERVICE.mark_read(&req, feedback_id.0).await
}

// 配置路由
pub fn configure_feedbacks_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/feedbacks")
            .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_recent))
            .route("/unread", web::get().to(list_unread))
            .route("/{id}/read", web::post().to(mark_read)),
    );
}
