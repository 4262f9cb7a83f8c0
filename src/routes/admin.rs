use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, middleware, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::dashboard::requests::ExportParams;
use crate::models::users::entities::UserRole;
use crate::services::DashboardService;

// 懒加载的全局 DashboardService 实例
static DASHBOARD_SERVICE: Lazy<DashboardService> = Lazy::new(DashboardService::new_lazy);

pub async fn get_dashboard(request: HttpRequest) -> ActixResult<HttpResponse> {
    DASHBOARD_SERVICE.get_dashboard(&request).await
}

pub async fn export(
    request: HttpRequest,
    params: web::Query<ExportParams>,
) -> ActixResult<HttpResponse> {
    DASHBOARD_SERVICE.export(&request, params.into_inner()).await
}

// 配置路由
pub fn configure_admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/admin")
            .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
            .wrap(middlewares::RequireJWT)
            .route("/dashboard", web::get().to(get_dashboard)),
    )
    .service(
        web::scope("/api/v1/export")
            .wrap(middleware::Compress::default())
            .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(export)),
    );
}
