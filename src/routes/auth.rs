use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::auth::requests::{ChangePasswordRequest, LoginRequest};
use crate::services::AuthService;

// 懒加载的全局 AuthService 实例
static AUTH_SERVICE: Lazy<AuthService> = Lazy::new(AuthService::new_lazy);

pub async fn login(
    req: HttpRequest,
    user_data: web::Json<LoginRequest>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.login(user_data.into_inner(), &req).await
}

pub async fn refresh_token(request: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.refresh_token(&request).await
}

pub async fn logout(request: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.logout(&request).await
}

pub async fn me(request: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.session(&request).await
}

pub async fn change_password(
    req: HttpRequest,
    change_data: web::Json<ChangePasswordRequest>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE
        .change_password(change_data.into_inner(), &req)
        .await
}

// 配置路由
pub fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/auth")
            .service(
                web::resource("/login")
                    .wrap(middlewares::RateLimit::login())
                    .route(web::post().to(login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(middlewares::RateLimit::refresh_token())
                    .route(web::post().to(refresh_token)),
            )
            .service(
                web::scope("")
                    .wrap(middlewares::RequireJWT)
                    .route("/logout", web::post().to(logout))
                    .route("/me", web::get().to(me))
                    .route("/change-password", web::post().to(change_password)),
            ),
    );
}
