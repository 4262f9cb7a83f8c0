use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::middlewares::RequireJWT;
use crate::models::ApiResponse;
use crate::services::invalidate_user_cache;
use crate::utils::jwt::JwtUtils;

/// 处理用户登出
/// 覆盖 refresh_token cookie（max_age=0），并删除该用户的缓存
pub async fn handle_logout(request: &HttpRequest) -> ActixResult<HttpResponse> {
    if let Some(user_id) = RequireJWT::extract_user_id(request) {
        invalidate_user_cache(request, user_id).await;
    }

    Ok(HttpResponse::Ok()
        .cookie(JwtUtils::expired_refresh_cookie())
        .json(ApiResponse::<()>::success_empty("Logged out successfully")))
}
