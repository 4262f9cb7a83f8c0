use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{debug, error};

use crate::models::auth::responses::{RefreshTokenResponse, SessionResponse};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::current_user;
use crate::try_response;
use crate::utils::jwt::JwtUtils;

use super::AuthService;

fn session_expired() -> HttpResponse {
    // 清除无效的 refresh token cookie
    HttpResponse::Unauthorized()
        .cookie(JwtUtils::expired_refresh_cookie())
        .json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Login expired or invalid, please login again",
        ))
}

pub async fn handle_refresh_token(
    service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let config = service.get_config();

    let Some(refresh_token) = JwtUtils::refresh_token_from_cookie(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized access, please login",
        )));
    };

    let claims = match JwtUtils::verify_refresh_token(&refresh_token) {
        Ok(claims) => claims,
        Err(e) => {
            debug!("Refresh token rejected: {}", e);
            return Ok(session_expired());
        }
    };
    let Some(user_id) = claims.user_id() else {
        return Ok(session_expired());
    };

    // 停用的账号不能续期
    let user = match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) if user.is_active => user,
        Ok(_) => return Ok(session_expired()),
        Err(e) => return Ok(crate::services::error_response(e)),
    };

    match JwtUtils::generate_access_token(user.id, &user.role.to_string()) {
        Ok(access_token) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            RefreshTokenResponse {
                access_token,
                expires_in: config.jwt.access_token_expiry * 60,
            },
            "Token refreshed successfully",
        ))),
        Err(e) => {
            error!("Failed to generate access token: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Unable to refresh token",
                )),
            )
        }
    }
}

pub async fn handle_session(request: &HttpRequest) -> ActixResult<HttpResponse> {
    let user = try_response!(current_user(request));
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        SessionResponse {
            logged_in: true,
            user,
        },
        "Session is valid",
    )))
}
