use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{Local, TimeDelta, Utc};
use tracing::{info, warn};

use crate::models::users::entities::User;
use crate::models::{
    ApiResponse, ErrorCode,
    auth::{LoginRequest, LoginResponse},
};
use crate::services::error_response;
use crate::storage::Storage;
use crate::try_response;
use crate::utils::jwt::JwtUtils;
use crate::utils::password::verify_password;

use super::AuthService;

fn login_failed() -> HttpResponse {
    HttpResponse::Unauthorized().json(ApiResponse::error_empty(
        ErrorCode::AuthFailed,
        "Username or password is incorrect",
    ))
}

/// 输入中含 `@` 时按邮箱查找，否则按用户名
async fn find_login_user(
    storage: &dyn Storage,
    identifier: &str,
) -> crate::errors::Result<Option<User>> {
    if identifier.contains('@') {
        storage.get_user_by_email(identifier).await
    } else {
        storage.get_user_by_username(identifier).await
    }
}

pub async fn handle_login(
    service: &AuthService,
    login_request: LoginRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let config = service.get_config();

    // 1. 根据用户名或邮箱获取用户信息
    let identifier = login_request.username.trim();
    if identifier.is_empty() || login_request.password.is_empty() {
        return Ok(login_failed());
    }
    let user = match find_login_user(storage.as_ref(), identifier).await {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(login_failed()),
        Err(e) => return Ok(error_response(e)),
    };

    // 2. 验证密码
    if !verify_password(&login_request.password, &user.password_hash) {
        info!("Failed login attempt for {}", identifier);
        return Ok(login_failed());
    }
    if !user.is_active {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::UserInactive,
            "User account is inactive",
        )));
    }

    // 3. 更新最后登录时间与每日登录统计
    if let Err(e) = storage.update_last_login(user.id).await {
        warn!("Failed to update last login for user {}: {}", user.id, e);
    }
    if let Err(e) = storage.record_login(Local::now().date_naive()).await {
        warn!("Failed to record daily login: {}", e);
    }

    // 4. 生成令牌对
    let refresh_ttl = TimeDelta::days(if login_request.remember_me {
        config.jwt.refresh_token_remember_me_expiry
    } else {
        config.jwt.refresh_token_expiry
    });
    let token_pair = match user.generate_token_pair(Some(refresh_ttl)) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!("Failed to generate JWT token: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Login failed, unable to generate token",
                )),
            );
        }
    };

    info!("User {} ({}) logged in", user.username, user.role);
    let refresh_cookie = JwtUtils::refresh_cookie(&token_pair.refresh_token, refresh_ttl);
    let response = LoginResponse {
        access_token: token_pair.access_token,
        expires_in: config.jwt.access_token_expiry * 60, // 转换为秒
        user,
        created_at: Utc::now(),
    };

    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie)
        .json(ApiResponse::success(response, "Login successful")))
}
