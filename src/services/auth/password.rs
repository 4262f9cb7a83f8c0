use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use crate::models::auth::requests::ChangePasswordRequest;
use crate::models::users::requests::UpdateUserRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, error_response, invalidate_user_cache, not_found};
use crate::try_response;
use crate::utils::password::{hash_password, verify_password};
use crate::utils::validate::validate_password;

use super::AuthService;

pub async fn handle_change_password(
    service: &AuthService,
    change_request: ChangePasswordRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let session_user = try_response!(current_user(request));

    // 缓存中的用户不带密码哈希，需要重新读取
    let user = match storage.get_user_by_id(session_user.id).await {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(not_found(ErrorCode::UserNotFound, "User not found")),
        Err(e) => return Ok(error_response(e)),
    };

    if !verify_password(&change_request.current_password, &user.password_hash) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::UserPasswordInvalid,
            "Current password is incorrect",
        )));
    }
    if change_request.current_password == change_request.new_password {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::UserPasswordInvalid,
            "New password must differ from the current password",
        )));
    }
    if let Err(msg) = validate_password(&change_request.new_password) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::UserPasswordInvalid, msg)));
    }

    let password_hash = match hash_password(&change_request.new_password) {
        Ok(hash) => hash,
        Err(e) => return Ok(error_response(e)),
    };

    let update = UpdateUserRequest {
        password: Some(password_hash),
        ..Default::default()
    };
    match storage.update_user(user.id, update).await {
        Ok(Some(_)) => {
            invalidate_user_cache(request, user.id).await;
            info!("User {} changed password", user.username);
            Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty(
                "Password changed successfully",
            )))
        }
        Ok(None) => Ok(not_found(ErrorCode::UserNotFound, "User not found")),
        Err(e) => Ok(error_response(e)),
    }
}
