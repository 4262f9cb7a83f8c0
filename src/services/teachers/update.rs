use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::TeacherService;
use super::fields::{normalize_class_ids, normalize_optional, validate_contact, validate_full_name};
use crate::models::users::requests::{UpdateTeacherRequest, UpdateUserRequest};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, error_response, invalidate_user_cache, not_found};
use crate::try_response;
use crate::utils::password::hash_password;
use crate::utils::validate::validate_password;

pub async fn update_teacher(
    service: &TeacherService,
    request: &HttpRequest,
    teacher_id: i64,
    update: UpdateTeacherRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    match storage.get_user_by_id(teacher_id).await {
        Ok(Some(user)) if !user.is_admin() => {}
        Ok(_) => return Ok(not_found(ErrorCode::UserNotFound, "Teacher not found")),
        Err(e) => return Ok(error_response(e)),
    }

    if let Some(full_name) = &update.full_name {
        try_response!(validate_full_name(full_name).map_err(bad_request));
    }
    let email = update.email.map(|e| e.trim().to_lowercase());
    let phone = normalize_optional(update.phone);
    let birth_date = normalize_optional(update.birth_date);
    try_response!(
        validate_contact(email.as_deref(), phone.as_deref(), birth_date.as_deref())
            .map_err(bad_request)
    );
    let class_ids = match update.class_ids {
        Some(ids) => Some(try_response!(normalize_class_ids(ids).map_err(bad_request))),
        None => None,
    };

    if let Some(email) = &email {
        match storage.get_user_by_email(email).await {
            Ok(Some(existing)) if existing.id != teacher_id => {
                return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                    ErrorCode::UserAlreadyExists,
                    "Email already exists",
                )));
            }
            Ok(_) => {}
            Err(e) => return Ok(error_response(e)),
        }
    }

    let password = match update.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => {
            if let Err(msg) = validate_password(password) {
                return Ok(HttpResponse::BadRequest()
                    .json(ApiResponse::error_empty(ErrorCode::UserPasswordInvalid, msg)));
            }
            match hash_password(password) {
                Ok(hash) => Some(hash),
                Err(e) => return Ok(error_response(e)),
            }
        }
        None => None,
    };

    let storage_update = UpdateUserRequest {
        full_name: update.full_name.map(|n| n.trim().to_string()),
        email,
        phone,
        birth_date,
        password,
        is_active: None,
        class_ids,
    };

    match storage.update_user(teacher_id, storage_update).await {
        Ok(Some(_)) => {
            invalidate_user_cache(request, teacher_id).await;
            info!("Teacher {} updated", teacher_id);
            match storage.get_teacher_with_classes(teacher_id).await {
                Ok(Some(teacher)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                    teacher,
                    "Teacher updated successfully",
                ))),
                Ok(None) => Ok(not_found(ErrorCode::UserNotFound, "Teacher not found")),
                Err(e) => Ok(error_response(e)),
            }
        }
        Ok(None) => Ok(not_found(ErrorCode::UserNotFound, "Teacher not found")),
        Err(e) => Ok(error_response(e)),
    }
}
