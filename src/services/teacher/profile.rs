use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::TeacherPortalService;
use crate::models::users::requests::{UpdateProfileRequest, UpdateUserRequest};
use crate::models::users::responses::TeacherProfileResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::teachers::fields::{normalize_optional, validate_contact, validate_full_name};
use crate::services::{bad_request, current_user, error_response, invalidate_user_cache, not_found};
use crate::try_response;

pub async fn get_profile(
    service: &TeacherPortalService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));

    match storage.count_teacher_classes_and_students(user.id).await {
        Ok((class_count, student_count)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            TeacherProfileResponse {
                user,
                class_count,
                student_count,
            },
            "Profile retrieved successfully",
        ))),
        Err(e) => Ok(error_response(e)),
    }
}

pub async fn update_profile(
    service: &TeacherPortalService,
    request: &HttpRequest,
    update: UpdateProfileRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));

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

    if let Some(email) = &email {
        match storage.get_user_by_email(email).await {
            Ok(Some(existing)) if existing.id != user.id => {
                return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                    ErrorCode::UserAlreadyExists,
                    "Email already exists",
                )));
            }
            Ok(_) => {}
            Err(e) => return Ok(error_response(e)),
        }
    }

    let storage_update = UpdateUserRequest {
        full_name: update.full_name.map(|n| n.trim().to_string()),
        email,
        phone,
        birth_date,
        ..Default::default()
    };

    match storage.update_user(user.id, storage_update).await {
        Ok(Some(updated)) => {
            invalidate_user_cache(request, user.id).await;
            info!("User {} updated profile", updated.username);
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                updated,
                "Profile updated successfully",
            )))
        }
        Ok(None) => Ok(not_found(ErrorCode::UserNotFound, "User not found")),
        Err(e) => Ok(error_response(e)),
    }
}
