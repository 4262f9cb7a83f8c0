use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::TeacherService;
use super::fields::{normalize_class_ids, normalize_optional, validate_contact, validate_full_name};
use crate::models::users::entities::UserRole;
use crate::models::users::requests::{CreateTeacherRequest, CreateUserRequest};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, error_response};
use crate::try_response;
use crate::utils::password::hash_password;
use crate::utils::validate::{validate_email, validate_password, validate_username};

fn invalid(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(code, message))
}

fn already_exists(message: &str) -> HttpResponse {
    HttpResponse::Conflict().json(ApiResponse::error_empty(ErrorCode::UserAlreadyExists, message))
}

pub async fn create_teacher(
    service: &TeacherService,
    request: &HttpRequest,
    teacher: CreateTeacherRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    let username = teacher.username.trim().to_string();
    let email = teacher.email.trim().to_lowercase();
    if let Err(msg) = validate_username(&username) {
        return Ok(invalid(ErrorCode::UserNameInvalid, msg));
    }
    if let Err(msg) = validate_email(&email) {
        return Ok(invalid(ErrorCode::UserEmailInvalid, msg));
    }
    if let Err(msg) = validate_password(&teacher.password) {
        return Ok(invalid(ErrorCode::UserPasswordInvalid, msg));
    }
    try_response!(validate_full_name(&teacher.full_name).map_err(bad_request));
    let phone = normalize_optional(teacher.phone);
    let birth_date = normalize_optional(teacher.birth_date);
    try_response!(validate_contact(None, phone.as_deref(), birth_date.as_deref()).map_err(bad_request));
    let class_ids = try_response!(normalize_class_ids(teacher.class_ids).map_err(bad_request));

    match storage.get_user_by_username(&username).await {
        Ok(Some(_)) => return Ok(already_exists("Username already exists")),
        Ok(None) => {}
        Err(e) => return Ok(error_response(e)),
    }
    match storage.get_user_by_email(&email).await {
        Ok(Some(_)) => return Ok(already_exists("Email already exists")),
        Ok(None) => {}
        Err(e) => return Ok(error_response(e)),
    }

    let password = match hash_password(&teacher.password) {
        Ok(hash) => hash,
        Err(e) => return Ok(error_response(e)),
    };

    let new_user = CreateUserRequest {
        username,
        password,
        full_name: teacher.full_name.trim().to_string(),
        email,
        phone,
        birth_date,
        role: UserRole::Teacher,
        class_ids,
    };

    match storage.create_user(new_user).await {
        Ok(user) => {
            info!("Teacher {} created", user.username);
            match storage.get_teacher_with_classes(user.id).await {
                Ok(Some(teacher)) => Ok(HttpResponse::Created().json(ApiResponse::success(
                    teacher,
                    "Teacher created successfully",
                ))),
                Ok(None) => Ok(HttpResponse::Created().json(ApiResponse::success(
                    user,
                    "Teacher created successfully",
                ))),
                Err(e) => Ok(error_response(e)),
            }
        }
        Err(e) => Ok(error_response(e)),
    }
}
