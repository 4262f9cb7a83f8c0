use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::ClassService;
use super::schedule::schedule_from_records;
use crate::models::classes::entities::DEFAULT_MAX_ABSENCES;
use crate::models::classes::requests::{CreateClassRequest, NewClass};
use crate::models::classes::schedule::WeeklySchedule;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, error_response};
use crate::try_response;
use crate::utils::validate::{validate_code, validate_required};

/// 班级字段校验，创建与更新共用
pub(crate) fn validate_class_fields(
    class_name: Option<&str>,
    class_code: Option<&str>,
    max_absences: Option<i32>,
) -> Result<(), HttpResponse> {
    if let Some(name) = class_name {
        validate_required(name, "class_name", 100).map_err(bad_request)?;
    }
    if let Some(code) = class_code {
        validate_code(code, "class_code").map_err(bad_request)?;
    }
    if let Some(max) = max_absences
        && max < 0
    {
        return Err(bad_request("max_absences must not be negative"));
    }
    Ok(())
}

pub async fn create_class(
    service: &ClassService,
    request: &HttpRequest,
    class_data: CreateClassRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    try_response!(validate_class_fields(
        Some(&class_data.class_name),
        Some(&class_data.class_code),
        class_data.max_absences,
    ));
    let schedule = match class_data.schedule {
        Some(records) => try_response!(schedule_from_records(records)),
        None => WeeklySchedule::new(),
    };

    let class_code = class_data.class_code.trim().to_string();
    match storage.get_class_by_code(&class_code).await {
        Ok(Some(_)) => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::ClassAlreadyExists,
                "Class code already exists",
            )));
        }
        Ok(None) => {}
        Err(e) => return Ok(error_response(e)),
    }

    let new_class = NewClass {
        class_name: class_data.class_name.trim().to_string(),
        class_code,
        description: class_data.description,
        max_absences: class_data.max_absences.unwrap_or(DEFAULT_MAX_ABSENCES),
        schedule,
    };

    match storage.create_class(new_class).await {
        Ok(class) => {
            info!("Class {} ({}) created", class.class_name, class.class_code);
            Ok(HttpResponse::Created().json(ApiResponse::success(class, "Class created successfully")))
        }
        Err(e) => Ok(error_response(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_class_fields() {
        assert!(validate_class_fields(Some("9-A"), Some("9A"), Some(3)).is_ok());
        assert!(validate_class_fields(None, None, None).is_ok());
        assert!(validate_class_fields(Some("  "), None, None).is_err());
        assert!(validate_class_fields(None, Some("has space"), None).is_err());
        assert!(validate_class_fields(None, None, Some(-1)).is_err());
    }
}
