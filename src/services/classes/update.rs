use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::ClassService;
use super::create::validate_class_fields;
use super::schedule::schedule_from_records;
use crate::models::classes::requests::{ClassUpdate, UpdateClassRequest};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{error_response, not_found};
use crate::try_response;

pub async fn update_class(
    service: &ClassService,
    request: &HttpRequest,
    class_id: i64,
    update_data: UpdateClassRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    try_response!(validate_class_fields(
        update_data.class_name.as_deref(),
        update_data.class_code.as_deref(),
        update_data.max_absences,
    ));
    let schedule = match update_data.schedule {
        Some(records) => Some(try_response!(schedule_from_records(records))),
        None => None,
    };

    let class_code = update_data.class_code.map(|code| code.trim().to_string());
    if let Some(code) = &class_code {
        match storage.get_class_by_code(code).await {
            Ok(Some(existing)) if existing.id != class_id => {
                return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                    ErrorCode::ClassAlreadyExists,
                    "Class code already exists",
                )));
            }
            Ok(_) => {}
            Err(e) => return Ok(error_response(e)),
        }
    }

    // 整体替换课表时与时段修改互斥
    let _guard = match schedule {
        Some(_) => Some(service.locks().acquire(&[class_id]).await),
        None => None,
    };

    let update = ClassUpdate {
        class_name: update_data.class_name.map(|name| name.trim().to_string()),
        class_code,
        description: update_data.description,
        max_absences: update_data.max_absences,
        schedule,
    };

    match storage.update_class(class_id, update).await {
        Ok(Some(class)) => {
            info!("Class {} updated", class_id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(class, "Class updated successfully")))
        }
        Ok(None) => Ok(not_found(ErrorCode::ClassNotFound, "Class not found")),
        Err(e) => Ok(error_response(e)),
    }
}
