use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;

use super::ClassService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{error_response, not_found};
use crate::try_response;

pub async fn get_class(
    service: &ClassService,
    request: &HttpRequest,
    class_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let options = service.schedule_options();

    match storage
        .get_class_detail(class_id, Utc::now(), options.makeup_ttl)
        .await
    {
        Ok(Some(detail)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            detail,
            "Class information retrieved successfully",
        ))),
        Ok(None) => Ok(not_found(ErrorCode::ClassNotFound, "Class not found")),
        Err(e) => Ok(error_response(e)),
    }
}
