use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::ClassService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{error_response, not_found};
use crate::try_response;

/// 班级只做停用，历史点名与考试记录保留
pub async fn delete_class(
    service: &ClassService,
    request: &HttpRequest,
    class_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    match storage.deactivate_class(class_id).await {
        Ok(true) => {
            info!("Class {} deactivated", class_id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Class deactivated successfully")))
        }
        Ok(false) => Ok(not_found(ErrorCode::ClassNotFound, "Class not found")),
        Err(e) => Ok(error_response(e)),
    }
}
