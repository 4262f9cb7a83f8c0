use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Local;

use super::DashboardService;
use crate::models::ApiResponse;
use crate::services::error_response;
use crate::try_response;

pub async fn get_dashboard(
    service: &DashboardService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    match storage.get_dashboard(Local::now().date_naive()).await {
        Ok(dashboard) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            dashboard,
            "Dashboard retrieved successfully",
        ))),
        Err(e) => Ok(error_response(e)),
    }
}
