use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;
use tracing::{info, warn};

use super::ClassService;
use crate::models::{
    ApiResponse,
    classes::requests::{ClassListQuery, ClassQueryParams},
};
use crate::services::error_response;
use crate::try_response;

pub async fn list_classes(
    service: &ClassService,
    request: &HttpRequest,
    query: ClassQueryParams,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let options = service.schedule_options();
    let now = Utc::now();

    // 清理失败不影响列表查询
    match storage.prune_expired_makeups(now, options.makeup_ttl).await {
        Ok(0) => {}
        Ok(changed) => info!("Pruned expired makeup slots from {} classes", changed),
        Err(e) => warn!("Failed to prune expired makeup slots: {}", e),
    }

    let list_query = ClassListQuery {
        page: Some(query.pagination.page),
        size: Some(query.pagination.size),
        is_active: query.active.as_flag(),
        search: query.search,
    };

    match storage
        .list_classes_with_pagination(list_query, now, options.makeup_ttl)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Class list retrieved successfully",
        ))),
        Err(e) => Ok(error_response(e)),
    }
}
