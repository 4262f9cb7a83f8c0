use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::StudentService;
use crate::models::ApiResponse;
use crate::models::students::requests::{StudentListParams, StudentListQuery};
use crate::services::error_response;
use crate::try_response;

pub async fn list_students(
    service: &StudentService,
    request: &HttpRequest,
    query: StudentListParams,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    let list_query = StudentListQuery {
        page: Some(query.pagination.page),
        size: Some(query.pagination.size),
        is_active: query.active.as_flag(),
        search: query.search,
    };

    match storage.list_students_with_pagination(list_query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Student list retrieved successfully",
        ))),
        Err(e) => Ok(error_response(e)),
    }
}
