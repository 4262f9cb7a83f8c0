use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::TeacherService;
use crate::models::ApiResponse;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::{TeacherListParams, UserListQuery};
use crate::services::error_response;
use crate::try_response;

pub async fn list_teachers(
    service: &TeacherService,
    request: &HttpRequest,
    query: TeacherListParams,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    let list_query = UserListQuery {
        page: Some(query.pagination.page),
        size: Some(query.pagination.size),
        role: Some(UserRole::Teacher),
        is_active: query.active.as_flag(),
        search: query.search,
    };

    match storage.list_teachers_with_pagination(list_query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Teacher list retrieved successfully",
        ))),
        Err(e) => Ok(error_response(e)),
    }
}
