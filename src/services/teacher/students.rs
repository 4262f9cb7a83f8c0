use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::TeacherPortalService;
use crate::models::ApiResponse;
use crate::models::students::responses::TeacherStudentListResponse;
use crate::services::{current_user, error_response};
use crate::try_response;

/// 按学生去重，存储层已按名字排序
pub async fn list_my_students(
    service: &TeacherPortalService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));

    match storage.list_teacher_students(user.id).await {
        Ok(items) => {
            let total = items.len() as i64;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                TeacherStudentListResponse { items, total },
                "Students retrieved successfully",
            )))
        }
        Err(e) => Ok(error_response(e)),
    }
}
