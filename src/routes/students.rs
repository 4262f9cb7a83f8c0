use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, guard, http::header, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::students::requests::{StudentListParams, UpdateStudentRequest};
use crate::models::users::entities::UserRole;
use crate::services::StudentService;
use crate::utils::SafeIDI64;

// 懒加载的全局 STUDENT_SERVICE 实例
static STUDENT_SERVICE: Lazy<StudentService> = Lazy::new(StudentService::new_lazy);

pub async fn list_students(
    req: HttpRequest,
    query: web::Query<StudentListParams>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.list_students(&req, query.into_inner()).await
}

pub async fn create_student(req: HttpRequest, payload: Multipart) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.create_student(&req, payload).await
}

pub async fn get_student(req: HttpRequest, student_id: SafeIDI64) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.get_student(&req, student_id.0).await
}

pub async fn update_student(
    req: HttpRequest,
    student_id: SafeIDI64,
    update: web::Json<UpdateStudentRequest>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE
        .update_student(&req, student_id.0, update.into_inner())
        .await
}

pub async fn update_student_multipart(
    req: HttpRequest,
    student_id: SafeIDI64,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE
        .update_student_multipart(&req, student_id.0, payload)
        .await
}

fn is_multipart(ctx: &guard::GuardContext) -> bool {
    ctx.head()
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.to_ascii_lowercase().starts_with("multipart/form-data"))
}

pub async fn deactivate_student(
    req: HttpRequest,
    student_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.set_active(&req, student_id.0, false).await
}

pub async fn activate_student(req: HttpRequest, student_id: SafeIDI64) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.set_active(&req, student_id.0, true).await
}

// 配置路由
pub fn configure_students_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/students")
            .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .route(web::get().to(list_students))
                    .route(web::post().to(create_student)),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_student))
                    .route(
                        web::put()
                            .guard(guard::fn_guard(is_multipart))
                            .to(update_student_multipart),
                    )
                    .route(web::put().to(update_student))
                    .route(web::delete().to(deactivate_student)),
            )
            .route("/{id}/activate", web::post().to(activate_student)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_multipart_guard() {
        let req = TestRequest::put()
            .insert_header((header::CONTENT_TYPE, "multipart/form-data; boundary=abc"))
            .to_srv_request();
        assert!(is_multipart(&req.guard_ctx()));

        let req = TestRequest::put()
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .to_srv_request();
        assert!(!is_multipart(&req.guard_ctx()));
    }
}
