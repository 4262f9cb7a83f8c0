use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::{CreateTeacherRequest, TeacherListParams, UpdateTeacherRequest};
use crate::services::TeacherService;
use crate::utils::SafeIDI64;

// 懒加载的全局 TEACHER_SERVICE 实例
static TEACHER_SERVICE: Lazy<TeacherService> = Lazy::new(TeacherService::new_lazy);

pub async fn list_teachers(
    req: HttpRequest,
    query: web::Query<TeacherListParams>,
) -> ActixResult<HttpResponse> {
    TEACHER_SERVICE.list_teachers(&req, query.into_inner()).await
}

pub async fn create_teacher(
    req: HttpRequest,
    teacher: web::Json<CreateTeacherRequest>,
) -> ActixResult<HttpResponse> {
    TEACHER_SERVICE
        .create_teacher(&req, teacher.into_inner())
        .await
}

pub async fn get_teacher(req: HttpRequest, teacher_id: SafeIDI64) -> ActixResult<HttpResponse> {
    TEACHER_SERVICE.get_teacher(&req, teacher_id.0).await
}

pub async fn update_teacher(
    req: HttpRequest,
    teacher_id: SafeIDI64,
    update: web::Json<UpdateTeacherRequest>,
) -> ActixResult<HttpResponse> {
    TEACHER_SERVICE
        .update_teacher(&req, teacher_id.0, update.into_inner())
        .await
}

pub async fn deactivate_teacher(
    req: HttpRequest,
    teacher_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    TEACHER_SERVICE.set_active(&req, teacher_id.0, false).await
}

pub async fn activate_teacher(req: HttpRequest, teacher_id: SafeIDI64) -> ActixResult<HttpResponse> {
    TEACHER_SERVICE.set_active(&req, teacher_id.0, true).await
}

// 配置路由
pub fn configure_teachers_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/teachers")
            .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .route(web::get().to(list_teachers))
                    .route(web::post().to(create_teacher)),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_teacher))
                    .route(web::put().to(update_teacher))
                    .route(web::delete().to(deactivate_teacher)),
            )
            .route("/{id}/activate", web::post().to(activate_teacher)),
    );
}
