use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::classes::requests::{
    AvailabilityQuery, ClassQueryParams, CreateClassRequest, MakeupRequest, SlotCell,
    UpdateClassRequest,
};
use crate::models::users::entities::UserRole;
use crate::services::ClassService;
use crate::utils::SafeIDI64;

// 懒加载的全局 CLASS_SERVICE 实例，课表锁表随之共享
static CLASS_SERVICE: Lazy<ClassService> = Lazy::new(ClassService::new_lazy);

// HTTP处理程序
pub async fn list_classes(
    req: HttpRequest,
    query: web::Query<ClassQueryParams>,
) -> ActixResult<HttpResponse> {
    CLASS_SERVICE.list_classes(&req, query.into_inner()).await
}

pub async fn create_class(
    req: HttpRequest,
    class_data: web::Json<CreateClassRequest>,
) -> ActixResult<HttpResponse> {
    CLASS_SERVICE
        .create_class(&req, class_data.into_inner())
        .await
}

pub async fn get_class(req: HttpRequest, class_id: SafeIDI64) -> ActixResult<HttpResponse> {
    CLASS_SERVICE.get_class(&req, class_id.0).await
}

pub async fn update_class(
    req: HttpRequest,
    class_id: SafeIDI64,
    update_data: web::Json<UpdateClassRequest>,
) -> ActixResult<HttpResponse> {
    CLASS_SERVICE
        .update_class(&req, class_id.0, update_data.into_inner())
        .await
}

pub async fn delete_class(req: HttpRequest, class_id: SafeIDI64) -> ActixResult<HttpResponse> {
    CLASS_SERVICE.delete_class(&req, class_id.0).await
}

pub async fn get_schedule(req: HttpRequest, class_id: SafeIDI64) -> ActixResult<HttpResponse> {
    CLASS_SERVICE.get_schedule(&req, class_id.0).await
}

pub async fn availability(
    req: HttpRequest,
    query: web::Query<AvailabilityQuery>,
) -> ActixResult<HttpResponse> {
    CLASS_SERVICE.availability(&req, query.into_inner()).await
}

pub async fn book_makeup(
    req: HttpRequest,
    makeup: web::Json<MakeupRequest>,
) -> ActixResult<HttpResponse> {
    CLASS_SERVICE.book_makeup(&req, makeup.into_inner()).await
}

pub async fn add_slot(
    req: HttpRequest,
    class_id: SafeIDI64,
    cell: web::Json<SlotCell>,
) -> ActixResult<HttpResponse> {
    CLASS_SERVICE
        .add_slot(&req, class_id.0, cell.into_inner())
        .await
}

pub async fn remove_slot(
    req: HttpRequest,
    class_id: SafeIDI64,
    cell: web::Query<SlotCell>,
) -> ActixResult<HttpResponse> {
    CLASS_SERVICE
        .remove_slot(&req, class_id.0, cell.into_inner())
        .await
}

// 配置路由
pub fn configure_classes_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/classes")
            .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .route(web::get().to(list_classes))
                    .route(web::post().to(create_class)),
            )
            // 固定路径需注册在 /{id} 之前
            .route("/availability", web::get().to(availability))
            .route("/makeup", web::post().to(book_makeup))
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_class))
                    .route(web::put().to(update_class))
                    .route(web::delete().to(delete_class)),
            )
            .route("/{id}/schedule", web::get().to(get_schedule))
            .service(
                web::resource("/{id}/slots")
                    .route(web::post().to(add_slot))
                    .route(web::delete().to(remove_slot)),
            ),
    );
}
