//! 教师端路由，全部位于 /api/v1/teacher 之下

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use super::attendances::ATTENDANCE_SERVICE;
use super::exams::EXAM_SERVICE;
use super::feedbacks::FEEDBACK_SERVICE;
use crate::middlewares;
use crate::models::attendances::requests::{
    AttendanceListParams, RecognizedAttendanceRequest, SubmitAttendanceRequest,
};
use crate::models::feedbacks::requests::SendFeedbackRequest;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::UpdateProfileRequest;
use crate::services::TeacherPortalService;
use crate::utils::SafeIDI64;

// 懒加载的全局 TeacherPortalService 实例
static PORTAL_SERVICE: Lazy<TeacherPortalService> = Lazy::new(TeacherPortalService::new_lazy);

pub async fn get_profile(req: HttpRequest) -> ActixResult<HttpResponse> {
    PORTAL_SERVICE.get_profile(&req).await
}

pub async fn update_profile(
    req: HttpRequest,
    update: web::Json<UpdateProfileRequest>,
) -> ActixResult<HttpResponse> {
    PORTAL_SERVICE.update_profile(&req, update.into_inner()).await
}

pub async fn list_my_classes(req: HttpRequest) -> ActixResult<HttpResponse> {
    PORTAL_SERVICE.list_my_classes(&req).await
}

pub async fn get_my_class(req: HttpRequest, class_id: SafeIDI64) -> ActixResult<HttpResponse> {
    PORTAL_SERVICE.get_my_class(&req, class_id.0).await
}

pub async fn list_my_students(req: HttpRequest) -> ActixResult<HttpResponse> {
    PORTAL_SERVICE.list_my_students(&req).await
}

pub async fn list_my_exams(req: HttpRequest) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.list_teacher_exams(&req).await
}

pub async fn get_my_exam(req: HttpRequest, exam_id: SafeIDI64) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.get_teacher_exam(&req, exam_id.0).await
}

pub async fn submit_attendance(
    req: HttpRequest,
    attendance: web::Json<SubmitAttendanceRequest>,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE
        .submit_attendance(&req, attendance.into_inner())
        .await
}

pub async fn recognized_attendance(
    req: HttpRequest,
    recognized: web::Json<RecognizedAttendanceRequest>,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE
        .recognized_attendance(&req, recognized.into_inner())
        .await
}

pub async fn list_my_attendances(
    req: HttpRequest,
    query: web::Query<AttendanceListParams>,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE
        .list_teacher_attendances(&req, query.into_inner())
        .await
}

pub async fn get_my_attendance(
    req: HttpRequest,
    attendance_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE.get_attendance(&req, attendance_id.0).await
}

pub async fn send_feedback(
    req: HttpRequest,
    feedback: web::Json<SendFeedbackRequest>,
) -> ActixResult<HttpResponse> {
    FEEDBACK_SERVICE
        .send_feedback(&req, feedback.into_inner())
        .await
}

pub async fn list_my_feedbacks(req: HttpRequest) -> ActixResult<HttpResponse> {
    FEEDBACK_SERVICE.list_my_feedbacks(&req).await
}

// 配置路由
pub fn configure_teacher_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/teacher")
            .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles()))
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("/profile")
                    .route(web::get().to(get_profile))
                    .route(web::put().to(update_profile)),
            )
            .route("/classes", web::get().to(list_my_classes))
            .service(
                web::resource("/classes/{id}")
                    .wrap(middlewares::RequireClassTeacher)
                    .route(web::get().to(get_my_class)),
            )
            .route("/students", web::get().to(list_my_students))
            .route("/exams", web::get().to(list_my_exams))
            .route("/exams/{id}", web::get().to(get_my_exam))
            .service(
                web::resource("/attendances")
                    .route(web::get().to(list_my_attendances))
                    .route(web::post().to(submit_attendance)),
            )
            .service(
                web::resource("/attendances/recognized")
                    .wrap(middlewares::RateLimit::recognition())
                    .route(web::post().to(recognized_attendance)),
            )
            .route("/attendances/{id}", web::get().to(get_my_attendance))
            .service(
                web::resource("/feedbacks")
                    .route(web::get().to(list_my_feedbacks))
                    .route(web::post().to(send_feedback)),
            ),
    );
}
