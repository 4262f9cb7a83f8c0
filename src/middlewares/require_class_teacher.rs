/*!
 * 班级授课权限中间件
 *
 * 路径中的 `{id}` 为班级 ID。管理员直接放行；教师必须被分配到该班级。
 * 必须注册在 RequireJWT 之内。
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{error, info};

use crate::{
    models::{ErrorCode, users::entities::User},
    storage::Storage,
};

use super::create_error_response;

#[derive(Clone, Default)]
pub struct RequireClassTeacher;

impl<S, B> Transform<S, ServiceRequest> for RequireClassTeacher
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireClassTeacherMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireClassTeacherMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireClassTeacherMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireClassTeacherMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        Box::pin(async move {
            let reject = |req: ServiceRequest,
                          status: StatusCode,
                          code: ErrorCode,
                          message: &str|
             -> Result<ServiceResponse<EitherBody<B>>, Error> {
                Ok(req.into_response(
                    create_error_response(status, code, message).map_into_right_body(),
                ))
            };

            let user = req.extensions().get::<User>().cloned();
            let Some(user) = user else {
                return reject(
                    req,
                    StatusCode::UNAUTHORIZED,
                    ErrorCode::Unauthorized,
                    "Authentication required",
                );
            };

            let class_id = req
                .match_info()
                .get("id")
                .and_then(|s| s.parse::<i64>().ok())
                .filter(|id| *id > 0);
            let Some(class_id) = class_id else {
                return reject(
                    req,
                    StatusCode::BAD_REQUEST,
                    ErrorCode::BadRequest,
                    "Missing or invalid class id",
                );
            };

            if user.is_admin() {
                return Ok(srv.call(req).await?.map_into_left_body());
            }

            let Some(storage) = req
                .app_data::<web::Data<Arc<dyn Storage>>>()
                .map(|data| data.get_ref().clone())
            else {
                error!("Storage not registered in app data");
                return reject(
                    req,
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::InternalServerError,
                    "Internal server error",
                );
            };

            match storage.is_teacher_of_class(user.id, class_id).await {
                Ok(true) => Ok(srv.call(req).await?.map_into_left_body()),
                Ok(false) => {
                    info!("Teacher {} is not assigned to class {}", user.id, class_id);
                    reject(
                        req,
                        StatusCode::FORBIDDEN,
                        ErrorCode::ClassPermissionDenied,
                        "You are not assigned to this class",
                    )
                }
                Err(e) => {
                    error!("Failed to check class assignment: {}", e);
                    reject(
                        req,
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorCode::InternalServerError,
                        "Internal server error",
                    )
                }
            }
        })
    }
}
