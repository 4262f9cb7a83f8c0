/*!
 * 角色访问控制中间件
 *
 * 必须注册在 RequireJWT 之内（actix 中后 `wrap` 的先执行）：
 *
 * ```rust,ignore
 * web::scope("/api/v1/admin")
 *     .wrap(RequireRole::new(&UserRole::Admin))
 *     .wrap(RequireJWT)
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::info;

use crate::models::{
    ErrorCode,
    users::entities::{User, UserRole},
};

use super::create_error_response;

#[derive(Clone)]
pub struct RequireRole {
    allowed: Rc<[UserRole]>,
}

impl RequireRole {
    pub fn new(role: &UserRole) -> Self {
        Self::new_any(&[role])
    }

    /// 任一角色即可
    pub fn new_any(roles: &[&UserRole]) -> Self {
        Self {
            allowed: roles.iter().map(|r| (*r).clone()).collect(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleMiddleware {
            service: Rc::new(service),
            allowed: self.allowed.clone(),
        }))
    }
}

pub struct RequireRoleMiddleware<S> {
    service: Rc<S>,
    allowed: Rc<[UserRole]>,
}

impl<S, B> Service<ServiceRequest> for RequireRoleMiddleware<S>
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
        let allowed = self.allowed.clone();

        Box::pin(async move {
            let user = req.extensions().get::<User>().map(|u| (u.id, u.role.clone()));
            let Some((user_id, role)) = user else {
                info!("Role check on {} without an authenticated user", req.path());
                return Ok(req.into_response(
                    create_error_response(
                        StatusCode::UNAUTHORIZED,
                        ErrorCode::Unauthorized,
                        "Authentication required",
                    )
                    .map_into_right_body(),
                ));
            };

            if allowed.contains(&role) {
                return Ok(srv.call(req).await?.map_into_left_body());
            }

            info!(
                "User {} with role {} denied on {} (allowed: {:?})",
                user_id,
                role,
                req.path(),
                allowed
            );
            Ok(req.into_response(
                create_error_response(StatusCode::FORBIDDEN, ErrorCode::Forbidden, "Access denied")
                    .map_into_right_body(),
            ))
        })
    }
}
