/*!
 * JWT 认证中间件
 *
 * 校验 `Authorization: Bearer <access token>`，通过后把当前 [`User`] 放入请求扩展，
 * 供后续中间件和处理函数读取：
 *
 * ```rust,ignore
 * web::scope("/api/v1/teacher")
 *     .wrap(RequireRole::new(&UserRole::Teacher))
 *     .wrap(RequireJWT)
 * ```
 *
 * 用户信息按用户 ID 缓存在对象缓存中；停用或修改用户时由服务层删除对应缓存。
 */

use crate::cache::{ObjectCache, user_cache_key};
use crate::models::ErrorCode;
use crate::models::users::entities::{User, UserRole};
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpRequest,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{Method, StatusCode, header::AUTHORIZATION},
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, error, info};

use super::create_error_response;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Clone)]
pub struct RequireJWT;

/// 认证失败原因，只用于日志与响应消息
#[derive(Debug)]
enum AuthFailure {
    MissingToken,
    InvalidToken,
    UnknownUser,
    Inactive,
    Internal(String),
}

impl AuthFailure {
    fn message(&self) -> &'static str {
        match self {
            AuthFailure::MissingToken => "Missing or invalid Authorization header",
            AuthFailure::InvalidToken => "Invalid or expired token",
            AuthFailure::UnknownUser => "User not found",
            AuthFailure::Inactive => "User account is inactive",
            AuthFailure::Internal(_) => "Authentication service unavailable",
        }
    }
}

async fn authenticate(req: &ServiceRequest) -> Result<User, AuthFailure> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
        .ok_or(AuthFailure::MissingToken)?;

    let claims = JwtUtils::verify_access_token(token).map_err(|e| {
        debug!("Access token rejected: {}", e);
        AuthFailure::InvalidToken
    })?;
    let user_id = claims.user_id().ok_or(AuthFailure::InvalidToken)?;

    let cache = req
        .app_data::<web::Data<Arc<dyn ObjectCache>>>()
        .map(|data| data.get_ref().clone());
    let key = user_cache_key(user_id);

    let cached = match &cache {
        Some(cache) => cache.get_json::<User>(&key).await,
        None => None,
    };
    let user = match cached {
        Some(user) => user,
        None => {
            let storage = req
                .app_data::<web::Data<Arc<dyn Storage>>>()
                .ok_or_else(|| AuthFailure::Internal("storage not registered".into()))?
                .get_ref()
                .clone();
            let user = storage
                .get_user_by_id(user_id)
                .await
                .map_err(|e| AuthFailure::Internal(e.to_string()))?
                .ok_or(AuthFailure::UnknownUser)?;
            if let Some(cache) = &cache {
                cache.insert_json(key, &user, 0).await;
            }
            user
        }
    };

    if !user.is_active {
        return Err(AuthFailure::Inactive);
    }
    Ok(user)
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
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
            // CORS 预检请求不带 token
            if req.method() == Method::OPTIONS {
                return Ok(req.into_response(
                    create_error_response(StatusCode::NO_CONTENT, ErrorCode::Success, "")
                        .map_into_right_body(),
                ));
            }

            match authenticate(&req).await {
                Ok(user) => {
                    debug!("Authenticated user {} ({})", user.id, user.role);
                    req.extensions_mut().insert(user);
                    Ok(srv.call(req).await?.map_into_left_body())
                }
                Err(failure) => {
                    let (status, code) = match &failure {
                        AuthFailure::Internal(detail) => {
                            error!("Authentication failed on {}: {}", req.path(), detail);
                            (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalServerError)
                        }
                        AuthFailure::Inactive => {
                            info!("Inactive user rejected on {}", req.path());
                            (StatusCode::UNAUTHORIZED, ErrorCode::UserInactive)
                        }
                        other => {
                            info!("Authentication failed on {}: {:?}", req.path(), other);
                            (StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized)
                        }
                    };
                    Ok(req.into_response(
                        create_error_response(status, code, failure.message())
                            .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

impl RequireJWT {
    /// 当前请求的用户（需在 RequireJWT 之后调用）
    pub fn extract_user_claims(req: &HttpRequest) -> Option<User> {
        req.extensions().get::<User>().cloned()
    }

    pub fn extract_user_id(req: &HttpRequest) -> Option<i64> {
        req.extensions().get::<User>().map(|user| user.id)
    }

    pub fn extract_user_role(req: &HttpRequest) -> Option<UserRole> {
        req.extensions().get::<User>().map(|user| user.role.clone())
    }
}
