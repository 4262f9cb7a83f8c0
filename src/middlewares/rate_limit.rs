/*!
 * 请求频率限制中间件（固定窗口）
 *
 * 以登录用户 ID 或客户端 IP 为键计数，窗口内超过上限返回 429：
 *
 * ```rust,ignore
 * web::resource("/login")
 *     .wrap(RateLimit::login())
 *     .route(web::post().to(login))
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    http::header::{CONTENT_TYPE, RETRY_AFTER},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::net::IpAddr;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::models::{ApiResponse, ErrorCode, users::entities::User};

/// 计数与窗口起点
type Window = (u32, Instant);

/// 固定窗口计数器
pub struct RateLimiter {
    windows: Cache<String, Window>,
}

impl RateLimiter {
    pub fn new(max_window: Duration) -> Self {
        Self {
            windows: Cache::builder()
                .time_to_live(max_window)
                .max_capacity(100_000)
                .build(),
        }
    }

    /// 记录一次请求；超过上限时返回需等待的秒数
    pub async fn hit(&self, key: &str, max_requests: u32, window: Duration) -> Result<u32, u64> {
        let now = Instant::now();
        let (count, started) = match self.windows.get(key).await {
            Some((count, started)) if now.duration_since(started) < window => (count, started),
            _ => (0, now),
        };

        if count >= max_requests {
            let retry = window.saturating_sub(now.duration_since(started));
            return Err(retry.as_secs().max(1));
        }

        self.windows.insert(key.to_string(), (count + 1, started)).await;
        Ok(max_requests - count - 1)
    }
}

static LIMITER: Lazy<RateLimiter> = Lazy::new(|| RateLimiter::new(Duration::from_secs(3600)));

#[derive(Clone)]
pub struct RateLimit {
    max_requests: u32,
    window: Duration,
    key_prefix: &'static str,
}

impl RateLimit {
    pub fn new(max_requests: u32, window_secs: u64, key_prefix: &'static str) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
            key_prefix,
        }
    }

    /// 登录：每 IP 每分钟 5 次
    pub fn login() -> Self {
        Self::new(5, 60, "login")
    }

    pub fn refresh_token() -> Self {
        Self::new(10, 60, "refresh")
    }

    /// 人脸识别点名
    pub fn recognition() -> Self {
        Self::new(30, 60, "recognition")
    }
}

/// 优先使用连接地址，其次是代理头
fn client_ip(req: &ServiceRequest) -> String {
    let valid = |s: &str| s.trim().parse::<IpAddr>().is_ok();

    if let Some(ip) = req.connection_info().realip_remote_addr()
        && valid(ip)
    {
        return ip.to_string();
    }
    for header in ["X-Forwarded-For", "X-Real-IP"] {
        if let Some(ip) = req
            .headers()
            .get(header)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .filter(|ip| valid(ip))
        {
            return ip.trim().to_string();
        }
    }
    "unknown".to_string()
}

fn too_many_requests(retry_after: u64) -> HttpResponse {
    HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
        .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
        .insert_header((RETRY_AFTER, retry_after.to_string()))
        .json(ApiResponse::<()>::error_empty(
            ErrorCode::RateLimitExceeded,
            "Too many requests, please try again later",
        ))
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limit: self.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limit: RateLimit,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
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
        let limit = self.limit.clone();

        Box::pin(async move {
            let user_id = req.extensions().get::<User>().map(|u| u.id);
            let identity = match user_id {
                Some(id) => format!("user:{id}"),
                None => format!("ip:{}", client_ip(&req)),
            };
            let key = format!("{}:{}", limit.key_prefix, identity);

            if let Err(retry_after) = LIMITER.hit(&key, limit.max_requests, limit.window).await {
                warn!("Rate limit exceeded for {}", key);
                return Ok(req.into_response(too_many_requests(retry_after).map_into_right_body()));
            }

            Ok(srv.call(req).await?.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let login = RateLimit::login();
        assert_eq!(login.max_requests, 5);
        assert_eq!(login.window, Duration::from_secs(60));
        assert_eq!(login.key_prefix, "login");
    }

    #[tokio::test]
    async fn test_fixed_window() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        let window = Duration::from_secs(60);
        for expected in (0..3).rev() {
            assert_eq!(limiter.hit("ip:1.2.3.4", 3, window).await, Ok(expected));
        }
        let retry = limiter.hit("ip:1.2.3.4", 3, window).await.unwrap_err();
        assert!((1..=60).contains(&retry));

        // 不同键互不影响
        assert_eq!(limiter.hit("ip:5.6.7.8", 3, window).await, Ok(2));
    }

    #[tokio::test]
    async fn test_window_resets() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        let window = Duration::from_millis(50);
        assert!(limiter.hit("k", 1, window).await.is_ok());
        assert!(limiter.hit("k", 1, window).await.is_err());
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(limiter.hit("k", 1, window).await.is_ok());
    }
}
