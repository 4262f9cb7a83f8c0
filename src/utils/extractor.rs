//! 路径参数提取器
//!
//! 解析失败时直接返回统一格式的 400，而不是 actix 默认的纯文本 404。

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, error};
use futures_util::future::{Ready, ready};

use crate::models::{ApiResponse, ErrorCode};

fn parse_positive_id(req: &HttpRequest, name: &str) -> Result<i64, error::Error> {
    let raw = req.match_info().get(name).unwrap_or_default();
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => {
            let message = format!("Invalid path parameter {name}: '{raw}'");
            Err(error::InternalError::from_response(
                message.clone(),
                HttpResponse::BadRequest().json(ApiResponse::<()>::error_empty(
                    ErrorCode::BadRequest,
                    message,
                )),
            )
            .into())
        }
    }
}

macro_rules! safe_id_extractor {
    ($(#[$meta:meta])* $name:ident, $param:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub i64);

        impl FromRequest for $name {
            type Error = error::Error;
            type Future = Ready<Result<Self, Self::Error>>;

            fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
                ready(parse_positive_id(req, $param).map($name))
            }
        }
    };
}

safe_id_extractor!(
    /// 路径中的 `{id}`
    SafeIDI64,
    "id"
);

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_safe_id() {
        let req = TestRequest::default().param("id", "42").to_http_request();
        let id = SafeIDI64::extract(&req).await.unwrap();
        assert_eq!(id, SafeIDI64(42));

        for bad in ["0", "-3", "abc"] {
            let req = TestRequest::default().param("id", bad).to_http_request();
            assert!(SafeIDI64::extract(&req).await.is_err());
        }
    }
}
