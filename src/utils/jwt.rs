//! JWT 签发与校验
//!
//! access token 放在 `Authorization: Bearer` 头中，refresh token 只通过 HttpOnly Cookie 传递。

use crate::config::AppConfig;
use actix_web::cookie::{Cookie, SameSite};
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::{Error as JwtError, ErrorKind},
};
use serde::{Deserialize, Serialize};

pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // 用户 ID
    pub role: String,
    pub kind: TokenKind,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct JwtUtils;

impl JwtUtils {
    fn secret() -> &'static [u8] {
        AppConfig::get().jwt.secret.as_bytes()
    }

    fn sign(user_id: i64, role: &str, kind: TokenKind, ttl: TimeDelta) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            kind,
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(Self::secret()),
        )
    }

    pub fn generate_access_token(user_id: i64, role: &str) -> Result<String, JwtError> {
        let minutes = AppConfig::get().jwt.access_token_expiry;
        Self::sign(user_id, role, TokenKind::Access, TimeDelta::minutes(minutes))
    }

    /// `ttl` 为空时使用默认的 refresh 有效期
    pub fn generate_refresh_token(
        user_id: i64,
        role: &str,
        ttl: Option<TimeDelta>,
    ) -> Result<String, JwtError> {
        let ttl = ttl.unwrap_or_else(|| TimeDelta::days(AppConfig::get().jwt.refresh_token_expiry));
        Self::sign(user_id, role, TokenKind::Refresh, ttl)
    }

    pub fn generate_token_pair(
        user_id: i64,
        role: &str,
        refresh_ttl: Option<TimeDelta>,
    ) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            access_token: Self::generate_access_token(user_id, role)?,
            refresh_token: Self::generate_refresh_token(user_id, role, refresh_ttl)?,
        })
    }

    fn verify(token: &str, expected: TokenKind) -> Result<Claims, JwtError> {
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(Self::secret()),
            &Validation::default(),
        )?
        .claims;
        if claims.kind != expected {
            return Err(ErrorKind::InvalidToken.into());
        }
        Ok(claims)
    }

    pub fn verify_access_token(token: &str) -> Result<Claims, JwtError> {
        Self::verify(token, TokenKind::Access)
    }

    pub fn verify_refresh_token(token: &str) -> Result<Claims, JwtError> {
        Self::verify(token, TokenKind::Refresh)
    }

    /// refresh token Cookie，`max_age` 与 token 有效期一致
    pub fn refresh_cookie(refresh_token: &str, ttl: TimeDelta) -> Cookie<'static> {
        Cookie::build(REFRESH_COOKIE_NAME, refresh_token.to_string())
            .path("/")
            .max_age(actix_web::cookie::time::Duration::seconds(ttl.num_seconds()))
            .same_site(SameSite::Strict)
            .http_only(true)
            .secure(AppConfig::get().is_production())
            .finish()
    }

    /// 注销时用于覆盖浏览器中的 refresh token
    pub fn expired_refresh_cookie() -> Cookie<'static> {
        Self::refresh_cookie("", TimeDelta::zero())
    }

    pub fn refresh_token_from_cookie(req: &actix_web::HttpRequest) -> Option<String> {
        req.cookie(REFRESH_COOKIE_NAME)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_kinds_are_not_interchangeable() {
        let pair = JwtUtils::generate_token_pair(7, "teacher", None).unwrap();

        let claims = JwtUtils::verify_access_token(&pair.access_token).unwrap();
        assert_eq!(claims.user_id(), Some(7));
        assert_eq!(claims.role, "teacher");

        assert!(JwtUtils::verify_refresh_token(&pair.access_token).is_err());
        assert!(JwtUtils::verify_access_token(&pair.refresh_token).is_err());
        assert!(JwtUtils::verify_refresh_token(&pair.refresh_token).is_ok());
    }

    #[test]
    fn test_expired_token_rejected() {
        let token =
            JwtUtils::sign(1, "admin", TokenKind::Access, TimeDelta::minutes(-10)).unwrap();
        assert!(JwtUtils::verify_access_token(&token).is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let token = JwtUtils::generate_access_token(1, "admin").unwrap();
        let mut tampered = token.clone();
        tampered.push('x');
        assert!(JwtUtils::verify_access_token(&tampered).is_err());
    }
}
