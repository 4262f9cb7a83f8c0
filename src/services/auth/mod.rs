pub mod login;
pub mod logout;
pub mod password;
pub mod token;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::models::auth::requests::{ChangePasswordRequest, LoginRequest};
use crate::storage::Storage;

pub struct AuthService {
    storage: Option<Arc<dyn Storage>>,
}

impl AuthService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>, HttpResponse> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    pub(crate) fn get_config(&self) -> &AppConfig {
        AppConfig::get()
    }

    // 登录验证
    pub async fn login(
        &self,
        login_request: LoginRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        login::handle_login(self, login_request, request).await
    }

    // 刷新令牌
    pub async fn refresh_token(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        token::handle_refresh_token(self, request).await
    }

    // 当前会话
    pub async fn session(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        token::handle_session(request).await
    }

    pub async fn logout(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        logout::handle_logout(request).await
    }

    // 修改密码
    pub async fn change_password(
        &self,
        change_request: ChangePasswordRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        password::handle_change_password(self, change_request, request).await
    }
}
