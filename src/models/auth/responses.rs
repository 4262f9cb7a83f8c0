use crate::models::users::entities::User;
use serde::Serialize;
use ts_rs::TS;

// 登录响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct LoginResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub user: User,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}

// 当前登录用户（前端用于会话检查）
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct SessionResponse {
    pub logged_in: bool,
    pub user: User,
}
