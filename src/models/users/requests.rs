use super::entities::UserRole;
use crate::models::common::{ActiveFilter, PaginationQuery};
use serde::Deserialize;
use ts_rs::TS;

// 教师列表查询参数（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct TeacherListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    #[serde(default)]
    pub active: ActiveFilter,
    pub search: Option<String>,
}

// 创建教师请求（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct CreateTeacherRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
    #[serde(default)]
    pub class_ids: Vec<i64>,
}

// 更新教师请求，class_ids 提供时会替换原有授课班级
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UpdateTeacherRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
    pub password: Option<String>,
    pub class_ids: Option<Vec<i64>>,
}

// 用户创建（用于存储层，password 为哈希值）
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
    pub role: UserRole,
    pub class_ids: Vec<i64>,
}

// 用户更新（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub class_ids: Option<Vec<i64>>,
}

// 用户列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

// 教师修改个人资料（用户名、角色与授课班级只能由管理员修改）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
}
