use super::entities::{TeacherWithClasses, User};
use crate::models::common::PaginationInfo;
use serde::Serialize;
use ts_rs::TS;

// 单个用户响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UserResponse {
    pub user: User,
}

// 教师列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct TeacherListResponse {
    pub items: Vec<TeacherWithClasses>,
    pub pagination: PaginationInfo,
}

// 教师个人资料（附带授课统计）
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct TeacherProfileResponse {
    pub user: User,
    pub class_count: i64,
    pub student_count: i64,
}
