use super::entities::{StudentDetail, TeacherStudent};
use crate::models::common::PaginationInfo;
use serde::Serialize;
use ts_rs::TS;

// 学生列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct StudentListResponse {
    pub items: Vec<StudentDetail>,
    pub pagination: PaginationInfo,
}

// 教师的学生列表
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct TeacherStudentListResponse {
    pub items: Vec<TeacherStudent>,
    pub total: i64,
}
