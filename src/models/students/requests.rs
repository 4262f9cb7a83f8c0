use super::entities::PhotoType;
use crate::models::common::{ActiveFilter, PaginationQuery};
use serde::Deserialize;
use ts_rs::TS;

// 学生列表查询参数（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct StudentListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    #[serde(default)]
    pub active: ActiveFilter,
    pub search: Option<String>,
}

// 学生列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct StudentListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

// 待保存的照片记录
#[derive(Debug, Clone)]
pub struct NewStudentPhoto {
    pub photo_type: PhotoType,
    pub photo_path: String,
}

// 创建学生（用于存储层，表单字段由 multipart 解析而来）
#[derive(Debug, Clone)]
pub struct CreateStudentRequest {
    pub student_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
    pub class_ids: Vec<i64>,
    pub photos: Vec<NewStudentPhoto>,
}

// 更新学生请求，class_ids 提供时会替换原有选课
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct UpdateStudentRequest {
    pub student_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
    pub class_ids: Option<Vec<i64>>,
    /// 追加的照片，仅 multipart 更新时提供
    #[serde(skip)]
    #[ts(skip)]
    pub photos: Vec<NewStudentPhoto>,
}
