use crate::models::feedbacks::entities::FeedbackWithTeacher;
use serde::Serialize;
use ts_rs::TS;

// 登录次数统计
#[derive(Debug, Clone, Default, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct LoginStats {
    pub today: i64,
    pub last_7_days: i64,
    pub last_30_days: i64,
}

// 管理员仪表盘
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct DashboardResponse {
    pub logins: LoginStats,
    // 近 30 天人脸识别调用次数
    pub ai_usage_30_days: i64,
    pub teacher_count: i64,
    pub student_count: i64,
    pub class_count: i64,
    pub unread_feedbacks: Vec<FeedbackWithTeacher>,
}
