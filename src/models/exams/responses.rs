use super::entities::{ExamSummary, SeatingRow};
use serde::Serialize;
use ts_rs::TS;

// 考试创建结果
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct ExamCreatedResponse {
    pub exam_id: i64,
    pub seated_count: usize,
    pub unseated_student_ids: Vec<i64>,
}

// 考试详情与座位表（按座位号排序）
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct ExamDetailResponse {
    pub exam: ExamSummary,
    pub seating: Vec<SeatingRow>,
}

// 考试列表
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct ExamListResponse {
    pub items: Vec<ExamSummary>,
}
