use serde::Serialize;
use ts_rs::TS;

use super::seating::SeatingPlan;

/// 未指定考场时使用的默认考场
pub const DEFAULT_CLASSROOM: &str = "Derslik-1";
/// 未指定时间时使用的默认考试时间
pub const DEFAULT_EXAM_TIME: &str = "00:00";

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct Exam {
    pub id: i64,
    pub class_id: i64,
    pub exam_name: String,
    pub classroom: String,
    // YYYY-MM-DD
    pub exam_date: String,
    // HH:MM
    pub exam_time: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// 考试列表项（附带班级信息）
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct ExamSummary {
    #[serde(flatten)]
    #[ts(flatten)]
    pub exam: Exam,
    pub class_name: String,
    pub class_code: String,
    pub seated_count: i64,
}

// 座位表中的一行
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct SeatingRow {
    pub seat_number: i32,
    pub student_id: i64,
    pub student_number: String,
    pub first_name: String,
    pub last_name: String,
}

/// 创建考试的结果：考试记录与本次分配方案
#[derive(Debug, Clone)]
pub struct CreatedExam {
    pub exam: Exam,
    pub plan: SeatingPlan,
}
