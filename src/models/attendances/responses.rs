use super::entities::{AttendanceDetailRow, AttendanceStatus, AttendanceSummary};
use serde::Serialize;
use ts_rs::TS;

// 点名列表
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct AttendanceListResponse {
    pub items: Vec<AttendanceSummary>,
}

// 点名详情
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct AttendanceDetailResponse {
    pub attendance: AttendanceSummary,
    pub details: Vec<AttendanceDetailRow>,
}

// 识别结果映射到班级名单后的一行
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct RecognizedStudent {
    pub student_id: i64,
    pub student_number: String,
    pub first_name: String,
    pub last_name: String,
    pub status: AttendanceStatus,
}

// 识别结果
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct RecognizedAttendanceResponse {
    pub class_id: i64,
    pub total_students: usize,
    pub present_count: usize,
    pub absent_count: usize,
    pub students: Vec<RecognizedStudent>,
    // 识别出但不在该班级名单中的学号
    pub unknown_numbers: Vec<String>,
}

// 点名统计
#[derive(Debug, Clone, Default, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct AttendanceStatsResponse {
    pub start_date: String,
    pub end_date: String,
    pub total_attendances: i64,
    pub total_present: i64,
    pub total_absent: i64,
    pub avg_duration: f64,
    pub classes_count: i64,
    pub teachers_count: i64,
}

// 提交点名结果
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct AttendanceSubmittedResponse {
    pub attendance_id: i64,
    pub present_count: i32,
    pub absent_count: i32,
}
