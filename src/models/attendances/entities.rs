use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 出勤状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub const PRESENT: &'static str = "present";
    pub const ABSENT: &'static str = "absent";
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttendanceStatus::Present => write!(f, "{}", AttendanceStatus::PRESENT),
            AttendanceStatus::Absent => write!(f, "{}", AttendanceStatus::ABSENT),
        }
    }
}

impl std::str::FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            AttendanceStatus::PRESENT => Ok(AttendanceStatus::Present),
            AttendanceStatus::ABSENT => Ok(AttendanceStatus::Absent),
            _ => Err(format!("Invalid attendance status: {s}")),
        }
    }
}

// 点名记录
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct Attendance {
    pub id: i64,
    pub class_id: i64,
    pub teacher_id: i64,
    pub attendance_date: String,
    pub attendance_time: String,
    pub duration_minutes: i32,
    pub total_students: i32,
    pub present_count: i32,
    pub absent_count: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// 点名记录列表项
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct AttendanceSummary {
    #[serde(flatten)]
    #[ts(flatten)]
    pub attendance: Attendance,
    pub class_name: String,
    pub class_code: String,
    pub teacher_name: String,
}

// 点名明细（每名学生一行）
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct AttendanceDetailRow {
    pub student_id: i64,
    pub student_number: String,
    pub first_name: String,
    pub last_name: String,
    pub status: AttendanceStatus,
}
