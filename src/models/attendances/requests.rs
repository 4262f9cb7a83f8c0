use super::entities::AttendanceStatus;
use serde::Deserialize;
use ts_rs::TS;

/// 未提供时长时使用的默认课时（分钟）
pub const DEFAULT_DURATION_MINUTES: i32 = 45;

// 单个学生的出勤结果
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct StudentAttendance {
    pub student_id: i64,
    pub status: AttendanceStatus,
}

// 教师提交点名
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct SubmitAttendanceRequest {
    pub class_id: i64,
    pub duration_minutes: Option<i32>,
    pub students: Vec<StudentAttendance>,
}

// 人脸识别服务返回的学号列表
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct RecognizedAttendanceRequest {
    pub class_id: i64,
    pub student_numbers: Vec<String>,
}

// 点名列表查询参数
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct AttendanceListParams {
    pub days: Option<i64>,
}

// 点名统计查询参数（YYYY-MM-DD）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct AttendanceStatsParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

// 点名创建（用于存储层）
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub class_id: i64,
    pub teacher_id: i64,
    pub attendance_date: String,
    pub attendance_time: String,
    pub duration_minutes: i32,
    pub records: Vec<StudentAttendance>,
}

impl NewAttendance {
    pub fn present_count(&self) -> i32 {
        self.records
            .iter()
            .filter(|r| r.status == AttendanceStatus::Present)
            .count() as i32
    }

    pub fn absent_count(&self) -> i32 {
        self.records.len() as i32 - self.present_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let req: SubmitAttendanceRequest = serde_json::from_str(
            r#"{"class_id":1,"students":[
                {"student_id":1,"status":"present"},
                {"student_id":2,"status":"absent"},
                {"student_id":3,"status":"present"}]}"#,
        )
        .unwrap();
        let new = NewAttendance {
            class_id: req.class_id,
            teacher_id: 9,
            attendance_date: "2025-03-10".into(),
            attendance_time: "09:00:00".into(),
            duration_minutes: req.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
            records: req.students,
        };
        assert_eq!(new.present_count(), 2);
        assert_eq!(new.absent_count(), 1);
        assert_eq!(new.duration_minutes, 45);
    }

    #[test]
    fn test_invalid_status_rejected() {
        let result = serde_json::from_str::<StudentAttendance>(
            r#"{"student_id":1,"status":"late"}"#,
        );
        assert!(result.is_err());
    }
}
