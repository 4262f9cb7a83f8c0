use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::users::entities::ClassBrief;

/// 学生照片角度，每名学生需要五个角度各一张
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub enum PhotoType {
    Front,
    Right,
    Left,
    Up,
    Down,
}

impl PhotoType {
    /// 上传顺序即为角度顺序
    pub const ALL: [PhotoType; 5] = [
        PhotoType::Front,
        PhotoType::Right,
        PhotoType::Left,
        PhotoType::Up,
        PhotoType::Down,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoType::Front => "front",
            PhotoType::Right => "right",
            PhotoType::Left => "left",
            PhotoType::Up => "up",
            PhotoType::Down => "down",
        }
    }
}

impl std::fmt::Display for PhotoType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PhotoType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PhotoType::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Invalid photo type: {s}"))
    }
}

// 学生实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct Student {
    pub id: i64,
    pub student_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// 学生照片
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct StudentPhoto {
    pub id: i64,
    pub student_id: i64,
    pub photo_type: PhotoType,
    pub photo_path: String,
    // 识别服务是否已生成人脸特征
    pub has_encoding: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// 学生详情（管理端）
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct StudentDetail {
    #[serde(flatten)]
    #[ts(flatten)]
    pub student: Student,
    pub classes: Vec<ClassBrief>,
    pub photos: Vec<StudentPhoto>,
}

// 学生在某个班级的缺勤情况
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct EnrollmentInfo {
    pub class_id: i64,
    pub class_name: String,
    pub class_code: String,
    pub absences_count: i32,
    pub max_absences: i32,
    pub remaining_absences: i32,
}

impl EnrollmentInfo {
    pub fn new(
        class_id: i64,
        class_name: String,
        class_code: String,
        absences_count: i32,
        max_absences: i32,
    ) -> Self {
        Self {
            class_id,
            class_name,
            class_code,
            absences_count,
            max_absences,
            remaining_absences: max_absences - absences_count,
        }
    }
}

// 教师视角下的学生（按学生去重，附带各班缺勤信息）
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct TeacherStudent {
    #[serde(flatten)]
    #[ts(flatten)]
    pub student: Student,
    pub enrollments: Vec<EnrollmentInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_type_order() {
        let names: Vec<&str> = PhotoType::ALL.iter().map(|t| t.as_str()).collect();
        assert_eq!(names, ["front", "right", "left", "up", "down"]);
        assert_eq!("up".parse::<PhotoType>().unwrap(), PhotoType::Up);
        assert!("back".parse::<PhotoType>().is_err());
    }

    #[test]
    fn test_remaining_absences() {
        let info = EnrollmentInfo::new(1, "Math".into(), "MAT101".into(), 2, 3);
        assert_eq!(info.remaining_absences, 1);
        let over = EnrollmentInfo::new(1, "Math".into(), "MAT101".into(), 5, 3);
        assert_eq!(over.remaining_absences, -2);
    }
}
