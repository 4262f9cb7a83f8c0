use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 反馈类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/feedback.ts")]
pub enum FeedbackType {
    #[default]
    Feedback,
    Complaint,
    Request,
}

impl FeedbackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackType::Feedback => "feedback",
            FeedbackType::Complaint => "complaint",
            FeedbackType::Request => "request",
        }
    }
}

impl std::str::FromStr for FeedbackType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "feedback" => Ok(FeedbackType::Feedback),
            "complaint" => Ok(FeedbackType::Complaint),
            "request" => Ok(FeedbackType::Request),
            _ => Err(format!("Invalid feedback type: {s}")),
        }
    }
}

// 教师发给管理员的反馈
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/feedback.ts")]
pub struct Feedback {
    pub id: i64,
    pub teacher_id: i64,
    pub subject: String,
    pub message: String,
    pub feedback_type: FeedbackType,
    pub is_read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// 管理端反馈列表项
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/feedback.ts")]
pub struct FeedbackWithTeacher {
    #[serde(flatten)]
    #[ts(flatten)]
    pub feedback: Feedback,
    pub teacher_name: String,
    pub teacher_email: String,
}
