use super::entities::FeedbackType;
use serde::Deserialize;
use ts_rs::TS;

// 发送反馈请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/feedback.ts")]
pub struct SendFeedbackRequest {
    pub subject: String,
    pub message: String,
    #[serde(default, rename = "type")]
    pub feedback_type: FeedbackType,
}

// 反馈创建（用于存储层）
#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub teacher_id: i64,
    pub subject: String,
    pub message: String,
    pub feedback_type: FeedbackType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_defaults_to_feedback() {
        let req: SendFeedbackRequest =
            serde_json::from_str(r#"{"subject":"Projector","message":"Broken"}"#).unwrap();
        assert_eq!(req.feedback_type, FeedbackType::Feedback);

        let req: SendFeedbackRequest = serde_json::from_str(
            r#"{"subject":"Room","message":"Too cold","type":"complaint"}"#,
        )
        .unwrap();
        assert_eq!(req.feedback_type, FeedbackType::Complaint);
    }
}
