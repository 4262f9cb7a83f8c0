use crate::config::OverflowPolicy;
use serde::Deserialize;
use ts_rs::TS;

// 创建考试请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct CreateExamRequest {
    pub class_id: i64,
    pub exam_name: String,
    pub classroom: Option<String>,
    pub exam_date: String,
    pub exam_time: Option<String>,
}

// 考试列表查询参数
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct ExamListParams {
    // true 查询历史考试，默认查询今天及之后的考试
    #[serde(default)]
    pub past: bool,
}

// 考试创建（用于存储层，字段已校验并补全默认值）
#[derive(Debug, Clone)]
pub struct NewExam {
    pub class_id: i64,
    pub exam_name: String,
    pub classroom: String,
    pub exam_date: String,
    pub exam_time: String,
}

/// 座位分配策略
#[derive(Debug, Clone, Copy)]
pub struct SeatingOptions {
    pub capacity: usize,
    pub overflow: OverflowPolicy,
    pub allow_empty: bool,
}

impl SeatingOptions {
    pub fn from_config(config: &crate::config::ExamConfig) -> Self {
        Self {
            capacity: config.seat_capacity,
            overflow: config.overflow_policy,
            allow_empty: config.allow_empty_class,
        }
    }
}
