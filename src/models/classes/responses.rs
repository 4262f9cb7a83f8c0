use super::entities::{ClassDetail, ClassSummary, MakeupLifetime};
use super::requests::SlotCell;
use super::schedule::{HourSlot, SlotRecord, Weekday};
use crate::models::common::PaginationInfo;
use crate::models::attendances::entities::AttendanceSummary;
use serde::Serialize;
use ts_rs::TS;

// 班级列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct ClassListResponse {
    pub pagination: PaginationInfo,
    pub items: Vec<ClassSummary>,
}

// 被占用的时段及占用班级
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct OccupiedCell {
    #[ts(type = "string")]
    pub day: Weekday,
    #[ts(type = "string")]
    pub hour: HourSlot,
    pub class_ids: Vec<i64>,
}

// 合并课表空闲情况
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct AvailabilityResponse {
    pub class_ids: Vec<i64>,
    pub free: Vec<SlotCell>,
    pub occupied: Vec<OccupiedCell>,
}

// 单个班级的课表
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct ScheduleResponse {
    pub class_id: i64,
    pub schedule: Vec<SlotRecord>,
    pub makeup_slots: Vec<MakeupLifetime>,
}

// 补课预约结果
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct MakeupBookedResponse {
    pub class_ids: Vec<i64>,
    pub slots: Vec<SlotCell>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

// 教师查看的班级详情，附带最近的点名记录
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct TeacherClassDetailResponse {
    pub class: ClassDetail,
    pub recent_attendances: Vec<AttendanceSummary>,
}

// 教师的班级列表
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct TeacherClassListResponse {
    pub items: Vec<ClassDetail>,
}
