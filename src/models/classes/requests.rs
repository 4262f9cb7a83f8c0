use super::schedule::{HourSlot, SlotRecord, Weekday, WeeklySchedule};
use crate::models::common::{ActiveFilter, PaginationQuery};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 班级查询参数（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct ClassQueryParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    #[serde(default)]
    pub active: ActiveFilter,
    pub search: Option<String>,
}

// 班级列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct ClassListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

// 创建班级请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct CreateClassRequest {
    pub class_name: String,
    pub class_code: String,
    pub description: Option<String>,
    pub max_absences: Option<i32>,
    pub schedule: Option<Vec<SlotRecord>>,
}

// 更新班级请求，schedule 提供时整体替换课表
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct UpdateClassRequest {
    pub class_name: Option<String>,
    pub class_code: Option<String>,
    pub description: Option<String>,
    pub max_absences: Option<i32>,
    pub schedule: Option<Vec<SlotRecord>>,
}

// 班级创建（用于存储层，课表已校验）
#[derive(Debug, Clone)]
pub struct NewClass {
    pub class_name: String,
    pub class_code: String,
    pub description: Option<String>,
    pub max_absences: i32,
    pub schedule: WeeklySchedule,
}

// 班级更新（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct ClassUpdate {
    pub class_name: Option<String>,
    pub class_code: Option<String>,
    pub description: Option<String>,
    pub max_absences: Option<i32>,
    pub schedule: Option<WeeklySchedule>,
}

/// 课表读取与补课保留策略
#[derive(Debug, Clone, Copy)]
pub struct ScheduleOptions {
    pub makeup_ttl: chrono::TimeDelta,
    pub strict: bool,
}

impl ScheduleOptions {
    pub fn from_config(config: &crate::config::ScheduleConfig) -> Self {
        Self {
            makeup_ttl: chrono::TimeDelta::days(config.makeup_ttl_days),
            strict: config.strict_parsing,
        }
    }
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            makeup_ttl: chrono::TimeDelta::days(7),
            strict: false,
        }
    }
}

// 单个时段（添加/删除时段、补课预约）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct SlotCell {
    #[ts(type = "string")]
    pub day: Weekday,
    #[ts(type = "string")]
    pub hour: HourSlot,
}

impl SlotCell {
    pub fn as_tuple(&self) -> (Weekday, HourSlot) {
        (self.day, self.hour)
    }
}

// 跨班级补课预约
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct MakeupRequest {
    pub class_ids: Vec<i64>,
    pub slots: Vec<SlotCell>,
}

// 合并课表查询，class_ids 以逗号分隔
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct AvailabilityQuery {
    pub class_ids: String,
}

impl AvailabilityQuery {
    /// 解析并去重班级 ID，保持升序
    pub fn parse_ids(&self) -> Result<Vec<i64>, String> {
        let mut ids = self
            .class_ids
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<i64>()
                    .ok()
                    .filter(|id| *id > 0)
                    .ok_or_else(|| format!("Invalid class id: {s}"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Err("At least one class id is required".to_string());
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_availability_ids() {
        let query = AvailabilityQuery {
            class_ids: "3, 1,3,,2".to_string(),
        };
        assert_eq!(query.parse_ids().unwrap(), vec![1, 2, 3]);

        let bad = AvailabilityQuery {
            class_ids: "1,abc".to_string(),
        };
        assert!(bad.parse_ids().is_err());

        let empty = AvailabilityQuery {
            class_ids: " , ".to_string(),
        };
        assert!(empty.parse_ids().is_err());
    }

    #[test]
    fn test_slot_cell_accepts_local_day_name() {
        let cell: SlotCell =
            serde_json::from_str(r#"{"day":"Cuma","hour":"13:35-14:20"}"#).unwrap();
        assert_eq!(cell.day, Weekday::Friday);
        assert_eq!(cell.hour.label(), "13:35-14:20");
    }
}
