use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use ts_rs::TS;

use super::schedule::{HourSlot, SlotKind, Weekday, WeeklySchedule};

/// 缺勤上限默认值
pub const DEFAULT_MAX_ABSENCES: i32 = 3;

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct Class {
    // 班级ID
    pub id: i64,
    // 班级名称
    pub class_name: String,
    // 班级代码（唯一）
    pub class_code: String,
    // 班级描述
    pub description: Option<String>,
    // 缺勤上限
    pub max_absences: i32,
    // 周课表
    #[ts(type = "Array<SlotRecord>")]
    pub schedule: WeeklySchedule,
    pub is_active: bool,
    // 创建时间
    pub created_at: DateTime<Utc>,
    // 更新时间
    pub updated_at: DateTime<Utc>,
}

impl Class {
    /// 课表中补课时段的剩余有效期
    pub fn makeup_lifetimes(&self, now: DateTime<Utc>, ttl: TimeDelta) -> Vec<MakeupLifetime> {
        MakeupLifetime::for_schedule(&self.schedule, now, ttl)
    }
}

// 补课时段剩余有效期
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct MakeupLifetime {
    #[ts(type = "string")]
    pub day: Weekday,
    #[ts(type = "string")]
    pub hour: HourSlot,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub remaining_hours: i64,
}

impl MakeupLifetime {
    pub fn for_schedule(
        schedule: &WeeklySchedule,
        now: DateTime<Utc>,
        ttl: TimeDelta,
    ) -> Vec<MakeupLifetime> {
        schedule
            .slots()
            .iter()
            .filter_map(|slot| match slot.kind {
                SlotKind::Makeup { created_at } => {
                    let expires_at = created_at + ttl;
                    Some(MakeupLifetime {
                        day: slot.day,
                        hour: slot.hour,
                        created_at,
                        expires_at,
                        remaining_hours: (expires_at - now).num_hours().max(0),
                    })
                }
                SlotKind::Normal => None,
            })
            .collect()
    }
}

// 班级负责教师摘要
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct TeacherBrief {
    pub id: i64,
    pub full_name: String,
    pub email: String,
}

// 班级中的学生及其缺勤情况
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct ClassStudent {
    pub student_id: i64,
    pub student_number: String,
    pub first_name: String,
    pub last_name: String,
    pub absences_count: i32,
    pub remaining_absences: i32,
}

// 班级列表项
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct ClassSummary {
    #[serde(flatten)]
    #[ts(flatten)]
    pub class: Class,
    pub student_count: i64,
    pub teacher_count: i64,
    pub teachers: Vec<TeacherBrief>,
    pub makeup_slots: Vec<MakeupLifetime>,
}

// 班级详情
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct ClassDetail {
    #[serde(flatten)]
    #[ts(flatten)]
    pub class: Class,
    pub teachers: Vec<TeacherBrief>,
    pub students: Vec<ClassStudent>,
    pub makeup_slots: Vec<MakeupLifetime>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_makeup_lifetimes() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let mut schedule = WeeklySchedule::new();
        let hour: HourSlot = "09:00-09:45".parse().unwrap();
        schedule
            .add_slot(Weekday::Monday, hour, SlotKind::Normal)
            .unwrap();
        schedule
            .add_slot(
                Weekday::Tuesday,
                hour,
                SlotKind::Makeup {
                    created_at: now - TimeDelta::days(2),
                },
            )
            .unwrap();

        let class = Class {
            id: 1,
            class_name: "Math".into(),
            class_code: "MAT101".into(),
            description: None,
            max_absences: DEFAULT_MAX_ABSENCES,
            schedule,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let lifetimes = class.makeup_lifetimes(now, TimeDelta::days(7));
        assert_eq!(lifetimes.len(), 1);
        assert_eq!(lifetimes[0].day, Weekday::Tuesday);
        assert_eq!(lifetimes[0].remaining_hours, 5 * 24);
    }

    #[test]
    fn test_class_serializes_schedule_records() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let mut schedule = WeeklySchedule::new();
        schedule
            .add_slot(
                Weekday::Friday,
                "10:50-11:35".parse().unwrap(),
                SlotKind::Normal,
            )
            .unwrap();
        let class = Class {
            id: 2,
            class_name: "Physics".into(),
            class_code: "PHY101".into(),
            description: Some("Intro".into()),
            max_absences: 4,
            schedule,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&class).unwrap();
        assert_eq!(json["schedule"][0]["day"], "Cuma");
        assert_eq!(json["schedule"][0]["hour"], "10:50-11:35");
        assert!(json["schedule"][0].get("type").is_none());
    }
}
