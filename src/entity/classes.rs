//! 班级实体

use sea_orm::entity::prelude::*;

use crate::models::classes::schedule::{ScheduleError, WeeklySchedule};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "classes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub class_name: String,
    #[sea_orm(unique)]
    pub class_code: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub max_absences: i32,
    // JSON 格式的周课表
    #[sea_orm(column_type = "Text", nullable)]
    pub weekly_schedule: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::student_classes::Entity")]
    StudentClasses,
    #[sea_orm(has_many = "super::teacher_classes::Entity")]
    TeacherClasses,
    #[sea_orm(has_many = "super::attendances::Entity")]
    Attendances,
    #[sea_orm(has_many = "super::exams::Entity")]
    Exams,
}

impl Related<super::student_classes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudentClasses.def()
    }
}

impl Related<super::teacher_classes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TeacherClasses.def()
    }
}

impl Related<super::attendances::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attendances.def()
    }
}

impl Related<super::exams::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Exams.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 按解析策略读取课表列
    pub fn schedule(&self, strict: bool) -> Result<WeeklySchedule, ScheduleError> {
        WeeklySchedule::load(self.weekly_schedule.as_deref(), self.id, strict)
    }

    /// 转换为业务模型，课表解析失败时按空课表处理
    ///
    /// 只读路径不重复告警，损坏的课表在修改时才记录。
    pub fn into_class(self) -> crate::models::classes::entities::Class {
        let schedule = match WeeklySchedule::parse(self.weekly_schedule.as_deref()) {
            Ok(schedule) => schedule,
            Err(e) => {
                tracing::debug!("Class {} schedule unreadable on read: {}", self.id, e);
                WeeklySchedule::new()
            }
        };
        self.into_class_with(schedule)
    }

    pub fn into_class_with(self, schedule: WeeklySchedule) -> crate::models::classes::entities::Class {
        use crate::models::classes::entities::Class;
        use chrono::{DateTime, Utc};

        Class {
            id: self.id,
            class_name: self.class_name,
            class_code: self.class_code,
            description: self.description,
            max_absences: self.max_absences,
            schedule,
            is_active: self.is_active,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }

    pub fn into_class_brief(self) -> crate::models::users::entities::ClassBrief {
        crate::models::users::entities::ClassBrief {
            id: self.id,
            class_name: self.class_name,
            class_code: self.class_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(raw: &str) -> Model {
        Model {
            id: 1,
            class_name: "Chemistry".into(),
            class_code: "CHE".into(),
            description: None,
            max_absences: 3,
            weekly_schedule: Some(raw.into()),
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_into_class_reads_leniently() {
        assert!(model("{not json").into_class().schedule.is_empty());

        let class = model(r#"[{"day":"Perşembe","hour":"09:00-09:45"},{"day":"?"}]"#).into_class();
        assert_eq!(class.schedule.len(), 1);
    }
}
