//! 点名记录实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "attendances")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub class_id: i64,
    pub teacher_id: i64,
    pub attendance_date: String,
    pub attendance_time: String,
    pub duration_minutes: i32,
    pub total_students: i32,
    pub present_count: i32,
    pub absent_count: i32,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::classes::Entity",
        from = "Column::ClassId",
        to = "super::classes::Column::Id"
    )]
    Class,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::TeacherId",
        to = "super::users::Column::Id"
    )]
    Teacher,
    #[sea_orm(has_many = "super::attendance_details::Entity")]
    AttendanceDetails,
}

impl Related<super::classes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl Related<super::attendance_details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttendanceDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_attendance(self) -> crate::models::attendances::entities::Attendance {
        use crate::models::attendances::entities::Attendance;
        use chrono::{DateTime, Utc};

        Attendance {
            id: self.id,
            class_id: self.class_id,
            teacher_id: self.teacher_id,
            attendance_date: self.attendance_date,
            attendance_time: self.attendance_time,
            duration_minutes: self.duration_minutes,
            total_students: self.total_students,
            present_count: self.present_count,
            absent_count: self.absent_count,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
        }
    }
}
