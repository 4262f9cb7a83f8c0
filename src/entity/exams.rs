//! 考试实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "exams")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub class_id: i64,
    pub exam_name: String,
    pub classroom: String,
    pub exam_date: String,
    pub exam_time: String,
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
    #[sea_orm(has_many = "super::exam_seating::Entity")]
    ExamSeating,
}

impl Related<super::classes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl Related<super::exam_seating::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExamSeating.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_exam(self) -> crate::models::exams::entities::Exam {
        use crate::models::exams::entities::Exam;
        use chrono::{DateTime, Utc};

        Exam {
            id: self.id,
            class_id: self.class_id,
            exam_name: self.exam_name,
            classroom: self.classroom,
            exam_date: self.exam_date,
            exam_time: self.exam_time,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
        }
    }
}
