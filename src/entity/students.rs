//! 学生实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub student_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::student_photos::Entity")]
    StudentPhotos,
    #[sea_orm(has_many = "super::student_classes::Entity")]
    StudentClasses,
    #[sea_orm(has_many = "super::exam_seating::Entity")]
    ExamSeating,
}

impl Related<super::student_photos::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudentPhotos.def()
    }
}

impl Related<super::student_classes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudentClasses.def()
    }
}

impl Related<super::exam_seating::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExamSeating.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_student(self) -> crate::models::students::entities::Student {
        use crate::models::students::entities::Student;
        use chrono::{DateTime, Utc};

        Student {
            id: self.id,
            student_number: self.student_number,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            birth_date: self.birth_date,
            is_active: self.is_active,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
