//! 学生照片实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "student_photos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: i64,
    pub photo_type: String,
    pub photo_path: String,
    // 由识别服务写入
    #[sea_orm(column_type = "Text", nullable)]
    pub encoding_data: Option<String>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::students::Entity",
        from = "Column::StudentId",
        to = "super::students::Column::Id"
    )]
    Student,
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_student_photo(self) -> crate::models::students::entities::StudentPhoto {
        use crate::models::students::entities::{PhotoType, StudentPhoto};
        use chrono::{DateTime, Utc};

        StudentPhoto {
            id: self.id,
            student_id: self.student_id,
            photo_type: self
                .photo_type
                .parse::<PhotoType>()
                .unwrap_or(PhotoType::Front),
            photo_path: self.photo_path,
            has_encoding: self.encoding_data.is_some(),
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
        }
    }
}
