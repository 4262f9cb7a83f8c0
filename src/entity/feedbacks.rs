//! 反馈实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "feedbacks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub teacher_id: i64,
    pub subject: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub feedback_type: String,
    pub is_read: bool,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::TeacherId",
        to = "super::users::Column::Id"
    )]
    Teacher,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_feedback(self) -> crate::models::feedbacks::entities::Feedback {
        use crate::models::feedbacks::entities::{Feedback, FeedbackType};
        use chrono::{DateTime, Utc};

        Feedback {
            id: self.id,
            teacher_id: self.teacher_id,
            subject: self.subject,
            message: self.message,
            feedback_type: self
                .feedback_type
                .parse::<FeedbackType>()
                .unwrap_or_default(),
            is_read: self.is_read,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
        }
    }
}
