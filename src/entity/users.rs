//! 用户实体（管理员与教师）

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub last_login: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::teacher_classes::Entity")]
    TeacherClasses,
    #[sea_orm(has_many = "super::attendances::Entity")]
    Attendances,
    #[sea_orm(has_many = "super::feedbacks::Entity")]
    Feedbacks,
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

impl Related<super::feedbacks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Feedbacks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_user(self) -> crate::models::users::entities::User {
        use crate::models::users::entities::{User, UserRole};
        use chrono::{DateTime, Utc};

        User {
            id: self.id,
            username: self.username,
            password_hash: self.password_hash,
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            birth_date: self.birth_date,
            role: self.role.parse::<UserRole>().unwrap_or(UserRole::Teacher),
            is_active: self.is_active,
            last_login: self
                .last_login
                .map(|ts| DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()),
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }

    pub fn into_teacher_brief(self) -> crate::models::classes::entities::TeacherBrief {
        crate::models::classes::entities::TeacherBrief {
            id: self.id,
            full_name: self.full_name,
            email: self.email,
        }
    }
}
