//! 每日系统统计实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "system_stats")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    // YYYY-MM-DD
    #[sea_orm(unique)]
    pub stat_date: String,
    pub daily_logins: i32,
    pub ai_usage_count: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
