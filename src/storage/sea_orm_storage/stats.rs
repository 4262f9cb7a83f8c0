//! 每日统计与仪表盘

use chrono::{NaiveDate, TimeDelta};
use sea_orm::ExprTrait;

use super::SeaOrmStorage;
use crate::entity::classes::{Column as ClassColumn, Entity as Classes};
use crate::entity::students::{Column as StudentColumn, Entity as Students};
use crate::entity::system_stats::{ActiveModel, Column, Entity as SystemStats};
use crate::entity::users::{Column as UserColumn, Entity as Users};
use crate::errors::{AttendifyError, Result};
use crate::models::dashboard::responses::{DashboardResponse, LoginStats};
use crate::models::users::entities::UserRole;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};

/// 仪表盘展示的未读反馈条数
const DASHBOARD_FEEDBACK_LIMIT: u64 = 10;

#[derive(Clone, Copy)]
enum Counter {
    Logins,
    AiUsage,
}

impl Counter {
    fn column(self) -> Column {
        match self {
            Counter::Logins => Column::DailyLogins,
            Counter::AiUsage => Column::AiUsageCount,
        }
    }
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

impl SeaOrmStorage {
    /// 当日计数加一，当天没有记录时新建
    async fn bump_counter(&self, date: NaiveDate, counter: Counter) -> Result<()> {
        let key = date_key(date);
        let updated = SystemStats::update_many()
            .col_expr(counter.column(), Expr::col(counter.column()).add(1))
            .filter(Column::StatDate.eq(key.clone()))
            .exec(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("更新统计失败: {e}")))?;
        if updated.rows_affected > 0 {
            return Ok(());
        }

        let (logins, ai_usage) = match counter {
            Counter::Logins => (1, 0),
            Counter::AiUsage => (0, 1),
        };
        let inserted = ActiveModel {
            stat_date: Set(key.clone()),
            daily_logins: Set(logins),
            ai_usage_count: Set(ai_usage),
            ..Default::default()
        }
        .insert(&self.db)
        .await;

        match inserted {
            Ok(_) => Ok(()),
            // 并发插入撞上唯一约束时退回到更新
            Err(_) => {
                SystemStats::update_many()
                    .col_expr(counter.column(), Expr::col(counter.column()).add(1))
                    .filter(Column::StatDate.eq(key))
                    .exec(&self.db)
                    .await
                    .map_err(|e| AttendifyError::database_operation(format!("更新统计失败: {e}")))?;
                Ok(())
            }
        }
    }

    pub async fn record_login_impl(&self, date: NaiveDate) -> Result<()> {
        self.bump_counter(date, Counter::Logins).await
    }

    pub async fn increment_ai_usage_impl(&self, date: NaiveDate) -> Result<()> {
        self.bump_counter(date, Counter::AiUsage).await
    }

    /// 管理员仪表盘汇总
    pub async fn get_dashboard_impl(&self, today: NaiveDate) -> Result<DashboardResponse> {
        let window_start = today - TimeDelta::days(29);
        let week_start = today - TimeDelta::days(6);
        let rows = SystemStats::find()
            .filter(Column::StatDate.gte(date_key(window_start)))
            .filter(Column::StatDate.lte(date_key(today)))
            .all(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询统计失败: {e}")))?;

        let today_key = date_key(today);
        let week_key = date_key(week_start);
        let mut logins = LoginStats::default();
        let mut ai_usage_30_days = 0;
        for row in &rows {
            let count = i64::from(row.daily_logins);
            if row.stat_date == today_key {
                logins.today += count;
            }
            if row.stat_date >= week_key {
                logins.last_7_days += count;
            }
            logins.last_30_days += count;
            ai_usage_30_days += i64::from(row.ai_usage_count);
        }

        let teacher_count = Users::find()
            .filter(UserColumn::Role.eq(UserRole::TEACHER))
            .filter(UserColumn::IsActive.eq(true))
            .count(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("统计教师失败: {e}")))?;
        let student_count = Students::find()
            .filter(StudentColumn::IsActive.eq(true))
            .count(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("统计学生失败: {e}")))?;
        let class_count = Classes::find()
            .filter(ClassColumn::IsActive.eq(true))
            .count(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("统计班级失败: {e}")))?;

        let unread_feedbacks = self
            .list_unread_feedbacks_impl(Some(DASHBOARD_FEEDBACK_LIMIT))
            .await?;

        Ok(DashboardResponse {
            logins,
            ai_usage_30_days,
            teacher_count: teacher_count as i64,
            student_count: student_count as i64,
            class_count: class_count as i64,
            unread_feedbacks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::students::tests::seed_class_with_students;
    use super::super::test_support::setup_test_storage;
    use chrono::{NaiveDate, TimeDelta};

    #[tokio::test]
    async fn test_dashboard_windows() {
        let storage = setup_test_storage().await;
        let today = NaiveDate::from_ymd_opt(2025, 5, 31).unwrap();

        storage.record_login_impl(today).await.unwrap();
        storage.record_login_impl(today).await.unwrap();
        storage
            .record_login_impl(today - TimeDelta::days(6))
            .await
            .unwrap();
        storage
            .record_login_impl(today - TimeDelta::days(20))
            .await
            .unwrap();
        storage
            .record_login_impl(today - TimeDelta::days(30))
            .await
            .unwrap();
        storage.increment_ai_usage_impl(today).await.unwrap();
        storage
            .increment_ai_usage_impl(today - TimeDelta::days(3))
            .await
            .unwrap();

        seed_class_with_students(&storage, "DSH", 2).await;

        let dashboard = storage.get_dashboard_impl(today).await.unwrap();
        assert_eq!(dashboard.logins.today, 2);
        assert_eq!(dashboard.logins.last_7_days, 3);
        assert_eq!(dashboard.logins.last_30_days, 4);
        assert_eq!(dashboard.ai_usage_30_days, 2);
        assert_eq!(dashboard.student_count, 2);
        assert_eq!(dashboard.class_count, 1);
        assert_eq!(dashboard.teacher_count, 0);
        assert!(dashboard.unread_feedbacks.is_empty());
    }
}
