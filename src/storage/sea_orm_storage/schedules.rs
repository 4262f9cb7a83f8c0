//! 课表存储操作
//!
//! 所有修改都在事务内重新读取课表，校验后整体写回。

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info};

use super::SeaOrmStorage;
use crate::entity::classes::{Column, Entity as Classes, Model as ClassModel};
use crate::errors::{AttendifyError, Result};
use crate::models::classes::{
    requests::ScheduleOptions,
    schedule::{
        HourSlot, ScheduleError, ScheduleOutcome, SlotKind, Weekday, WeeklySchedule, book_makeup,
    },
};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, TransactionTrait};

/// 课表规则校验失败时直接返回，事务随之回滚
macro_rules! try_schedule {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(e) => return Ok(Err(e)),
        }
    };
}

/// 读取启用班级及其课表
async fn load_schedule<C: ConnectionTrait>(
    db: &C,
    class_id: i64,
    strict: bool,
) -> ScheduleOutcome<(ClassModel, WeeklySchedule)> {
    let model = Classes::find_by_id(class_id)
        .filter(Column::IsActive.eq(true))
        .one(db)
        .await
        .map_err(|e| AttendifyError::database_operation(format!("查询班级失败: {e}")))?;

    let Some(model) = model else {
        return Ok(Err(ScheduleError::UnknownClass(class_id)));
    };
    let schedule = try_schedule!(model.schedule(strict));
    Ok(Ok((model, schedule)))
}

/// 写回课表
async fn store_schedule<C: ConnectionTrait>(
    db: &C,
    class_id: i64,
    schedule: &WeeklySchedule,
) -> Result<()> {
    let now = chrono::Utc::now().timestamp();
    Classes::update_many()
        .col_expr(
            Column::WeeklySchedule,
            sea_orm::sea_query::Expr::value(schedule.to_json()?),
        )
        .col_expr(Column::UpdatedAt, sea_orm::sea_query::Expr::value(now))
        .filter(Column::Id.eq(class_id))
        .exec(db)
        .await
        .map_err(|e| AttendifyError::database_operation(format!("更新课表失败: {e}")))?;
    Ok(())
}

impl SeaOrmStorage {
    /// 清理过期补课时段
    ///
    /// 无法解析的课表跳过；写回时以原始内容为条件，期间被修改过的班级留到下次清理。
    pub async fn prune_expired_makeups_impl(
        &self,
        now: DateTime<Utc>,
        makeup_ttl: TimeDelta,
    ) -> Result<usize> {
        let models = Classes::find()
            .filter(Column::WeeklySchedule.is_not_null())
            .all(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询课表失败: {e}")))?;

        let mut changed_classes = 0;
        for model in models {
            let schedule = match WeeklySchedule::parse(model.weekly_schedule.as_deref()) {
                Ok(schedule) => schedule,
                Err(e) => {
                    debug!("Skipping class {} during makeup cleanup: {}", model.id, e);
                    continue;
                }
            };

            let (pruned, changed) = schedule.prune_expired(now, makeup_ttl);
            if !changed {
                continue;
            }

            let result = Classes::update_many()
                .col_expr(
                    Column::WeeklySchedule,
                    sea_orm::sea_query::Expr::value(pruned.to_json()?),
                )
                .filter(Column::Id.eq(model.id))
                .filter(Column::WeeklySchedule.eq(model.weekly_schedule.clone()))
                .exec(&self.db)
                .await
                .map_err(|e| AttendifyError::database_operation(format!("清理补课失败: {e}")))?;

            if result.rows_affected > 0 {
                changed_classes += 1;
            }
        }

        if changed_classes > 0 {
            info!("Removed expired makeup slots from {} classes", changed_classes);
        }
        Ok(changed_classes)
    }

    /// 读取多个班级的课表
    pub async fn get_class_schedules_impl(
        &self,
        class_ids: &[i64],
        strict: bool,
    ) -> ScheduleOutcome<Vec<(i64, WeeklySchedule)>> {
        let mut schedules = Vec::with_capacity(class_ids.len());
        for class_id in class_ids {
            let (_, schedule) = try_schedule!(load_schedule(&self.db, *class_id, strict).await?);
            schedules.push((*class_id, schedule));
        }
        Ok(Ok(schedules))
    }

    /// 添加常规时段
    pub async fn add_class_slot_impl(
        &self,
        class_id: i64,
        day: Weekday,
        hour: HourSlot,
        options: ScheduleOptions,
    ) -> ScheduleOutcome<WeeklySchedule> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("开启事务失败: {e}")))?;

        let (_, schedule) = try_schedule!(load_schedule(&txn, class_id, options.strict).await?);
        // 与补课预约一致，过期补课不再占用时段
        let (mut schedule, _) = schedule.prune_expired(Utc::now(), options.makeup_ttl);
        try_schedule!(schedule.add_slot(day, hour, SlotKind::Normal).map(|_| ()));
        store_schedule(&txn, class_id, &schedule).await?;

        txn.commit()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(Ok(schedule))
    }

    /// 删除时段（常规或补课）
    pub async fn remove_class_slot_impl(
        &self,
        class_id: i64,
        day: Weekday,
        hour: HourSlot,
        options: ScheduleOptions,
    ) -> ScheduleOutcome<WeeklySchedule> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("开启事务失败: {e}")))?;

        let (_, mut schedule) = try_schedule!(load_schedule(&txn, class_id, options.strict).await?);
        if schedule.remove_slot(day, hour).is_none() {
            return Ok(Err(ScheduleError::SlotNotFound { day, hour }));
        }
        store_schedule(&txn, class_id, &schedule).await?;

        txn.commit()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(Ok(schedule))
    }

    /// 多班级补课预约，任一时段冲突则全部不写入
    pub async fn book_makeup_slots_impl(
        &self,
        class_ids: &[i64],
        cells: &[(Weekday, HourSlot)],
        now: DateTime<Utc>,
        options: ScheduleOptions,
    ) -> ScheduleOutcome<Vec<(i64, WeeklySchedule)>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("开启事务失败: {e}")))?;

        let mut schedules = Vec::with_capacity(class_ids.len());
        for class_id in class_ids {
            let (_, schedule) =
                try_schedule!(load_schedule(&txn, *class_id, options.strict).await?);
            // 过期补课不再占用时段
            let (schedule, _) = schedule.prune_expired(now, options.makeup_ttl);
            schedules.push((*class_id, schedule));
        }

        try_schedule!(book_makeup(&mut schedules, cells, now));

        for (class_id, schedule) in &schedules {
            store_schedule(&txn, *class_id, schedule).await?;
        }

        txn.commit()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(Ok(schedules))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::setup_test_storage;
    use super::super::SeaOrmStorage;
    use crate::entity::classes::{ActiveModel, Entity as Classes};
    use crate::models::classes::{
        requests::{NewClass, ScheduleOptions},
        schedule::{HourSlot, ScheduleError, SlotKind, Weekday, WeeklySchedule},
    };
    use chrono::{TimeDelta, TimeZone, Utc};
    use sea_orm::{ActiveModelTrait, EntityTrait, Set};

    fn hour(label: &str) -> HourSlot {
        label.parse().unwrap()
    }

    async fn class_with(storage: &SeaOrmStorage, code: &str, schedule: WeeklySchedule) -> i64 {
        storage
            .create_class_impl(NewClass {
                class_name: code.to_string(),
                class_code: code.to_string(),
                description: None,
                max_absences: 3,
                schedule,
            })
            .await
            .unwrap()
            .id
    }

    fn options(strict: bool) -> ScheduleOptions {
        ScheduleOptions {
            makeup_ttl: TimeDelta::days(7),
            strict,
        }
    }

    #[tokio::test]
    async fn test_add_slot_conflict_and_remove() {
        let storage = setup_test_storage().await;
        let id = class_with(&storage, "MAT", WeeklySchedule::new()).await;

        let schedule = storage
            .add_class_slot_impl(id, Weekday::Monday, hour("09:00-09:45"), options(false))
            .await
            .unwrap()
            .unwrap();
        assert!(schedule.is_occupied(Weekday::Monday, hour("09:00-09:45")));

        let conflict = storage
            .add_class_slot_impl(id, Weekday::Monday, hour("09:00-09:45"), options(false))
            .await
            .unwrap();
        assert!(matches!(conflict, Err(ScheduleError::Occupied { .. })));

        let removed = storage
            .remove_class_slot_impl(id, Weekday::Monday, hour("09:00-09:45"), options(false))
            .await
            .unwrap()
            .unwrap();
        assert!(removed.is_empty());

        let missing = storage
            .remove_class_slot_impl(id, Weekday::Monday, hour("09:00-09:45"), options(false))
            .await
            .unwrap();
        assert!(matches!(missing, Err(ScheduleError::SlotNotFound { .. })));
    }

    #[tokio::test]
    async fn test_book_makeup_across_classes() {
        let storage = setup_test_storage().await;
        let mut busy = WeeklySchedule::new();
        busy.add_slot(Weekday::Thursday, hour("13:35-14:20"), SlotKind::Normal)
            .unwrap();
        let a = class_with(&storage, "A", WeeklySchedule::new()).await;
        let b = class_with(&storage, "B", busy).await;
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();

        let rejected = storage
            .book_makeup_slots_impl(
                &[a, b],
                &[
                    (Weekday::Thursday, hour("13:35-14:20")),
                    (Weekday::Friday, hour("09:00-09:45")),
                ],
                now,
                options(false),
            )
            .await
            .unwrap();
        match rejected {
            Err(ScheduleError::Conflicts(conflicts)) => {
                assert_eq!(conflicts.len(), 1);
                assert_eq!(conflicts[0].class_id, b);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        // 拒绝时不写入任何班级
        let a_class = storage.get_class_by_id_impl(a).await.unwrap().unwrap();
        assert!(a_class.schedule.is_empty());

        let booked = storage
            .book_makeup_slots_impl(
                &[a, b],
                &[(Weekday::Friday, hour("09:00-09:45"))],
                now,
                options(false),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(booked.len(), 2);
        for id in [a, b] {
            let class = storage.get_class_by_id_impl(id).await.unwrap().unwrap();
            let slot = class
                .schedule
                .get(Weekday::Friday, hour("09:00-09:45"))
                .unwrap();
            assert_eq!(slot.kind, SlotKind::Makeup { created_at: now });
        }
    }

    #[tokio::test]
    async fn test_unknown_class_rejected() {
        let storage = setup_test_storage().await;
        let outcome = storage
            .book_makeup_slots_impl(
                &[42],
                &[(Weekday::Monday, hour("09:00-09:45"))],
                Utc::now(),
                options(false),
            )
            .await
            .unwrap();
        assert_eq!(outcome, Err(ScheduleError::UnknownClass(42)));
    }

    #[tokio::test]
    async fn test_prune_expired_makeups() {
        let storage = setup_test_storage().await;
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let mut schedule = WeeklySchedule::new();
        schedule
            .add_slot(Weekday::Monday, hour("09:00-09:45"), SlotKind::Normal)
            .unwrap();
        schedule
            .add_slot(
                Weekday::Tuesday,
                hour("09:00-09:45"),
                SlotKind::Makeup {
                    created_at: now - TimeDelta::days(7) - TimeDelta::seconds(1),
                },
            )
            .unwrap();
        schedule
            .add_slot(
                Weekday::Wednesday,
                hour("09:00-09:45"),
                SlotKind::Makeup {
                    created_at: now - TimeDelta::days(6),
                },
            )
            .unwrap();
        let id = class_with(&storage, "PRN", schedule).await;

        let changed = storage
            .prune_expired_makeups_impl(now, TimeDelta::days(7))
            .await
            .unwrap();
        assert_eq!(changed, 1);

        let class = storage.get_class_by_id_impl(id).await.unwrap().unwrap();
        assert_eq!(class.schedule.len(), 2);
        assert!(!class.schedule.is_occupied(Weekday::Tuesday, hour("09:00-09:45")));

        let again = storage
            .prune_expired_makeups_impl(now, TimeDelta::days(7))
            .await
            .unwrap();
        assert_eq!(again, 0);
    }

    #[tokio::test]
    async fn test_expired_makeup_does_not_block_normal_slot() {
        let storage = setup_test_storage().await;
        let mut schedule = WeeklySchedule::new();
        schedule
            .add_slot(
                Weekday::Monday,
                hour("09:00-09:45"),
                SlotKind::Makeup {
                    created_at: Utc::now() - TimeDelta::days(8),
                },
            )
            .unwrap();
        let id = class_with(&storage, "EXP", schedule).await;

        let schedule = storage
            .add_class_slot_impl(id, Weekday::Monday, hour("09:00-09:45"), options(false))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(schedule.len(), 1);
        assert_eq!(
            schedule.get(Weekday::Monday, hour("09:00-09:45")).unwrap().kind,
            SlotKind::Normal
        );
    }

    #[tokio::test]
    async fn test_unreadable_record_keeps_other_slots() {
        let storage = setup_test_storage().await;
        let id = class_with(&storage, "MIX", WeeklySchedule::new()).await;
        let model = Classes::find_by_id(id)
            .one(&storage.db)
            .await
            .unwrap()
            .unwrap();
        let mut active: ActiveModel = model.into();
        active.weekly_schedule = Set(Some(
            r#"[{"day":"Pazartesi","hour":"09:00-09:45"},{"hour":"08:00-08:45"}]"#.to_string(),
        ));
        active.update(&storage.db).await.unwrap();

        let schedule = storage
            .add_class_slot_impl(id, Weekday::Tuesday, hour("09:00-09:45"), options(false))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(schedule.len(), 2);
        assert!(schedule.is_occupied(Weekday::Monday, hour("09:00-09:45")));

        let stored = Classes::find_by_id(id)
            .one(&storage.db)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.weekly_schedule.unwrap().contains("Pazartesi"));
    }

    #[tokio::test]
    async fn test_corrupted_schedule_policies() {
        let storage = setup_test_storage().await;
        let id = class_with(&storage, "BAD", WeeklySchedule::new()).await;
        let model = Classes::find_by_id(id)
            .one(&storage.db)
            .await
            .unwrap()
            .unwrap();
        let mut active: ActiveModel = model.into();
        active.weekly_schedule = Set(Some("{not json".to_string()));
        active.update(&storage.db).await.unwrap();

        let strict = storage
            .add_class_slot_impl(id, Weekday::Monday, hour("09:00-09:45"), options(true))
            .await
            .unwrap();
        assert!(matches!(strict, Err(ScheduleError::Corrupted(_))));

        // 清理跳过无法解析的课表
        assert_eq!(
            storage
                .prune_expired_makeups_impl(Utc::now(), TimeDelta::days(7))
                .await
                .unwrap(),
            0
        );

        let lenient = storage
            .add_class_slot_impl(id, Weekday::Monday, hour("09:00-09:45"), options(false))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(lenient.len(), 1);
    }
}
