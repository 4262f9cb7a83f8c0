//! 班级存储操作

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};

use super::SeaOrmStorage;
use crate::entity::classes::{ActiveModel, Column, Entity as Classes, Model as ClassModel};
use crate::entity::student_classes::{Column as StudentClassColumn, Entity as StudentClasses};
use crate::entity::students::{Column as StudentColumn, Entity as Students};
use crate::entity::teacher_classes::{Column as TeacherClassColumn, Entity as TeacherClasses};
use crate::entity::users::{Column as UserColumn, Entity as Users};
use crate::errors::{AttendifyError, Result};
use crate::models::{
    PaginationInfo,
    classes::{
        entities::{Class, ClassDetail, ClassStudent, ClassSummary, TeacherBrief},
        requests::{ClassListQuery, ClassUpdate, NewClass},
        responses::ClassListResponse,
    },
    common::pagination::normalize_pagination,
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

/// 班级中的启用学生，按名字排序
pub(super) async fn load_class_students<C: ConnectionTrait>(
    db: &C,
    class_id: i64,
    max_absences: i32,
) -> Result<Vec<ClassStudent>> {
    let rows = StudentClasses::find()
        .filter(StudentClassColumn::ClassId.eq(class_id))
        .find_also_related(Students)
        .filter(StudentColumn::IsActive.eq(true))
        .order_by_asc(StudentColumn::FirstName)
        .order_by_asc(StudentColumn::LastName)
        .all(db)
        .await
        .map_err(|e| AttendifyError::database_operation(format!("查询班级学生失败: {e}")))?;

    Ok(rows
        .into_iter()
        .filter_map(|(enrollment, student)| {
            student.map(|s| ClassStudent {
                student_id: s.id,
                student_number: s.student_number,
                first_name: s.first_name,
                last_name: s.last_name,
                absences_count: enrollment.absences_count,
                remaining_absences: max_absences - enrollment.absences_count,
            })
        })
        .collect())
}

/// 各班级的启用学生数
async fn load_student_counts<C: ConnectionTrait>(
    db: &C,
    class_ids: &[i64],
) -> Result<HashMap<i64, i64>> {
    let mut counts = HashMap::new();
    if class_ids.is_empty() {
        return Ok(counts);
    }

    let rows = StudentClasses::find()
        .filter(StudentClassColumn::ClassId.is_in(class_ids.iter().copied()))
        .find_also_related(Students)
        .filter(StudentColumn::IsActive.eq(true))
        .all(db)
        .await
        .map_err(|e| AttendifyError::database_operation(format!("统计班级学生失败: {e}")))?;

    for (enrollment, student) in rows {
        if student.is_some() {
            *counts.entry(enrollment.class_id).or_insert(0) += 1;
        }
    }
    Ok(counts)
}

/// 各班级的启用教师
pub(super) async fn load_class_teachers<C: ConnectionTrait>(
    db: &C,
    class_ids: &[i64],
) -> Result<HashMap<i64, Vec<TeacherBrief>>> {
    let mut map: HashMap<i64, Vec<TeacherBrief>> = HashMap::new();
    if class_ids.is_empty() {
        return Ok(map);
    }

    let rows = TeacherClasses::find()
        .filter(TeacherClassColumn::ClassId.is_in(class_ids.iter().copied()))
        .find_also_related(Users)
        .filter(UserColumn::IsActive.eq(true))
        .order_by_asc(UserColumn::FullName)
        .all(db)
        .await
        .map_err(|e| AttendifyError::database_operation(format!("查询班级教师失败: {e}")))?;

    for (assignment, teacher) in rows {
        if let Some(teacher) = teacher {
            map.entry(assignment.class_id)
                .or_default()
                .push(teacher.into_teacher_brief());
        }
    }
    Ok(map)
}

impl SeaOrmStorage {
    /// 创建班级
    pub async fn create_class_impl(&self, req: NewClass) -> Result<Class> {
        let now = chrono::Utc::now().timestamp();
        let schedule_json = req.schedule.to_json()?;

        let model = ActiveModel {
            class_name: Set(req.class_name),
            class_code: Set(req.class_code),
            description: Set(req.description),
            max_absences: Set(req.max_absences),
            weekly_schedule: Set(Some(schedule_json)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("创建班级失败: {e}")))?;

        Ok(result.into_class_with(req.schedule))
    }

    /// 通过 ID 获取班级
    pub async fn get_class_by_id_impl(&self, class_id: i64) -> Result<Option<Class>> {
        let result = Classes::find_by_id(class_id)
            .one(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询班级失败: {e}")))?;

        Ok(result.map(|m| m.into_class()))
    }

    /// 通过班级代码获取班级
    pub async fn get_class_by_code_impl(&self, class_code: &str) -> Result<Option<Class>> {
        let result = Classes::find()
            .filter(Column::ClassCode.eq(class_code))
            .one(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询班级失败: {e}")))?;

        Ok(result.map(|m| m.into_class()))
    }

    /// 班级详情（教师与学生）
    pub async fn get_class_detail_impl(
        &self,
        class_id: i64,
        now: DateTime<Utc>,
        makeup_ttl: TimeDelta,
    ) -> Result<Option<ClassDetail>> {
        let Some(model) = Classes::find_by_id(class_id)
            .one(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询班级失败: {e}")))?
        else {
            return Ok(None);
        };

        Ok(Some(self.build_class_detail(model, now, makeup_ttl).await?))
    }

    pub(super) async fn build_class_detail(
        &self,
        model: ClassModel,
        now: DateTime<Utc>,
        makeup_ttl: TimeDelta,
    ) -> Result<ClassDetail> {
        let students = load_class_students(&self.db, model.id, model.max_absences).await?;
        let mut teachers = load_class_teachers(&self.db, &[model.id]).await?;
        let class = model.into_class();

        Ok(ClassDetail {
            teachers: teachers.remove(&class.id).unwrap_or_default(),
            students,
            makeup_slots: class.makeup_lifetimes(now, makeup_ttl),
            class,
        })
    }

    async fn build_summaries(
        &self,
        models: Vec<ClassModel>,
        now: DateTime<Utc>,
        makeup_ttl: Option<TimeDelta>,
    ) -> Result<Vec<ClassSummary>> {
        let ids: Vec<i64> = models.iter().map(|m| m.id).collect();
        let student_counts = load_student_counts(&self.db, &ids).await?;
        let mut teachers = load_class_teachers(&self.db, &ids).await?;

        Ok(models
            .into_iter()
            .map(|model| {
                let class = model.into_class();
                let class_teachers = teachers.remove(&class.id).unwrap_or_default();
                ClassSummary {
                    student_count: student_counts.get(&class.id).copied().unwrap_or(0),
                    teacher_count: class_teachers.len() as i64,
                    teachers: class_teachers,
                    makeup_slots: makeup_ttl
                        .map(|ttl| class.makeup_lifetimes(now, ttl))
                        .unwrap_or_default(),
                    class,
                }
            })
            .collect())
    }

    /// 分页列出班级
    pub async fn list_classes_with_pagination_impl(
        &self,
        query: ClassListQuery,
        now: DateTime<Utc>,
        makeup_ttl: TimeDelta,
    ) -> Result<ClassListResponse> {
        let (page, size) = normalize_pagination(query.page, query.size);

        let mut select = Classes::find();

        if let Some(is_active) = query.is_active {
            select = select.filter(Column::IsActive.eq(is_active));
        }

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::ClassName.contains(&escaped))
                    .add(Column::ClassCode.contains(&escaped)),
            );
        }

        select = select.order_by_asc(Column::ClassName);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询班级总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询班级页数失败: {e}")))?;

        let models = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询班级列表失败: {e}")))?;

        Ok(ClassListResponse {
            items: self.build_summaries(models, now, Some(makeup_ttl)).await?,
            pagination: PaginationInfo::new(page, size, total, pages),
        })
    }

    /// 全部启用班级（导出不包含补课有效期）
    pub async fn list_all_classes_impl(&self) -> Result<Vec<ClassSummary>> {
        let models = Classes::find()
            .filter(Column::IsActive.eq(true))
            .order_by_asc(Column::ClassName)
            .all(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询班级列表失败: {e}")))?;

        self.build_summaries(models, Utc::now(), None).await
    }

    /// 更新班级信息
    pub async fn update_class_impl(
        &self,
        class_id: i64,
        update: ClassUpdate,
    ) -> Result<Option<Class>> {
        let existing = Classes::find_by_id(class_id)
            .one(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询班级失败: {e}")))?;
        if existing.is_none() {
            return Ok(None);
        }

        let now = chrono::Utc::now().timestamp();

        let mut model = ActiveModel {
            id: Set(class_id),
            updated_at: Set(now),
            ..Default::default()
        };

        if let Some(class_name) = update.class_name {
            model.class_name = Set(class_name);
        }

        if let Some(class_code) = update.class_code {
            model.class_code = Set(class_code);
        }

        if let Some(description) = update.description {
            model.description = Set(Some(description));
        }

        if let Some(max_absences) = update.max_absences {
            model.max_absences = Set(max_absences);
        }

        if let Some(ref schedule) = update.schedule {
            model.weekly_schedule = Set(Some(schedule.to_json()?));
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("更新班级失败: {e}")))?;

        Ok(Some(result.into_class()))
    }

    /// 停用班级（保留历史点名与考试记录）
    pub async fn deactivate_class_impl(&self, class_id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Classes::update_many()
            .col_expr(Column::IsActive, sea_orm::sea_query::Expr::value(false))
            .col_expr(Column::UpdatedAt, sea_orm::sea_query::Expr::value(now))
            .filter(Column::Id.eq(class_id))
            .filter(Column::IsActive.eq(true))
            .exec(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("停用班级失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 班级名单
    pub async fn list_class_roster_impl(&self, class_id: i64) -> Result<Vec<ClassStudent>> {
        let Some(class) = Classes::find_by_id(class_id)
            .one(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询班级失败: {e}")))?
        else {
            return Ok(Vec::new());
        };

        load_class_students(&self.db, class.id, class.max_absences).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::setup_test_storage;
    use crate::models::classes::{
        requests::{ClassListQuery, ClassUpdate, NewClass},
        schedule::{SlotKind, Weekday, WeeklySchedule},
    };
    use chrono::{TimeDelta, Utc};

    fn new_class(code: &str, schedule: WeeklySchedule) -> NewClass {
        NewClass {
            class_name: format!("Class {code}"),
            class_code: code.to_string(),
            description: Some("desc".into()),
            max_absences: 3,
            schedule,
        }
    }

    #[tokio::test]
    async fn test_create_and_reload_schedule() {
        let storage = setup_test_storage().await;
        let mut schedule = WeeklySchedule::new();
        schedule
            .add_slot(
                Weekday::Wednesday,
                "11:45-12:30".parse().unwrap(),
                SlotKind::Normal,
            )
            .unwrap();

        let class = storage
            .create_class_impl(new_class("CHEM", schedule.clone()))
            .await
            .unwrap();
        let loaded = storage
            .get_class_by_code_impl("CHEM")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.id, class.id);
        assert_eq!(loaded.schedule, schedule);
    }

    #[tokio::test]
    async fn test_deactivate_hides_from_default_list() {
        let storage = setup_test_storage().await;
        let a = storage
            .create_class_impl(new_class("A1", WeeklySchedule::new()))
            .await
            .unwrap();
        storage
            .create_class_impl(new_class("B1", WeeklySchedule::new()))
            .await
            .unwrap();

        assert!(storage.deactivate_class_impl(a.id).await.unwrap());
        assert!(!storage.deactivate_class_impl(a.id).await.unwrap());

        let active = storage
            .list_classes_with_pagination_impl(
                ClassListQuery {
                    is_active: Some(true),
                    ..Default::default()
                },
                Utc::now(),
                TimeDelta::days(7),
            )
            .await
            .unwrap();
        assert_eq!(active.pagination.total, 1);
        assert_eq!(active.items[0].class.class_code, "B1");
    }

    #[tokio::test]
    async fn test_update_class_fields() {
        let storage = setup_test_storage().await;
        let class = storage
            .create_class_impl(new_class("HIS", WeeklySchedule::new()))
            .await
            .unwrap();

        let updated = storage
            .update_class_impl(
                class.id,
                ClassUpdate {
                    max_absences: Some(5),
                    class_name: Some("History".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.max_absences, 5);
        assert_eq!(updated.class_name, "History");
        assert!(storage.update_class_impl(9999, ClassUpdate::default()).await.unwrap().is_none());
    }
}
