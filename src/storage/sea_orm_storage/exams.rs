//! 考试存储操作

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{info, warn};

use super::SeaOrmStorage;
use crate::config::OverflowPolicy;
use crate::entity::classes::{Column as ClassColumn, Entity as Classes, Model as ClassModel};
use crate::entity::exam_seating::{
    ActiveModel as SeatActiveModel, Column as SeatColumn, Entity as ExamSeating,
};
use crate::entity::exams::{ActiveModel, Column, Entity as Exams, Model as ExamModel};
use crate::entity::student_classes::{Column as StudentClassColumn, Entity as StudentClasses};
use crate::entity::students::{Column as StudentColumn, Entity as Students};
use crate::entity::teacher_classes::{Column as TeacherClassColumn, Entity as TeacherClasses};
use crate::errors::{AttendifyError, Result};
use crate::models::exams::{
    entities::{CreatedExam, ExamSummary, SeatingRow},
    requests::{NewExam, SeatingOptions},
    responses::ExamDetailResponse,
    seating::allocate_seats_random,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Select,
    Set, TransactionTrait,
};

/// 为考试附加班级信息与已安排座位数
async fn build_summaries<C: ConnectionTrait>(
    db: &C,
    rows: Vec<(ExamModel, Option<ClassModel>)>,
) -> Result<Vec<ExamSummary>> {
    let exam_ids: Vec<i64> = rows.iter().map(|(e, _)| e.id).collect();
    let mut seated: HashMap<i64, i64> = HashMap::new();
    if !exam_ids.is_empty() {
        let seats = ExamSeating::find()
            .filter(SeatColumn::ExamId.is_in(exam_ids))
            .all(db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询考试座位失败: {e}")))?;
        for seat in seats {
            *seated.entry(seat.exam_id).or_insert(0) += 1;
        }
    }

    Ok(rows
        .into_iter()
        .map(|(exam, class)| {
            let (class_name, class_code) = class
                .map(|c| (c.class_name, c.class_code))
                .unwrap_or_default();
            ExamSummary {
                seated_count: seated.get(&exam.id).copied().unwrap_or(0),
                exam: exam.into_exam(),
                class_name,
                class_code,
            }
        })
        .collect())
}

fn ordered(select: Select<Exams>, descending: bool) -> Select<Exams> {
    if descending {
        select
            .order_by_desc(Column::ExamDate)
            .order_by_desc(Column::ExamTime)
    } else {
        select
            .order_by_asc(Column::ExamDate)
            .order_by_asc(Column::ExamTime)
    }
}

impl SeaOrmStorage {
    /// 创建考试并随机分配座位
    ///
    /// 名单读取、考试记录与座位记录在同一事务中完成。
    pub async fn create_exam_with_seating_impl(
        &self,
        req: NewExam,
        options: SeatingOptions,
    ) -> Result<CreatedExam> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("开启事务失败: {e}")))?;

        let class = Classes::find_by_id(req.class_id)
            .filter(ClassColumn::IsActive.eq(true))
            .one(&txn)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询班级失败: {e}")))?
            .ok_or_else(|| AttendifyError::not_found(format!("Class {} not found", req.class_id)))?;

        let roster: Vec<i64> = StudentClasses::find()
            .filter(StudentClassColumn::ClassId.eq(class.id))
            .find_also_related(Students)
            .filter(StudentColumn::IsActive.eq(true))
            .all(&txn)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询班级名单失败: {e}")))?
            .into_iter()
            .filter(|(_, student)| student.is_some())
            .map(|(enrollment, _)| enrollment.student_id)
            .collect();

        if roster.is_empty() && !options.allow_empty {
            return Err(AttendifyError::validation(format!(
                "Class {} has no enrolled students",
                class.class_code
            )));
        }
        if roster.len() > options.capacity && options.overflow == OverflowPolicy::Reject {
            return Err(AttendifyError::capacity_exceeded(format!(
                "Class {} has {} students but the room seats {}",
                class.class_code,
                roster.len(),
                options.capacity
            )));
        }

        let plan = allocate_seats_random(&roster, options.capacity);

        let now = chrono::Utc::now().timestamp();
        let exam = ActiveModel {
            class_id: Set(req.class_id),
            exam_name: Set(req.exam_name),
            classroom: Set(req.classroom),
            exam_date: Set(req.exam_date),
            exam_time: Set(req.exam_time),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| AttendifyError::database_operation(format!("创建考试失败: {e}")))?;

        if !plan.assignments.is_empty() {
            let seats = plan.assignments.iter().map(|a| SeatActiveModel {
                exam_id: Set(exam.id),
                student_id: Set(a.student_id),
                seat_number: Set(a.seat_number),
                ..Default::default()
            });
            ExamSeating::insert_many(seats)
                .exec(&txn)
                .await
                .map_err(|e| AttendifyError::database_operation(format!("保存考试座位失败: {e}")))?;
        }

        txn.commit()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("提交事务失败: {e}")))?;

        if plan.is_overflow() {
            warn!(
                "Exam {} seated {} of {} students, {} left without a seat",
                exam.id,
                plan.seated_count(),
                roster.len(),
                plan.unseated.len()
            );
        }
        info!(
            "Exam {} created for class {} with {} seats",
            exam.id,
            class.id,
            plan.seated_count()
        );

        Ok(CreatedExam {
            exam: exam.into_exam(),
            plan,
        })
    }

    /// 考试详情与座位表
    pub async fn get_exam_detail_impl(&self, exam_id: i64) -> Result<Option<ExamDetailResponse>> {
        let Some(row) = Exams::find_by_id(exam_id)
            .find_also_related(Classes)
            .one(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询考试失败: {e}")))?
        else {
            return Ok(None);
        };

        let seating = ExamSeating::find()
            .filter(SeatColumn::ExamId.eq(exam_id))
            .find_also_related(Students)
            .order_by_asc(SeatColumn::SeatNumber)
            .all(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询考试座位失败: {e}")))?
            .into_iter()
            .filter_map(|(seat, student)| {
                student.map(|s| SeatingRow {
                    seat_number: seat.seat_number,
                    student_id: s.id,
                    student_number: s.student_number,
                    first_name: s.first_name,
                    last_name: s.last_name,
                })
            })
            .collect();

        let exam = build_summaries(&self.db, vec![row])
            .await?
            .pop()
            .ok_or_else(|| AttendifyError::database_operation("读取考试信息失败"))?;

        Ok(Some(ExamDetailResponse { exam, seating }))
    }

    /// 即将进行（今天及以后）或历史考试
    pub async fn list_exams_impl(&self, past: bool, today: NaiveDate) -> Result<Vec<ExamSummary>> {
        let today = today.format("%Y-%m-%d").to_string();
        let select = if past {
            Exams::find().filter(Column::ExamDate.lt(today))
        } else {
            Exams::find().filter(Column::ExamDate.gte(today))
        };

        let rows = ordered(select, past)
            .find_also_related(Classes)
            .all(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询考试列表失败: {e}")))?;

        build_summaries(&self.db, rows).await
    }

    /// 教师所负责班级的考试
    pub async fn list_teacher_exams_impl(&self, teacher_id: i64) -> Result<Vec<ExamSummary>> {
        let class_ids: Vec<i64> = TeacherClasses::find()
            .filter(TeacherClassColumn::TeacherId.eq(teacher_id))
            .all(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询授课班级失败: {e}")))?
            .into_iter()
            .map(|m| m.class_id)
            .collect();
        if class_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = ordered(Exams::find().filter(Column::ClassId.is_in(class_ids)), false)
            .find_also_related(Classes)
            .all(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询考试列表失败: {e}")))?;

        build_summaries(&self.db, rows).await
    }

    /// 删除考试及其座位
    pub async fn delete_exam_impl(&self, exam_id: i64) -> Result<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("开启事务失败: {e}")))?;

        ExamSeating::delete_many()
            .filter(SeatColumn::ExamId.eq(exam_id))
            .exec(&txn)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("删除考试座位失败: {e}")))?;

        let result = Exams::delete_by_id(exam_id)
            .exec(&txn)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("删除考试失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::super::students::tests::{seed_class, seed_class_with_students};
    use super::super::test_support::setup_test_storage;
    use crate::config::OverflowPolicy;
    use crate::errors::AttendifyError;
    use crate::models::exams::requests::{NewExam, SeatingOptions};
    use chrono::NaiveDate;

    fn exam(class_id: i64, date: &str) -> NewExam {
        NewExam {
            class_id,
            exam_name: "Midterm".into(),
            classroom: "Derslik-1".into(),
            exam_date: date.into(),
            exam_time: "10:00".into(),
        }
    }

    fn options(overflow: OverflowPolicy, allow_empty: bool) -> SeatingOptions {
        SeatingOptions {
            capacity: 60,
            overflow,
            allow_empty,
        }
    }

    #[tokio::test]
    async fn test_three_students_get_seats() {
        let storage = setup_test_storage().await;
        let (class_id, students) = seed_class_with_students(&storage, "TRI", 3).await;

        let created = storage
            .create_exam_with_seating_impl(
                exam(class_id, "2030-01-15"),
                options(OverflowPolicy::Drop, false),
            )
            .await
            .unwrap();
        assert_eq!(created.plan.seated_count(), 3);

        let detail = storage
            .get_exam_detail_impl(created.exam.id)
            .await
            .unwrap()
            .unwrap();
        let seats: Vec<i32> = detail.seating.iter().map(|r| r.seat_number).collect();
        assert_eq!(seats, vec![1, 2, 3]);
        let seated: HashSet<i64> = detail.seating.iter().map(|r| r.student_id).collect();
        assert_eq!(seated, students.into_iter().collect());
        assert_eq!(detail.exam.seated_count, 3);
    }

    #[tokio::test]
    async fn test_overflow_drops_extra_students() {
        let storage = setup_test_storage().await;
        let (class_id, _) = seed_class_with_students(&storage, "BIG", 65).await;

        let created = storage
            .create_exam_with_seating_impl(
                exam(class_id, "2030-01-15"),
                options(OverflowPolicy::Drop, false),
            )
            .await
            .unwrap();
        assert_eq!(created.plan.seated_count(), 60);
        assert_eq!(created.plan.unseated.len(), 5);

        let detail = storage
            .get_exam_detail_impl(created.exam.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detail.seating.len(), 60);
        assert!(detail.seating.iter().all(|r| (1..=60).contains(&r.seat_number)));
    }

    #[tokio::test]
    async fn test_overflow_reject_and_empty_class() {
        let storage = setup_test_storage().await;
        let (class_id, _) = seed_class_with_students(&storage, "REJ", 61).await;
        let rejected = storage
            .create_exam_with_seating_impl(
                exam(class_id, "2030-01-15"),
                options(OverflowPolicy::Reject, false),
            )
            .await;
        assert!(matches!(rejected, Err(AttendifyError::CapacityExceeded(_))));

        let empty = seed_class(&storage, "EMPTY").await;
        let result = storage
            .create_exam_with_seating_impl(
                exam(empty, "2030-01-15"),
                options(OverflowPolicy::Drop, false),
            )
            .await;
        assert!(matches!(result, Err(AttendifyError::Validation(_))));

        let allowed = storage
            .create_exam_with_seating_impl(
                exam(empty, "2030-01-15"),
                options(OverflowPolicy::Drop, true),
            )
            .await
            .unwrap();
        assert!(allowed.plan.is_empty());

        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(storage.list_exams_impl(false, today).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_and_delete_exam() {
        let storage = setup_test_storage().await;
        let (class_id, _) = seed_class_with_students(&storage, "LST", 2).await;
        let upcoming = storage
            .create_exam_with_seating_impl(
                exam(class_id, "2025-06-01"),
                options(OverflowPolicy::Drop, false),
            )
            .await
            .unwrap();
        storage
            .create_exam_with_seating_impl(
                exam(class_id, "2025-01-01"),
                options(OverflowPolicy::Drop, false),
            )
            .await
            .unwrap();

        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let future = storage.list_exams_impl(false, today).await.unwrap();
        assert_eq!(future.len(), 1);
        assert_eq!(future[0].exam.id, upcoming.exam.id);
        assert_eq!(future[0].class_code, "LST");
        assert_eq!(storage.list_exams_impl(true, today).await.unwrap().len(), 1);

        assert!(storage.delete_exam_impl(upcoming.exam.id).await.unwrap());
        assert!(
            storage
                .get_exam_detail_impl(upcoming.exam.id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(!storage.delete_exam_impl(upcoming.exam.id).await.unwrap());
    }
}
