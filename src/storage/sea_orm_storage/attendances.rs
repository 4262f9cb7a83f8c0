//! 点名存储操作

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use sea_orm::ExprTrait;
use tracing::info;

use super::SeaOrmStorage;
use crate::entity::attendance_details::{
    ActiveModel as DetailActiveModel, Column as DetailColumn, Entity as AttendanceDetails,
};
use crate::entity::attendances::{ActiveModel, Column, Entity as Attendances, Model};
use crate::entity::classes::{Column as ClassColumn, Entity as Classes, Model as ClassModel};
use crate::entity::student_classes::{Column as StudentClassColumn, Entity as StudentClasses};
use crate::entity::students::{Column as StudentColumn, Entity as Students};
use crate::entity::users::{Column as UserColumn, Entity as Users};
use crate::errors::{AttendifyError, Result};
use crate::models::attendances::{
    entities::{Attendance, AttendanceDetailRow, AttendanceStatus, AttendanceSummary},
    requests::NewAttendance,
    responses::{AttendanceDetailResponse, AttendanceStatsResponse},
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// 为点名记录附加班级与教师名称
async fn build_summaries<C: ConnectionTrait>(
    db: &C,
    rows: Vec<(Model, Option<ClassModel>)>,
) -> Result<Vec<AttendanceSummary>> {
    let teacher_ids: HashSet<i64> = rows.iter().map(|(a, _)| a.teacher_id).collect();
    let teachers: HashMap<i64, String> = if teacher_ids.is_empty() {
        HashMap::new()
    } else {
        Users::find()
            .filter(UserColumn::Id.is_in(teacher_ids))
            .all(db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询教师失败: {e}")))?
            .into_iter()
            .map(|u| (u.id, u.full_name))
            .collect()
    };

    Ok(rows
        .into_iter()
        .map(|(attendance, class)| {
            let (class_name, class_code) = class
                .map(|c| (c.class_name, c.class_code))
                .unwrap_or_default();
            AttendanceSummary {
                teacher_name: teachers
                    .get(&attendance.teacher_id)
                    .cloned()
                    .unwrap_or_default(),
                attendance: attendance.into_attendance(),
                class_name,
                class_code,
            }
        })
        .collect())
}

impl SeaOrmStorage {
    /// 保存点名结果，并为缺勤学生累计缺勤次数
    pub async fn submit_attendance_impl(&self, req: NewAttendance) -> Result<Attendance> {
        let mut seen = HashSet::with_capacity(req.records.len());
        if let Some(dup) = req.records.iter().find(|r| !seen.insert(r.student_id)) {
            return Err(AttendifyError::validation(format!(
                "Student {} appears more than once",
                dup.student_id
            )));
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("开启事务失败: {e}")))?;

        Classes::find_by_id(req.class_id)
            .filter(ClassColumn::IsActive.eq(true))
            .one(&txn)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询班级失败: {e}")))?
            .ok_or_else(|| AttendifyError::not_found(format!("Class {} not found", req.class_id)))?;

        let enrolled: HashSet<i64> = StudentClasses::find()
            .filter(StudentClassColumn::ClassId.eq(req.class_id))
            .all(&txn)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询班级名单失败: {e}")))?
            .into_iter()
            .map(|m| m.student_id)
            .collect();
        if let Some(stranger) = req.records.iter().find(|r| !enrolled.contains(&r.student_id)) {
            return Err(AttendifyError::validation(format!(
                "Student {} is not enrolled in class {}",
                stranger.student_id, req.class_id
            )));
        }

        let present = req.present_count();
        let absent = req.absent_count();
        let attendance = ActiveModel {
            class_id: Set(req.class_id),
            teacher_id: Set(req.teacher_id),
            attendance_date: Set(req.attendance_date.clone()),
            attendance_time: Set(req.attendance_time.clone()),
            duration_minutes: Set(req.duration_minutes),
            total_students: Set(req.records.len() as i32),
            present_count: Set(present),
            absent_count: Set(absent),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| AttendifyError::database_operation(format!("保存点名记录失败: {e}")))?;

        if !req.records.is_empty() {
            let details = req.records.iter().map(|r| DetailActiveModel {
                attendance_id: Set(attendance.id),
                student_id: Set(r.student_id),
                status: Set(r.status.to_string()),
                ..Default::default()
            });
            AttendanceDetails::insert_many(details)
                .exec(&txn)
                .await
                .map_err(|e| AttendifyError::database_operation(format!("保存点名明细失败: {e}")))?;
        }

        let absent_ids: Vec<i64> = req
            .records
            .iter()
            .filter(|r| r.status == AttendanceStatus::Absent)
            .map(|r| r.student_id)
            .collect();
        if !absent_ids.is_empty() {
            StudentClasses::update_many()
                .col_expr(
                    StudentClassColumn::AbsencesCount,
                    Expr::col(StudentClassColumn::AbsencesCount).add(1),
                )
                .filter(StudentClassColumn::ClassId.eq(req.class_id))
                .filter(StudentClassColumn::StudentId.is_in(absent_ids))
                .exec(&txn)
                .await
                .map_err(|e| AttendifyError::database_operation(format!("更新缺勤次数失败: {e}")))?;
        }

        txn.commit()
            .await
            .map_err(|e| AttendifyError::database_operation(format!("提交事务失败: {e}")))?;

        info!(
            "Attendance {} saved for class {}: {} present, {} absent",
            attendance.id, req.class_id, present, absent
        );
        Ok(attendance.into_attendance())
    }

    /// 点名详情
    pub async fn get_attendance_detail_impl(
        &self,
        attendance_id: i64,
    ) -> Result<Option<AttendanceDetailResponse>> {
        let Some(row) = Attendances::find_by_id(attendance_id)
            .find_also_related(Classes)
            .one(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询点名记录失败: {e}")))?
        else {
            return Ok(None);
        };

        let details = AttendanceDetails::find()
            .filter(DetailColumn::AttendanceId.eq(attendance_id))
            .find_also_related(Students)
            .order_by_asc(StudentColumn::FirstName)
            .order_by_asc(StudentColumn::LastName)
            .all(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询点名明细失败: {e}")))?
            .into_iter()
            .filter_map(|(detail, student)| {
                let student = student?;
                let status = detail.status.parse::<AttendanceStatus>().ok()?;
                Some(AttendanceDetailRow {
                    student_id: student.id,
                    student_number: student.student_number,
                    first_name: student.first_name,
                    last_name: student.last_name,
                    status,
                })
            })
            .collect();

        let attendance = build_summaries(&self.db, vec![row])
            .await?
            .pop()
            .ok_or_else(|| AttendifyError::database_operation("读取点名记录失败"))?;

        Ok(Some(AttendanceDetailResponse {
            attendance,
            details,
        }))
    }

    /// 点名记录列表，按日期时间倒序
    pub async fn list_attendances_impl(
        &self,
        teacher_id: Option<i64>,
        class_id: Option<i64>,
        since: NaiveDate,
    ) -> Result<Vec<AttendanceSummary>> {
        let mut select = Attendances::find().filter(Column::AttendanceDate.gte(date_key(since)));
        if let Some(teacher_id) = teacher_id {
            select = select.filter(Column::TeacherId.eq(teacher_id));
        }
        if let Some(class_id) = class_id {
            select = select.filter(Column::ClassId.eq(class_id));
        }

        let rows = select
            .order_by_desc(Column::AttendanceDate)
            .order_by_desc(Column::AttendanceTime)
            .find_also_related(Classes)
            .all(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("查询点名列表失败: {e}")))?;

        build_summaries(&self.db, rows).await
    }

    /// 区间（含首尾）内的点名统计
    pub async fn get_attendance_stats_impl(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<AttendanceStatsResponse> {
        let rows = Attendances::find()
            .filter(Column::AttendanceDate.gte(date_key(start)))
            .filter(Column::AttendanceDate.lte(date_key(end)))
            .all(&self.db)
            .await
            .map_err(|e| AttendifyError::database_operation(format!("统计点名记录失败: {e}")))?;

        let mut stats = AttendanceStatsResponse {
            start_date: date_key(start),
            end_date: date_key(end),
            ..Default::default()
        };
        if rows.is_empty() {
            return Ok(stats);
        }

        let classes: HashSet<i64> = rows.iter().map(|r| r.class_id).collect();
        let teachers: HashSet<i64> = rows.iter().map(|r| r.teacher_id).collect();
        let total_duration: i64 = rows.iter().map(|r| i64::from(r.duration_minutes)).sum();

        stats.total_attendances = rows.len() as i64;
        stats.total_present = rows.iter().map(|r| i64::from(r.present_count)).sum();
        stats.total_absent = rows.iter().map(|r| i64::from(r.absent_count)).sum();
        stats.avg_duration = total_duration as f64 / rows.len() as f64;
        stats.classes_count = classes.len() as i64;
        stats.teachers_count = teachers.len() as i64;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::super::students::tests::seed_class_with_students;
    use super::super::test_support::setup_test_storage;
    use crate::errors::AttendifyError;
    use crate::models::attendances::{
        entities::AttendanceStatus,
        requests::{NewAttendance, StudentAttendance},
    };
    use crate::models::users::{entities::UserRole, requests::CreateUserRequest};
    use chrono::NaiveDate;

    fn record(student_id: i64, status: AttendanceStatus) -> StudentAttendance {
        StudentAttendance { student_id, status }
    }

    fn attendance(
        class_id: i64,
        teacher_id: i64,
        date: &str,
        records: Vec<StudentAttendance>,
    ) -> NewAttendance {
        NewAttendance {
            class_id,
            teacher_id,
            attendance_date: date.into(),
            attendance_time: "09:00:00".into(),
            duration_minutes: 40,
            records,
        }
    }

    async fn seed_teacher(storage: &super::SeaOrmStorage, class_ids: Vec<i64>) -> i64 {
        storage
            .create_user_impl(CreateUserRequest {
                username: "ogretmen".into(),
                password: "hash".into(),
                full_name: "Ayse Ogretmen".into(),
                email: "ayse@school.test".into(),
                phone: None,
                birth_date: None,
                role: UserRole::Teacher,
                class_ids,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_submit_increments_absences() {
        let storage = setup_test_storage().await;
        let (class_id, students) = seed_class_with_students(&storage, "ATT", 3).await;
        let teacher_id = seed_teacher(&storage, vec![class_id]).await;

        let saved = storage
            .submit_attendance_impl(attendance(
                class_id,
                teacher_id,
                "2025-03-10",
                vec![
                    record(students[0], AttendanceStatus::Present),
                    record(students[1], AttendanceStatus::Absent),
                    record(students[2], AttendanceStatus::Absent),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(saved.present_count, 1);
        assert_eq!(saved.absent_count, 2);
        assert_eq!(saved.total_students, 3);

        let roster = storage.list_class_roster_impl(class_id).await.unwrap();
        let absences: Vec<(i64, i32)> = roster
            .iter()
            .map(|s| (s.student_id, s.absences_count))
            .collect();
        assert!(absences.contains(&(students[0], 0)));
        assert!(absences.contains(&(students[1], 1)));
        assert!(absences.contains(&(students[2], 1)));

        let detail = storage
            .get_attendance_detail_impl(saved.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detail.details.len(), 3);
        assert_eq!(detail.attendance.teacher_name, "Ayse Ogretmen");
        assert_eq!(detail.attendance.class_code, "ATT");
    }

    #[tokio::test]
    async fn test_submit_rejects_unknown_student() {
        let storage = setup_test_storage().await;
        let (class_id, students) = seed_class_with_students(&storage, "UNK", 1).await;
        let teacher_id = seed_teacher(&storage, vec![class_id]).await;

        let result = storage
            .submit_attendance_impl(attendance(
                class_id,
                teacher_id,
                "2025-03-10",
                vec![
                    record(students[0], AttendanceStatus::Absent),
                    record(9999, AttendanceStatus::Present),
                ],
            ))
            .await;
        assert!(matches!(result, Err(AttendifyError::Validation(_))));

        // 失败的提交不应累计缺勤
        let roster = storage.list_class_roster_impl(class_id).await.unwrap();
        assert_eq!(roster[0].absences_count, 0);
    }

    #[tokio::test]
    async fn test_list_and_stats() {
        let storage = setup_test_storage().await;
        let (class_id, students) = seed_class_with_students(&storage, "STA", 2).await;
        let teacher_id = seed_teacher(&storage, vec![class_id]).await;

        for (date, status) in [
            ("2025-03-01", AttendanceStatus::Present),
            ("2025-03-05", AttendanceStatus::Absent),
            ("2025-02-01", AttendanceStatus::Present),
        ] {
            storage
                .submit_attendance_impl(attendance(
                    class_id,
                    teacher_id,
                    date,
                    vec![
                        record(students[0], status),
                        record(students[1], AttendanceStatus::Present),
                    ],
                ))
                .await
                .unwrap();
        }

        let since = NaiveDate::from_ymd_opt(2025, 2, 15).unwrap();
        let list = storage
            .list_attendances_impl(Some(teacher_id), None, since)
            .await
            .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].attendance.attendance_date, "2025-03-05");
        assert!(
            storage
                .list_attendances_impl(Some(teacher_id + 1), None, since)
                .await
                .unwrap()
                .is_empty()
        );

        let stats = storage
            .get_attendance_stats_impl(since, NaiveDate::from_ymd_opt(2025, 3, 31).unwrap())
            .await
            .unwrap();
        assert_eq!(stats.total_attendances, 2);
        assert_eq!(stats.total_present, 3);
        assert_eq!(stats.total_absent, 1);
        assert_eq!(stats.classes_count, 1);
        assert_eq!(stats.teachers_count, 1);
        assert!((stats.avg_duration - 40.0).abs() < f64::EPSILON);
    }
}
